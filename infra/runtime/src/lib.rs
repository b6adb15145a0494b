//! # Runtime
//!
//! A specialized orchestration layer for the [Tokio](https://tokio.rs) async runtime.
//!
//! This crate provides standardized runtime configurations (profiles) used
//! across the workspace to ensure predictable behavior:
//!
//! * **Interactive**: a current-thread runtime matching the loader's
//!   single-threaded cooperative scheduling model — unit actions never run
//!   in parallel, suspension happens only at await points.
//! * **Service**: a small multi-thread runtime for host applications that
//!   run the loader next to other work.
//!
//! ## Example
//!
//! ```rust
//! let runtime = bootlace_runtime::build_interactive_runtime().unwrap();
//! runtime.block_on(async {
//!     // drive the loader here
//! });
//! ```

pub use anyhow::Result;

use anyhow::anyhow;
use std::{sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// The default number of worker threads if detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
/// The default stack size for threads (3 `MiB`).
const DEFAULT_STACK_SIZE: usize = 3 * 1024 * 1024;
/// Minimum allowed stack size (1 `MiB`).
const MIN_STACK_SIZE: usize = 1024 * 1024;
/// Maximum allowed stack size (16 `MiB`).
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
/// How long an idle thread stays alive.
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(60);

static WORKER_THREADS: OnceLock<usize> = OnceLock::new();

/// Detects the optimal number of worker threads based on environment variables or hardware.
fn get_worker_threads() -> usize {
    *WORKER_THREADS.get_or_init(|| {
        std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0 && n <= 1024)
            .unwrap_or_else(|| {
                available_parallelism()
                    .map(std::num::NonZero::get)
                    .unwrap_or(DEFAULT_WORKER_THREADS)
            })
    })
}

fn validate_stack_size(stack_size: usize) -> usize {
    stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE)
}

/// The scheduling flavor of the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFlavor {
    /// Everything runs on the caller's thread; tasks interleave only at
    /// await points.
    CurrentThread,
    /// Work-stealing scheduler across `worker_threads` threads.
    MultiThread { worker_threads: usize },
}

/// Configuration for the Tokio runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub flavor: RuntimeFlavor,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

impl RuntimeConfig {
    /// Preset matching the loader's cooperative single-threaded model.
    #[must_use = "Use this configuration for UI-orchestration applications"]
    pub fn interactive() -> Self {
        Self {
            flavor: RuntimeFlavor::CurrentThread,
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "bootlace-interactive".to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }

    /// Preset for host applications running the loader next to other work.
    #[must_use = "Use this configuration for service applications"]
    pub fn service() -> Self {
        Self {
            flavor: RuntimeFlavor::MultiThread { worker_threads: get_worker_threads() },
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "bootlace-service".to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }

    #[must_use = "Customize the number of worker threads for the runtime"]
    pub const fn with_worker_threads(mut self, threads: usize) -> Self {
        self.flavor = RuntimeFlavor::MultiThread { worker_threads: threads };
        self
    }

    #[must_use = "Customize the stack size for worker threads"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = validate_stack_size(size);
        self
    }

    #[must_use = "Customize the thread name"]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.thread_name =
            if name.trim().is_empty() { "bootlace-worker".to_owned() } else { name };
        self
    }

    #[must_use = "Customize how long idle threads stay alive"]
    pub const fn with_thread_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.thread_keep_alive = keep_alive;
        self
    }
}

fn normalize_config(config: &RuntimeConfig) -> RuntimeConfig {
    let flavor = match config.flavor {
        RuntimeFlavor::CurrentThread => RuntimeFlavor::CurrentThread,
        RuntimeFlavor::MultiThread { worker_threads } => {
            RuntimeFlavor::MultiThread { worker_threads: worker_threads.clamp(1, 1024) }
        },
    };
    let thread_name = if config.thread_name.trim().is_empty() {
        "bootlace-worker".to_owned()
    } else {
        config.thread_name.clone()
    };

    RuntimeConfig {
        flavor,
        stack_size: validate_stack_size(config.stack_size),
        thread_name,
        thread_keep_alive: config.thread_keep_alive,
    }
}

/// Creates a new Tokio runtime from a [`RuntimeConfig`].
///
/// All Tokio features (I/O, timers) are enabled; configuration values are
/// clamped to safe bounds before use.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the Tokio runtime cannot be created,
/// typically due to insufficient system resources or OS-level limitations.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = normalize_config(config);
    debug!(config = ?config, "Building tokio runtime");

    let mut builder = match config.flavor {
        RuntimeFlavor::CurrentThread => Builder::new_current_thread(),
        RuntimeFlavor::MultiThread { worker_threads } => {
            let mut b = Builder::new_multi_thread();
            b.worker_threads(worker_threads)
                .thread_name(&config.thread_name)
                .thread_stack_size(config.stack_size)
                .thread_keep_alive(config.thread_keep_alive);
            b
        },
    };

    builder.enable_all();

    builder.build().map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}

/// Convenience function to build the loader's cooperative runtime.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the Tokio runtime cannot be created.
pub fn build_interactive_runtime() -> Result<Runtime> {
    build_runtime_with_config(&RuntimeConfig::interactive())
}

/// Convenience function to build a runtime for service applications.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the Tokio runtime cannot be created.
pub fn build_service_runtime() -> Result<Runtime> {
    build_runtime_with_config(&RuntimeConfig::service())
}
