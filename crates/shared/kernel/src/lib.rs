//! # Kernel
//!
//! The dependency-resolution core of the loader: unit registry, readiness
//! evaluation, lazy activation, the fixed-point scheduler, the unit loader
//! and the reload machinery — everything between the registration facade
//! and the page/event collaborators.
//!
//! State is instance-scoped: each [`Engine`] owns its registry, memo cache
//! and event bus, so independent application instances never share anything.
//!
//! ## Example
//!
//! ```rust
//! use bootlace_domain::Value;
//! use bootlace_kernel::{Engine, FeatureDef, sync_action};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), bootlace_kernel::RegistryError> {
//!     let engine = Engine::new();
//!     engine.set_environment("answer", Some(Value::from(42)))?;
//!     engine.register_feature(
//!         FeatureDef::new(
//!             "greet",
//!             sync_action(|invocation| {
//!                 assert_eq!(invocation.arg(0), &Value::from(42));
//!                 Ok(Value::Bool(true))
//!             }),
//!         )
//!         .depends(["answer"]),
//!     )?;
//!     engine.load(None).await;
//!     assert!(engine.is_loaded("greet"));
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod def;
pub mod engine;
pub mod error;
pub mod events;
pub mod readiness;
pub mod registry;
pub mod resolver;

mod loader;
mod memo;
mod reload;
mod scheduler;

pub use action::{
    Action, ActionError, ActionOutput, ActionResult, ArgSerializer, Invocation, Materialized,
    async_action, sync_action,
};
pub use def::{DataDef, FeatureDef};
pub use engine::{Engine, EngineConfig, EqualityFn, LoadContext};
pub use error::{LoadError, RegistryError};
pub use memo::default_serialize_args;
