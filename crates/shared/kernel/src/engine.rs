//! The engine: one application instance's registry, memo cache, event bus
//! and drive serialization, behind a cheaply clonable handle.
//!
//! All registration operations are synchronous; when the application has
//! already been loaded they schedule a background drive on the ambient
//! tokio runtime. Drives are serialized behind an async mutex, so a reload
//! triggered while another drive is in flight queues instead of interleaving
//! registry mutation.

use crate::action::Materialized;
use crate::def::{DataDef, FeatureDef};
use crate::error::RegistryError;
use crate::events::AppInit;
use crate::memo::CallMemoCache;
use crate::registry::{Unit, UnitRegistry};
use crate::reload::prepare_reload;
use crate::scheduler::{Drive, DriveReason};
use bootlace_domain::{DependencyRef, UnitKind, UnitSnapshot, UnitState, Value};
use bootlace_event_bus::{Event, EventBus};
use bootlace_page::{ElementId, Page};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

const DEFAULT_MEMO_CAPACITY: u64 = 10_000;

/// Pluggable change detection for environment values.
pub type EqualityFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Engine tuning knobs.
#[derive(Clone)]
pub struct EngineConfig {
    memo_capacity: u64,
    equality: EqualityFn,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memo_capacity: DEFAULT_MEMO_CAPACITY,
            equality: Arc::new(|old, new| old == new),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("memo_capacity", &self.memo_capacity)
            .finish_non_exhaustive()
    }
}

impl EngineConfig {
    /// Bounds the call-memoization cache. Eviction can only cause a
    /// redundant re-invocation.
    #[must_use]
    pub const fn with_memo_capacity(mut self, capacity: u64) -> Self {
        self.memo_capacity = capacity;
        self
    }

    /// Overrides the exact-equality change detection for environment values.
    #[must_use]
    pub fn with_equality<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.equality = Arc::new(f);
        self
    }
}

/// The active page context a load runs against.
#[derive(Debug, Clone)]
pub struct LoadContext {
    pub(crate) page: Page,
    pub(crate) root: ElementId,
}

impl LoadContext {
    /// Scopes element selection to a specific subtree of the page.
    #[must_use]
    pub const fn at(page: Page, root: ElementId) -> Self {
        Self { page, root }
    }
}

impl From<Page> for LoadContext {
    fn from(page: Page) -> Self {
        let root = page.root();
        Self { page, root }
    }
}

/// Which units a scheduled drive covers.
#[derive(Debug, Clone)]
enum DriveSet {
    /// Snapshot the full registry at drive start.
    All,
    Units(Vec<Arc<str>>),
}

struct BackgroundDrives {
    count: AtomicUsize,
    notify: Notify,
}

pub(crate) struct EngineInner {
    pub(crate) registry: RwLock<UnitRegistry>,
    pub(crate) memo: CallMemoCache,
    pub(crate) bus: EventBus,
    pub(crate) context: RwLock<Option<LoadContext>>,
    equality: EqualityFn,
    loaded_once: AtomicBool,
    drive_gate: Mutex<()>,
    background: BackgroundDrives,
}

impl EngineInner {
    /// Publishes a loader event; a bus invariant violation is logged, never
    /// propagated into the drive.
    pub(crate) fn emit<T: Event>(&self, event: T) {
        if let Err(error) = self.bus.publish(event) {
            warn!(%error, "Failed to publish loader event");
        }
    }
}

/// Cheaply clonable handle over one application instance's loader state.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("units", &self.inner.registry.read().len())
            .field("loaded_once", &self.inner.loaded_once.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                registry: RwLock::new(UnitRegistry::new()),
                memo: CallMemoCache::new(config.memo_capacity),
                bus: EventBus::new(),
                context: RwLock::new(None),
                equality: config.equality,
                loaded_once: AtomicBool::new(false),
                drive_gate: Mutex::new(()),
                background: BackgroundDrives { count: AtomicUsize::new(0), notify: Notify::new() },
            }),
        }
    }

    /// The loader's event bus; subscribe here for unit notifications.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Registers a feature unit.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] on a name collision with any
    /// registered unit, without mutating state.
    pub fn register_feature(&self, def: FeatureDef) -> Result<(), RegistryError> {
        self.inner.registry.write().insert(Unit::from_feature(def))?;
        self.schedule_if_loaded();
        Ok(())
    }

    /// Registers a data provider unit.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] on a name collision with any
    /// registered unit, without mutating state.
    pub fn register_data(&self, def: DataDef) -> Result<(), RegistryError> {
        self.inner.registry.write().insert(Unit::from_data(def))?;
        self.schedule_if_loaded();
        Ok(())
    }

    /// Registers or updates an environment value; an absent or `Null` value
    /// is a no-op.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] if the name collides with a
    /// non-environment unit.
    pub fn set_environment(
        &self,
        name: impl Into<Arc<str>>,
        value: Option<Value>,
    ) -> Result<(), RegistryError> {
        match value {
            Some(Value::Null) | None => Ok(()),
            Some(value) => self.set_environment_nullable(name, value),
        }
    }

    /// Registers or updates an environment value, accepting `Null`.
    ///
    /// Overwriting the value of an already loaded application triggers a
    /// reload of the transitive dependents when the value actually changed
    /// under the configured equality.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] if the name collides with a
    /// non-environment unit.
    pub fn set_environment_nullable(
        &self,
        name: impl Into<Arc<str>>,
        value: Value,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let loaded_once = self.inner.loaded_once.load(Ordering::SeqCst);

        enum Outcome {
            Inserted,
            Unchanged,
            Reload(Vec<Arc<str>>),
        }

        let outcome = {
            let mut registry = self.inner.registry.write();
            match registry.get_mut(&name) {
                Some(unit) if matches!(unit.kind, UnitKind::Environment) => {
                    let previous = unit
                        .result
                        .as_ref()
                        .and_then(Materialized::ready)
                        .cloned()
                        .unwrap_or(Value::Null);
                    let changed = !(self.inner.equality)(&previous, &value);
                    unit.result = Some(Materialized::Ready(value));
                    if changed && loaded_once {
                        Outcome::Reload(prepare_reload(&mut registry, &name))
                    } else {
                        Outcome::Unchanged
                    }
                },
                Some(_) => {
                    return Err(RegistryError::DuplicateName {
                        name,
                        context: Some("environment value collides with a registered unit".into()),
                    });
                },
                None => {
                    registry.insert(Unit::environment(name.clone(), value))?;
                    Outcome::Inserted
                },
            }
        };

        match outcome {
            Outcome::Inserted => self.schedule_if_loaded(),
            Outcome::Unchanged => {},
            Outcome::Reload(set) => {
                if set.is_empty() {
                    debug!(environment = %name, "Environment changed with no dependents");
                } else {
                    info!(environment = %name, dependents = set.len(), "Environment changed; reloading dependents");
                    self.schedule(DriveReason::Reload, DriveSet::Units(set));
                }
            },
        }
        Ok(())
    }

    /// Seeds environment values from page attributes carrying `prefix`,
    /// starting at `root` and walking its descendants.
    ///
    /// # Errors
    /// Returns the first [`RegistryError::DuplicateName`] collision with a
    /// non-environment unit.
    pub fn scan_environment_attributes(
        &self,
        page: &Page,
        root: ElementId,
        prefix: &str,
        transform: Option<&dyn Fn(&str) -> Value>,
    ) -> Result<(), RegistryError> {
        for (suffix, raw) in page.attributes_with_prefix(root, prefix) {
            let value = transform.map_or_else(|| Value::String(raw.clone()), |f| f(&raw));
            self.set_environment_nullable(suffix, value)?;
        }
        Ok(())
    }

    /// Runs a full load drive over every registered unit.
    ///
    /// A repeated load resets all loaded flags first (full re-evaluation)
    /// and replaces the active page context. The first completed load emits
    /// [`AppInit`].
    pub async fn load(&self, context: Option<LoadContext>) {
        let first = !self.inner.loaded_once.swap(true, Ordering::SeqCst);
        if !first {
            self.reset_all();
        }
        *self.inner.context.write() = context;

        self.drive(DriveReason::Load, DriveSet::All).await;

        if first {
            self.inner.emit(AppInit);
        }
    }

    /// Re-drives every registered unit without resetting loaded state; only
    /// previously pending units can newly succeed. No-op before the first
    /// load.
    pub async fn retry_pending(&self) {
        if !self.inner.loaded_once.load(Ordering::SeqCst) {
            debug!("Retry requested before first load; ignoring");
            return;
        }
        self.drive(DriveReason::Retry, DriveSet::All).await;
    }

    /// Waits until every background drive scheduled by registration or
    /// environment changes has completed.
    pub async fn settle(&self) {
        loop {
            let notified = self.inner.background.notify.notified();
            if self.inner.background.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Closes the event bus; subscribers observe channel closure. Returns
    /// the number of channels closed.
    pub fn shutdown(&self) -> usize {
        self.inner.bus.shutdown()
    }

    /// Diagnostic resolution of a unit's declared dependencies.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Vec<DependencyRef> {
        self.inner.registry.read().dependencies_of(name)
    }

    /// Read-only snapshot of a registered unit.
    #[must_use]
    pub fn snapshot(&self, name: &str) -> Option<UnitSnapshot> {
        self.inner.registry.read().get(name).map(Unit::snapshot)
    }

    /// All registered unit names, in registration order.
    #[must_use]
    pub fn unit_names(&self) -> Vec<Arc<str>> {
        self.inner.registry.read().names()
    }

    /// Whether a unit is loaded in the current cycle.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.inner.registry.read().get(name).is_some_and(Unit::is_loaded)
    }

    /// The materialized result of a unit, when ready.
    #[must_use]
    pub fn result_of(&self, name: &str) -> Option<Value> {
        self.inner
            .registry
            .read()
            .get(name)
            .and_then(|unit| unit.result.as_ref())
            .and_then(Materialized::ready)
            .cloned()
    }

    async fn drive(&self, reason: DriveReason, set: DriveSet) {
        let _gate = self.inner.drive_gate.lock().await;
        let requested = self.resolve_set(set);
        Drive::prepare(&self.inner, reason, requested).run(&self.inner).await;
    }

    fn resolve_set(&self, set: DriveSet) -> Vec<Arc<str>> {
        match set {
            DriveSet::All => self.inner.registry.read().names(),
            DriveSet::Units(units) => units,
        }
    }

    fn schedule_if_loaded(&self) {
        if self.inner.loaded_once.load(Ordering::SeqCst) {
            self.schedule(DriveReason::Registration, DriveSet::All);
        }
    }

    /// Queues a background drive behind any in-flight one. Requires an
    /// ambient tokio runtime; without one the request is dropped with a
    /// warning (nothing to drive the future).
    fn schedule(&self, reason: DriveReason, set: DriveSet) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime available; dropping scheduled drive");
            return;
        };

        self.inner.background.count.fetch_add(1, Ordering::SeqCst);
        let engine = self.clone();
        handle.spawn(async move {
            {
                let _gate = engine.inner.drive_gate.lock().await;
                let requested = engine.resolve_set(set);
                Drive::prepare(&engine.inner, reason, requested).run(&engine.inner).await;
            }
            engine.inner.background.count.fetch_sub(1, Ordering::SeqCst);
            engine.inner.background.notify.notify_waiters();
        });
    }

    /// Clears loaded state on every action-bearing unit along with all
    /// transient flags; environment entries stay loaded.
    fn reset_all(&self) {
        let mut registry = self.inner.registry.write();
        let names = registry.names();
        for name in names {
            if let Some(unit) = registry.get_mut(&name) {
                if unit.has_action() {
                    unit.state.remove(UnitState::LOADED);
                }
                unit.state.remove(UnitState::RELOADING | UnitState::WAS_LAZY);
            }
        }
    }
}
