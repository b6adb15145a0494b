use bootlace_domain::constants::ENV_ATTR_PREFIX;
use bootlace_domain::{DependencyRef, UnitSnapshot, Value};
use bootlace_event_bus::EventBus;
use bootlace_kernel::{DataDef, Engine, EngineConfig, FeatureDef, LoadContext, RegistryError};
use bootlace_page::{ElementId, Page};
use std::sync::Arc;

/// One loader application: the process-facing handle owning a registry, a
/// memo cache and an event bus.
///
/// Cloning is cheap and shares the same instance; independent [`App`] values
/// share nothing.
///
/// ## Example
///
/// ```rust
/// use bootlace::prelude::*;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), bootlace::RegistryError> {
///     let app = App::new();
///     app.register_environment("answer", Some(Value::from(42)))?;
///     app.register_feature(
///         FeatureDef::new(
///             "greet",
///             sync_action(|invocation| {
///                 assert_eq!(invocation.arg(0), &Value::from(42));
///                 Ok(Value::Bool(true))
///             }),
///         )
///         .depends(["answer"]),
///     )?;
///     app.load(None).await;
///     assert!(app.is_loaded("greet"));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct App {
    engine: Engine,
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self { engine: Engine::new() }
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self { engine: Engine::with_config(config) }
    }

    /// The underlying engine, for integrations needing lower-level access.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The event bus carrying loader notifications.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        self.engine.bus()
    }

    /// Registers a feature unit.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] on a name collision.
    pub fn register_feature(&self, def: FeatureDef) -> Result<(), RegistryError> {
        self.engine.register_feature(def)
    }

    /// Registers a data provider unit (lazy by default).
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] on a name collision.
    pub fn register_data(&self, def: DataDef) -> Result<(), RegistryError> {
        self.engine.register_data(def)
    }

    /// Registers or updates an environment value; an absent or `Null` value
    /// is a no-op.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] if the name collides with a
    /// non-environment unit.
    pub fn register_environment(
        &self,
        name: impl Into<Arc<str>>,
        value: Option<Value>,
    ) -> Result<(), RegistryError> {
        self.engine.set_environment(name, value)
    }

    /// Registers or updates an environment value, accepting `Null`.
    /// Changing a loaded application's value reloads its transitive
    /// dependents.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] if the name collides with a
    /// non-environment unit.
    pub fn register_environment_nullable(
        &self,
        name: impl Into<Arc<str>>,
        value: Value,
    ) -> Result<(), RegistryError> {
        self.engine.set_environment_nullable(name, value)
    }

    /// Seeds environment values from attributes under `root` whose names
    /// carry the default `data-env-` prefix.
    ///
    /// # Errors
    /// Returns the first name collision with a non-environment unit.
    pub fn scan_environment_attributes(
        &self,
        page: &Page,
        root: ElementId,
    ) -> Result<(), RegistryError> {
        self.engine.scan_environment_attributes(page, root, ENV_ATTR_PREFIX, None)
    }

    /// Like [`App::scan_environment_attributes`] with an explicit prefix and
    /// an optional transform applied to each raw attribute value.
    ///
    /// # Errors
    /// Returns the first name collision with a non-environment unit.
    pub fn scan_environment_attributes_with(
        &self,
        page: &Page,
        root: ElementId,
        prefix: &str,
        transform: Option<&dyn Fn(&str) -> Value>,
    ) -> Result<(), RegistryError> {
        self.engine.scan_environment_attributes(page, root, prefix, transform)
    }

    /// Runs a full load drive. A repeated load resets loaded state first;
    /// the first completed load emits `AppInit`.
    pub async fn load(&self, context: Option<LoadContext>) {
        self.engine.load(context).await;
    }

    /// Re-drives pending units without resetting loaded state. No-op before
    /// the first load.
    pub async fn retry_pending(&self) {
        self.engine.retry_pending().await;
    }

    /// Waits for background drives (registration- or reload-triggered) to
    /// complete.
    pub async fn settle(&self) {
        self.engine.settle().await;
    }

    /// Closes the event bus; returns the number of channels closed.
    pub fn shutdown(&self) -> usize {
        self.engine.shutdown()
    }

    /// Diagnostic resolution of a unit's declared dependencies.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Vec<DependencyRef> {
        self.engine.dependencies_of(name)
    }

    /// Read-only snapshot of a registered unit.
    #[must_use]
    pub fn snapshot(&self, name: &str) -> Option<UnitSnapshot> {
        self.engine.snapshot(name)
    }

    /// All registered unit names, in registration order.
    #[must_use]
    pub fn unit_names(&self) -> Vec<Arc<str>> {
        self.engine.unit_names()
    }

    /// Whether a unit is loaded in the current cycle.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.engine.is_loaded(name)
    }

    /// The materialized result of a unit, when ready.
    #[must_use]
    pub fn result_of(&self, name: &str) -> Option<Value> {
        self.engine.result_of(name)
    }
}
