//! Facade crate for the Bootlace loader.
//! Re-exports domain/kernel primitives and wraps the engine in the
//! application-level registration surface.
//! Keep this crate thin: it should compose other crates, not implement
//! resolution logic.
//!
//! ## Usage
//! - Register environment values, data providers and features on an [`App`].
//! - Call [`App::load`] once the page is available; the engine drives every
//!   unit whose dependencies are satisfied and keeps the rest pending.
//! - Subscribe to [`events`] for loading/loaded/pending/error/skip
//!   notifications.

mod app;

pub use app::App;

pub use bootlace_domain as domain;
pub use bootlace_domain::{DependencyRef, UnitKind, UnitSnapshot, Value, ValueExt};
pub use bootlace_event_bus::{EventBus, EventReceiverExt};
pub use bootlace_kernel as kernel;
pub use bootlace_kernel::events;
pub use bootlace_kernel::{
    ActionError, ActionOutput, DataDef, EngineConfig, FeatureDef, Invocation, LoadContext,
    LoadError, RegistryError, async_action, default_serialize_args, sync_action,
};
pub use bootlace_page::{ElementId, ElementRef, Page};

/// Everything a typical integration needs in scope.
pub mod prelude {
    pub use crate::app::App;
    pub use bootlace_domain::{Value, ValueExt};
    pub use bootlace_event_bus::EventReceiverExt;
    pub use bootlace_kernel::{
        ActionError, DataDef, FeatureDef, LoadContext, async_action, sync_action,
    };
    pub use bootlace_page::Page;
}
