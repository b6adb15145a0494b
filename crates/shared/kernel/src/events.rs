//! Typed event payloads published on the loader's event bus.
//!
//! Each payload is broadcast as its own channel; subscribe to exactly the
//! notifications you care about via `EventBus::subscribe`.

use crate::error::LoadError;
use bootlace_domain::Value;
use bootlace_page::ElementId;
use std::sync::Arc;

/// Fired once, after the first load drive completes.
#[derive(Debug, Clone)]
pub struct AppInit;

/// A unit's load attempt started; dependency values may still be resolving.
#[derive(Debug, Clone)]
pub struct UnitLoading {
    pub unit: Arc<str>,
    pub element: Option<ElementId>,
    /// True when the attempt belongs to a reload drive.
    pub reloading: bool,
}

/// A unit's result was accepted and the unit is loaded for this cycle.
#[derive(Debug, Clone)]
pub struct UnitLoaded {
    pub unit: Arc<str>,
    pub element: Option<ElementId>,
    /// The returned value; `Null` when the result is still deferred.
    pub result: Value,
    /// True when the action returned a deferred result.
    pub deferred: bool,
}

/// A unit remained unloaded when a drive reached its fixed point.
///
/// Only assembled when at least one subscriber listens for it.
#[derive(Debug, Clone)]
pub struct UnitPending {
    pub unit: Arc<str>,
}

/// A reload attempt was skipped because the computed arguments matched the
/// memoized ones.
#[derive(Debug, Clone)]
pub struct UnitSkipped {
    pub unit: Arc<str>,
    pub element: Option<ElementId>,
}

/// A unit's load attempt failed; the unit stays pending, siblings proceed.
#[derive(Debug)]
pub struct UnitError {
    pub unit: Arc<str>,
    pub element: Option<ElementId>,
    pub error: LoadError,
}
