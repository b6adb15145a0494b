//! Pure readiness predicates over the registry state.

use crate::registry::{Unit, UnitRegistry};
use bootlace_domain::UnitState;

/// Whether every declared dependency resolves to a loaded unit.
///
/// A dependency name nothing has registered evaluates to not-satisfied; it
/// never errors, the dependent simply stays pending.
#[must_use]
pub fn dependencies_satisfied(registry: &UnitRegistry, unit: &Unit) -> bool {
    unit.depends.iter().all(|dep| registry.get(dep).is_some_and(Unit::is_loaded))
}

/// Whether a unit is eligible for proactive evaluation right now.
///
/// Lazy units qualify only while promoted for the current drive. Units
/// without an action (environment entries) are loaded at registration time
/// and never selected here.
#[must_use]
pub fn is_ready(registry: &UnitRegistry, unit: &Unit) -> bool {
    let eager = !unit.lazy || unit.state.contains(UnitState::WAS_LAZY);
    eager && !unit.is_loaded() && unit.has_action() && dependencies_satisfied(registry, unit)
}

/// Whether a unit is a candidate for lazy activation.
#[must_use]
pub const fn is_pending_lazy(unit: &Unit) -> bool {
    unit.lazy && !unit.is_loaded()
}
