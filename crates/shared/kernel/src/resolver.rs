//! Graph walks over the `depends` edges: lazy activation and reload sets.

use crate::readiness::is_pending_lazy;
use crate::registry::UnitRegistry;
use fxhash::FxHashSet;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// Computes the lazy activation closure for a drive.
///
/// Policy: the full transitive closure. Every unit reachable over one or
/// more `depends` edges from any unit in `requested` is considered, and the
/// pending-lazy subset is returned in discovery order. This guarantees a
/// lazy unit several hops away from the requested set is activated in a
/// single resolution pass.
#[must_use]
pub fn activation_closure(registry: &UnitRegistry, requested: &[Arc<str>]) -> Vec<Arc<str>> {
    let mut visited: FxHashSet<Arc<str>> = requested.iter().cloned().collect();
    let mut queue: VecDeque<Arc<str>> = requested.iter().cloned().collect();
    let mut reached: Vec<Arc<str>> = Vec::new();
    let mut reached_set: FxHashSet<Arc<str>> = FxHashSet::default();

    while let Some(name) = queue.pop_front() {
        let Some(unit) = registry.get(&name) else { continue };
        for dep in &unit.depends {
            if reached_set.insert(dep.clone()) {
                reached.push(dep.clone());
            }
            if visited.insert(dep.clone()) {
                queue.push_back(dep.clone());
            }
        }
    }

    let activated: Vec<Arc<str>> = reached
        .into_iter()
        .filter(|name| registry.get(name).is_some_and(is_pending_lazy))
        .collect();

    if !activated.is_empty() {
        trace!(count = activated.len(), "Promoting lazy units for this drive");
    }
    activated
}

/// Computes the set of units transitively depending on `changed`, in
/// breadth-first discovery order. The changed unit itself is not included.
#[must_use]
pub fn transitive_dependents(registry: &UnitRegistry, changed: &str) -> Vec<Arc<str>> {
    let changed: Arc<str> = Arc::from(changed);
    let mut seen: FxHashSet<Arc<str>> = FxHashSet::from_iter([changed.clone()]);
    let mut queue: VecDeque<Arc<str>> = VecDeque::from([changed]);
    let mut dependents: Vec<Arc<str>> = Vec::new();

    while let Some(current) = queue.pop_front() {
        for unit in registry.iter() {
            if unit.depends.iter().any(|dep| **dep == *current) && seen.insert(unit.name.clone()) {
                dependents.push(unit.name.clone());
                queue.push_back(unit.name.clone());
            }
        }
    }

    dependents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::sync_action;
    use crate::def::{DataDef, FeatureDef};
    use crate::registry::{Unit, UnitRegistry};
    use bootlace_domain::Value;

    fn feature(name: &str, depends: &[&str]) -> Unit {
        Unit::from_feature(
            FeatureDef::new(name, sync_action(|_| Ok(Value::Bool(true))))
                .depends(depends.iter().copied().map(str::to_owned)),
        )
    }

    fn lazy_data(name: &str, depends: &[&str]) -> Unit {
        Unit::from_data(
            DataDef::new(name, sync_action(|_| Ok(Value::Bool(true))))
                .depends(depends.iter().copied().map(str::to_owned)),
        )
    }

    fn registry_with(units: Vec<Unit>) -> UnitRegistry {
        let mut registry = UnitRegistry::new();
        for unit in units {
            registry.insert(unit).unwrap();
        }
        registry
    }

    #[test]
    fn direct_lazy_dependency_is_activated() {
        let registry = registry_with(vec![lazy_data("d", &[]), feature("f", &["d"])]);
        let closure = activation_closure(&registry, &registry.names());
        assert_eq!(closure, vec![Arc::<str>::from("d")]);
    }

    #[test]
    fn multi_hop_lazy_chain_is_activated_in_one_pass() {
        let registry = registry_with(vec![
            lazy_data("deep", &[]),
            lazy_data("middle", &["deep"]),
            feature("f", &["middle"]),
        ]);
        let closure = activation_closure(&registry, &[Arc::from("f")]);
        assert_eq!(closure, vec![Arc::<str>::from("middle"), Arc::<str>::from("deep")]);
    }

    #[test]
    fn unreferenced_lazy_unit_stays_dormant() {
        let registry = registry_with(vec![lazy_data("orphan", &[]), feature("f", &[])]);
        assert!(activation_closure(&registry, &registry.names()).is_empty());
    }

    #[test]
    fn loaded_lazy_unit_is_not_reactivated() {
        let mut registry = registry_with(vec![lazy_data("d", &[]), feature("f", &["d"])]);
        registry.get_mut("d").unwrap().state.insert(bootlace_domain::UnitState::LOADED);
        assert!(activation_closure(&registry, &registry.names()).is_empty());
    }

    #[test]
    fn missing_dependency_names_are_skipped() {
        let registry = registry_with(vec![feature("f", &["ghost"])]);
        assert!(activation_closure(&registry, &registry.names()).is_empty());
    }

    #[test]
    fn dependents_cover_transitive_chain() {
        let registry = registry_with(vec![
            feature("direct", &["answer"]),
            feature("indirect", &["direct"]),
            feature("unrelated", &[]),
        ]);
        let dependents = transitive_dependents(&registry, "answer");
        assert_eq!(dependents, vec![Arc::<str>::from("direct"), Arc::<str>::from("indirect")]);
    }

    #[test]
    fn dependent_cycles_terminate() {
        let registry = registry_with(vec![
            feature("a", &["answer", "b"]),
            feature("b", &["a"]),
        ]);
        let mut dependents = transitive_dependents(&registry, "answer");
        dependents.sort();
        assert_eq!(dependents, vec![Arc::<str>::from("a"), Arc::<str>::from("b")]);
    }
}
