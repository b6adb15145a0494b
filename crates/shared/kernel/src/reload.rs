//! Reload preparation: when an environment value changes after the first
//! load, its transitive dependents are reset and marked for a reload drive.
//!
//! The dependent set is a conservative over-approximation; the memo cache
//! consulted by the loader is the precision mechanism that skips units
//! whose computed arguments turn out identical.

use crate::registry::UnitRegistry;
use crate::resolver::transitive_dependents;
use bootlace_domain::UnitState;
use std::sync::Arc;
use tracing::debug;

/// Resets every unit transitively depending on `changed` and marks it for
/// reload. Returns the set, in discovery order, for submission as a drive.
pub(crate) fn prepare_reload(registry: &mut UnitRegistry, changed: &str) -> Vec<Arc<str>> {
    let dependents = transitive_dependents(registry, changed);

    for name in &dependents {
        if let Some(unit) = registry.get_mut(name) {
            // Environment entries are always loaded and untouched.
            if unit.has_action() {
                unit.state.remove(UnitState::LOADED);
            }
            unit.state.remove(UnitState::RELOADING | UnitState::WAS_LAZY);
            unit.state.insert(UnitState::RELOADING);
        }
    }

    debug!(changed, dependents = dependents.len(), "Prepared reload set");
    dependents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::sync_action;
    use crate::def::FeatureDef;
    use crate::registry::{Unit, UnitRegistry};
    use bootlace_domain::Value;

    fn loaded_feature(name: &str, depends: &[&str]) -> Unit {
        let mut unit = Unit::from_feature(
            FeatureDef::new(name, sync_action(|_| Ok(Value::Bool(true))))
                .depends(depends.iter().copied().map(str::to_owned)),
        );
        unit.state.insert(UnitState::LOADED);
        unit
    }

    #[test]
    fn reload_resets_transitive_dependents_only() {
        let mut registry = UnitRegistry::new();
        registry.insert(Unit::environment("answer".into(), Value::from(1))).unwrap();
        registry.insert(loaded_feature("direct", &["answer"])).unwrap();
        registry.insert(loaded_feature("indirect", &["direct"])).unwrap();
        registry.insert(loaded_feature("bystander", &[])).unwrap();

        let set = prepare_reload(&mut registry, "answer");
        assert_eq!(set, vec![Arc::<str>::from("direct"), Arc::<str>::from("indirect")]);

        for name in ["direct", "indirect"] {
            let unit = registry.get(name).unwrap();
            assert!(!unit.is_loaded());
            assert!(unit.state.contains(UnitState::RELOADING));
        }
        assert!(registry.get("bystander").unwrap().is_loaded());
    }

    #[test]
    fn environment_dependents_keep_loaded_state() {
        let mut registry = UnitRegistry::new();
        registry.insert(Unit::environment("a".into(), Value::from(1))).unwrap();
        // An environment entry never depends on anything in practice, but the
        // reset guard is per-unit: no action means loaded stays set.
        let mut env = Unit::environment("b".into(), Value::from(2));
        env.depends = vec![Arc::from("a")];
        registry.insert(env).unwrap();

        let set = prepare_reload(&mut registry, "a");
        assert_eq!(set, vec![Arc::<str>::from("b")]);
        assert!(registry.get("b").unwrap().is_loaded());
    }
}
