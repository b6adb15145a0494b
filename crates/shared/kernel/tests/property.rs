use bootlace_domain::{UnitState, Value};
use bootlace_kernel::registry::{Unit, UnitRegistry};
use bootlace_kernel::resolver::{activation_closure, transitive_dependents};
use bootlace_kernel::{DataDef, sync_action};
use proptest::prelude::*;
use std::collections::BTreeSet;

const MAX_UNITS: usize = 12;

#[derive(Debug, Clone)]
struct UnitShape {
    deps: Vec<usize>,
    lazy: bool,
    loaded: bool,
}

fn unit_shapes() -> impl Strategy<Value = Vec<UnitShape>> {
    proptest::collection::vec(
        (proptest::collection::vec(0..MAX_UNITS, 0..4), any::<bool>(), any::<bool>()),
        1..MAX_UNITS,
    )
    .prop_map(|raw| {
        raw.into_iter().map(|(deps, lazy, loaded)| UnitShape { deps, lazy, loaded }).collect()
    })
}

fn unit_name(index: usize) -> String {
    format!("u{index}")
}

fn build_registry(shapes: &[UnitShape]) -> UnitRegistry {
    let mut registry = UnitRegistry::new();
    for (index, shape) in shapes.iter().enumerate() {
        let deps: Vec<String> = shape
            .deps
            .iter()
            .filter(|dep| **dep < shapes.len() && **dep != index)
            .map(|dep| unit_name(*dep))
            .collect();
        let mut unit = Unit::from_data(
            DataDef::new(unit_name(index), sync_action(|_| Ok(Value::Bool(true))))
                .depends(deps)
                .lazy(shape.lazy),
        );
        if shape.loaded {
            unit.state.insert(UnitState::LOADED);
        }
        registry.insert(unit).unwrap();
    }
    registry
}

/// Every unit reachable over one or more `depends` edges from any node.
fn naive_reachable(shapes: &[UnitShape]) -> BTreeSet<String> {
    let mut reached = BTreeSet::new();
    for (index, _) in shapes.iter().enumerate() {
        let mut stack = vec![index];
        let mut visited = BTreeSet::from([index]);
        while let Some(current) = stack.pop() {
            for dep in &shapes[current].deps {
                if *dep < shapes.len() && *dep != current {
                    reached.insert(unit_name(*dep));
                    if visited.insert(*dep) {
                        stack.push(*dep);
                    }
                }
            }
        }
    }
    reached
}

/// Fixed-point dependents of node 0, excluding node 0 itself.
fn naive_dependents(shapes: &[UnitShape]) -> BTreeSet<String> {
    let mut affected = BTreeSet::from([0]);
    loop {
        let before = affected.len();
        for (index, shape) in shapes.iter().enumerate() {
            if shape.deps.iter().any(|dep| *dep < shapes.len() && *dep != index && affected.contains(dep)) {
                affected.insert(index);
            }
        }
        if affected.len() == before {
            break;
        }
    }
    affected.remove(&0);
    affected.into_iter().map(unit_name).collect()
}

proptest! {
    #[test]
    fn closure_is_exactly_the_reachable_pending_lazy_set(shapes in unit_shapes()) {
        let registry = build_registry(&shapes);
        let closure = activation_closure(&registry, &registry.names());

        // Only pending-lazy units, each at most once.
        let mut seen = BTreeSet::new();
        for name in &closure {
            let unit = registry.get(name).expect("closure names are registered");
            prop_assert!(unit.lazy, "activated unit must be lazy");
            prop_assert!(!unit.is_loaded(), "activated unit must be pending");
            prop_assert!(seen.insert(name.to_string()), "closure must be deduplicated");
        }

        // And all of them: every reachable pending-lazy unit is activated.
        let expected: BTreeSet<String> = naive_reachable(&shapes)
            .into_iter()
            .filter(|name| {
                let unit = registry.get(name).unwrap();
                unit.lazy && !unit.is_loaded()
            })
            .collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn dependents_match_naive_fixed_point(shapes in unit_shapes()) {
        let registry = build_registry(&shapes);
        let dependents: BTreeSet<String> = transitive_dependents(&registry, "u0")
            .iter()
            .map(|name| name.to_string())
            .collect();

        prop_assert!(!dependents.contains("u0"), "the changed unit is never its own dependent");
        prop_assert_eq!(dependents, naive_dependents(&shapes));
    }
}
