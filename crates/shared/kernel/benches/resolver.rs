use bootlace_domain::Value;
use bootlace_kernel::registry::{Unit, UnitRegistry};
use bootlace_kernel::resolver::{activation_closure, transitive_dependents};
use bootlace_kernel::{DataDef, sync_action};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// A layered graph: `width` units per layer, each depending on two units of
/// the previous layer; odd layers are lazy.
fn layered_registry(layers: usize, width: usize) -> UnitRegistry {
    let mut registry = UnitRegistry::new();
    for layer in 0..layers {
        for slot in 0..width {
            let mut def = DataDef::new(
                format!("l{layer}s{slot}"),
                sync_action(|_| Ok(Value::Bool(true))),
            )
            .lazy(layer % 2 == 1);
            if layer > 0 {
                let prev = layer - 1;
                def = def.depends([
                    format!("l{prev}s{slot}"),
                    format!("l{prev}s{}", (slot + 1) % width),
                ]);
            }
            registry.insert(Unit::from_data(def)).unwrap();
        }
    }
    registry
}

fn bench_activation_closure(c: &mut Criterion) {
    let registry = layered_registry(16, 32);
    let names = registry.names();

    c.bench_function("activation_closure/16x32", |b| {
        b.iter(|| black_box(activation_closure(&registry, black_box(&names))));
    });

    let surface: Vec<_> = names.iter().rev().take(32).cloned().collect();
    c.bench_function("activation_closure/16x32/top-layer", |b| {
        b.iter(|| black_box(activation_closure(&registry, black_box(&surface))));
    });
}

fn bench_transitive_dependents(c: &mut Criterion) {
    let registry = layered_registry(16, 32);

    c.bench_function("transitive_dependents/16x32", |b| {
        b.iter(|| black_box(transitive_dependents(&registry, black_box("l0s0"))));
    });
}

criterion_group!(benches, bench_activation_closure, bench_transitive_dependents);
criterion_main!(benches);
