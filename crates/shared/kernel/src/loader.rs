//! The unit loader: materializes dependency values, consults the memo
//! cache, invokes the action and records the outcome.
//!
//! Every failure path settles the attempt without propagating: the unit
//! stays pending and sibling units in the same drive are unaffected.

use crate::action::{Action, ActionError, ActionOutput, ArgSerializer, Invocation, Materialized, spawn_shared};
use crate::engine::EngineInner;
use crate::error::LoadError;
use crate::events::{UnitError, UnitLoaded, UnitLoading, UnitSkipped};
use crate::memo::default_serialize_args;
use bootlace_domain::{UnitState, Value, ValueExt};
use bootlace_page::ElementRef;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, trace};

/// Outcome of one settled load attempt.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Settlement {
    /// Whether the unit is loaded after the attempt.
    pub loaded: bool,
}

/// Everything the loader needs, snapshotted before the first await so no
/// registry lock is held across suspension points.
struct UnitPlan {
    action: Action,
    serialize_args: Option<ArgSerializer>,
    depends: Vec<Arc<str>>,
    selector: Option<Box<str>>,
    nullable: bool,
    reloading: bool,
}

pub(crate) async fn load_unit(engine: &EngineInner, name: &Arc<str>) -> Settlement {
    let plan = {
        let registry = engine.registry.read();
        let Some(unit) = registry.get(name) else {
            return Settlement { loaded: false };
        };
        let Some(action) = unit.action.clone() else {
            return Settlement { loaded: unit.is_loaded() };
        };
        UnitPlan {
            action,
            serialize_args: unit.serialize_args.clone(),
            depends: unit.depends.clone(),
            selector: unit.kind.selector().map(Into::into),
            nullable: unit.nullable,
            reloading: unit.state.contains(UnitState::RELOADING),
        }
    };

    if let Some(class) = &plan.selector {
        let context = engine.context.read().clone();
        let Some(context) = context else {
            debug!(unit = %name, "No active page context; element unit stays pending");
            return Settlement { loaded: false };
        };

        let matched = context.page.select(class, context.root);
        if matched.is_empty() {
            debug!(unit = %name, class = %class, "No matching elements; unit stays pending");
            return Settlement { loaded: false };
        }

        // Per-element fan-out: each invocation emits its own events and
        // settles independently.
        let mut loaded = false;
        for id in matched {
            let element = context.page.element(id);
            if run_invocation(engine, name, &plan, Some(element)).await {
                loaded = true;
            }
        }
        Settlement { loaded }
    } else {
        let loaded = run_invocation(engine, name, &plan, None).await;
        Settlement { loaded }
    }
}

/// Runs one invocation of the unit's action. Returns whether the unit is
/// loaded afterwards.
async fn run_invocation(
    engine: &EngineInner,
    name: &Arc<str>,
    plan: &UnitPlan,
    element: Option<ElementRef>,
) -> bool {
    let element_id = element.as_ref().map(ElementRef::id);
    engine.emit(UnitLoading {
        unit: name.clone(),
        element: element_id,
        reloading: plan.reloading,
    });

    // Gather result slots; values may still be deferred at this point.
    let slots = {
        let registry = engine.registry.read();
        let mut slots = Vec::with_capacity(plan.depends.len());
        for dep in &plan.depends {
            match registry.get(dep).and_then(|unit| unit.result.clone()) {
                Some(slot) => slots.push((dep.clone(), slot)),
                None => {
                    // Readiness was re-checked before selection; a missing slot
                    // means the registry changed underneath this attempt.
                    engine.emit(UnitError {
                        unit: name.clone(),
                        element: element_id,
                        error: LoadError::DependencyRejected {
                            dependency: dep.clone(),
                            source: ActionError::new("dependency result not materialized"),
                            context: None,
                        },
                    });
                    return false;
                },
            }
        }
        slots
    };

    // Wait for all dependency values; the first rejection settles the
    // attempt as not-loaded without touching sibling units.
    let args = match try_join_all(slots.into_iter().map(|(dep, slot)| async move {
        slot.resolve().await.map_err(|source| (dep, source))
    }))
    .await
    {
        Ok(values) => values,
        Err((dependency, source)) => {
            engine.emit(UnitError {
                unit: name.clone(),
                element: element_id,
                error: LoadError::DependencyRejected { dependency, source, context: None },
            });
            return false;
        },
    };

    let invocation = Invocation { element, args };
    let serialized = plan
        .serialize_args
        .as_ref()
        .map_or_else(|| default_serialize_args(&invocation), |f| f(&invocation));
    let memo_key = (name.clone(), element_id);

    if plan.reloading && engine.memo.matches(&memo_key, &serialized) {
        // Effective inputs did not change: restore the prior result without
        // re-running the side effect.
        trace!(unit = %name, "Arguments unchanged; skipping reload invocation");
        if let Some(unit) = engine.registry.write().get_mut(name) {
            unit.state.insert(UnitState::LOADED);
        }
        engine.emit(UnitSkipped { unit: name.clone(), element: element_id });
        return true;
    }
    engine.memo.store(memo_key, serialized);

    match (plan.action)(invocation) {
        Err(source) => {
            engine.emit(UnitError {
                unit: name.clone(),
                element: element_id,
                error: LoadError::ActionFailed { source, context: None },
            });
            false
        },
        Ok(ActionOutput::Ready(value)) => {
            if value.is_materialized() || plan.nullable {
                if let Some(unit) = engine.registry.write().get_mut(name) {
                    unit.state.insert(UnitState::LOADED);
                    unit.result = Some(Materialized::Ready(value.clone()));
                }
                engine.emit(UnitLoaded {
                    unit: name.clone(),
                    element: element_id,
                    result: value,
                    deferred: false,
                });
                true
            } else {
                // Soft failure by falsy return: the unit stays pending and
                // remains eligible for retry on a future drive.
                debug!(unit = %name, "Falsy non-nullable result; unit stays pending");
                false
            }
        },
        Ok(ActionOutput::Deferred(fut)) => {
            let shared = spawn_shared(fut);
            if let Some(unit) = engine.registry.write().get_mut(name) {
                unit.state.insert(UnitState::LOADED);
                unit.result = Some(Materialized::Deferred(shared));
            }
            engine.emit(UnitLoaded {
                unit: name.clone(),
                element: element_id,
                result: Value::Null,
                deferred: true,
            });
            true
        },
    }
}
