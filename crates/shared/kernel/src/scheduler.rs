//! The fixed-point drive: an explicit state machine selecting one ready
//! unit at a time until no ready unit remains.
//!
//! Termination: each iteration either transitions a unit to loaded
//! (shrinking the ready-but-unloaded set) or removes it from the working
//! set; the working set is finite and never grows mid-drive.

use crate::engine::EngineInner;
use crate::events::UnitPending;
use crate::loader::load_unit;
use crate::readiness::is_ready;
use crate::resolver::activation_closure;
use bootlace_domain::UnitState;
use fxhash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Why a drive was started; a tracing field only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DriveReason {
    Load,
    Retry,
    Registration,
    Reload,
}

impl DriveReason {
    const fn label(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Retry => "retry",
            Self::Registration => "registration",
            Self::Reload => "reload",
        }
    }
}

#[derive(Debug)]
enum DriveState {
    SelectingCandidate,
    AwaitingSettlement(Arc<str>),
    Complete,
}

/// One run of the scheduler over a working set.
#[derive(Debug)]
pub(crate) struct Drive {
    reason: DriveReason,
    /// The requested set, before lazy-activation expansion. Pending
    /// diagnostics are computed over this set only.
    original: Vec<Arc<str>>,
    /// The deduplicated working set: requested units followed by the lazy
    /// activation closure, in stable insertion order. Shrinks as attempts
    /// settle unloaded.
    working: Vec<Arc<str>>,
    /// Immutable copy of the prepared working set; transient flags are
    /// reverted over this roster even for units dropped mid-drive.
    roster: Vec<Arc<str>>,
    state: DriveState,
}

impl Drive {
    /// Expands the requested set with its lazy activation closure and
    /// promotes the activated units for the duration of this drive.
    pub(crate) fn prepare(engine: &EngineInner, reason: DriveReason, requested: Vec<Arc<str>>) -> Self {
        let mut registry = engine.registry.write();
        let activated = activation_closure(&registry, &requested);
        for name in &activated {
            if let Some(unit) = registry.get_mut(name) {
                unit.state.insert(UnitState::WAS_LAZY);
            }
        }
        drop(registry);

        let mut seen: FxHashSet<Arc<str>> = FxHashSet::default();
        let mut working: Vec<Arc<str>> = Vec::with_capacity(requested.len() + activated.len());
        for name in requested.iter().chain(activated.iter()) {
            if seen.insert(name.clone()) {
                working.push(name.clone());
            }
        }

        debug!(
            reason = reason.label(),
            requested = requested.len(),
            activated = activated.len(),
            "Drive prepared"
        );

        let roster = working.clone();
        Self { reason, original: requested, working, roster, state: DriveState::SelectingCandidate }
    }

    /// Runs the drive to its fixed point. Exactly one unit load is in
    /// flight at any moment; the next selection happens only after the
    /// previous attempt settled.
    pub(crate) async fn run(mut self, engine: &EngineInner) {
        loop {
            match self.state {
                DriveState::SelectingCandidate => {
                    let next = {
                        let registry = engine.registry.read();
                        self.working
                            .iter()
                            .find(|name| {
                                registry.get(name).is_some_and(|unit| is_ready(&registry, unit))
                            })
                            .cloned()
                    };
                    self.state = match next {
                        Some(name) => DriveState::AwaitingSettlement(name),
                        None => {
                            self.finish(engine);
                            DriveState::Complete
                        },
                    };
                },
                DriveState::AwaitingSettlement(ref name) => {
                    let name = name.clone();
                    let settlement = load_unit(engine, &name).await;
                    if !settlement.loaded {
                        // The unit stays registered and may succeed on a
                        // future drive; drop it from this one.
                        trace!(unit = %name, "Attempt settled unloaded; removed from working set");
                        self.working.retain(|candidate| candidate != &name);
                    }
                    self.state = DriveState::SelectingCandidate;
                },
                DriveState::Complete => break,
            }
        }
    }

    /// Fixed point reached: emit pending diagnostics (only when somebody
    /// listens) and revert this drive's transient unit flags.
    fn finish(&self, engine: &EngineInner) {
        if engine.bus.subscriber_count::<UnitPending>() > 0 {
            let pending: Vec<Arc<str>> = {
                let registry = engine.registry.read();
                self.original
                    .iter()
                    .filter(|name| registry.get(name).is_some_and(|unit| !unit.is_loaded()))
                    .cloned()
                    .collect()
            };
            for unit in pending {
                engine.emit(UnitPending { unit });
            }
        }

        let mut registry = engine.registry.write();
        for name in &self.roster {
            if let Some(unit) = registry.get_mut(name) {
                unit.state.remove(UnitState::WAS_LAZY | UnitState::RELOADING);
            }
        }

        debug!(reason = self.reason.label(), "Drive complete");
    }
}
