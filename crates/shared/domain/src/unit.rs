use crate::constants::{DATA, ENVIRONMENT, FEATURE, UNKNOWN};
use bitflags::bitflags;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

bitflags! {
    /// Transient per-cycle unit state.
    ///
    /// `LOADED` means the unit's result is materialized and accepted for the
    /// current load cycle. `RELOADING` and `WAS_LAZY` are scoped to a single
    /// scheduling drive and cleared by the reset that begins a reload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct UnitState: u8 {
        const LOADED = 1 << 0;
        const RELOADING = 1 << 1;
        const WAS_LAZY = 1 << 2;
    }
}

/// The three unit categories, as a tagged variant.
///
/// An environment entry structurally has no action; a data provider is never
/// bound to page elements. Illegal combinations are unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UnitKind {
    /// A unit with a mandatory action, optionally fanned out over page
    /// elements matching a class selector.
    Feature { selector: Option<Box<str>> },
    /// A lazily evaluated value producer.
    Data,
    /// A plain ambient value, always loaded.
    Environment,
}

impl UnitKind {
    /// Category label used in diagnostics and log fields.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Feature { .. } => FEATURE,
            Self::Data => DATA,
            Self::Environment => ENVIRONMENT,
        }
    }

    /// Whether units of this kind carry an action.
    #[must_use]
    pub const fn has_action(&self) -> bool {
        !matches!(self, Self::Environment)
    }

    /// The element class selector, when the unit fans out over elements.
    #[must_use]
    pub fn selector(&self) -> Option<&str> {
        match self {
            Self::Feature { selector } => selector.as_deref(),
            Self::Data | Self::Environment => None,
        }
    }
}

/// Diagnostic view of one declared dependency.
///
/// A dependency name that nothing has registered yet resolves to
/// [`DependencyRef::Unknown`]; it is not an error, the dependent simply
/// stays pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DependencyRef {
    Resolved { name: Arc<str>, kind: UnitKind },
    Unknown { name: Arc<str> },
}

impl DependencyRef {
    /// The declared dependency name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Resolved { name, .. } | Self::Unknown { name } => name,
        }
    }

    /// Category label; `"unknown"` for unregistered names.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Resolved { kind, .. } => kind.label(),
            Self::Unknown { .. } => UNKNOWN,
        }
    }
}

/// Read-only snapshot of a registered unit, for observability.
#[derive(Debug, Clone, Serialize)]
pub struct UnitSnapshot {
    pub name: Arc<str>,
    pub kind: UnitKind,
    pub depends: Vec<Arc<str>>,
    pub lazy: bool,
    pub nullable: bool,
    #[serde(skip)]
    pub state: UnitState,
}

impl UnitSnapshot {
    /// Whether the unit's result is available for the current cycle.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.state.contains(UnitState::LOADED)
    }
}
