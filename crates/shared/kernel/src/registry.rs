//! The unit registry: every registered unit keyed by its unique name,
//! preserved in insertion order.

use crate::action::{Action, ArgSerializer, Materialized};
use crate::def::{DataDef, FeatureDef};
use crate::error::RegistryError;
use bootlace_domain::{DependencyRef, UnitKind, UnitSnapshot, UnitState, Value};
use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// One registered unit and its mutable load-cycle state.
pub struct Unit {
    pub name: Arc<str>,
    pub kind: UnitKind,
    pub depends: Vec<Arc<str>>,
    pub lazy: bool,
    pub nullable: bool,
    pub state: UnitState,
    pub result: Option<Materialized>,
    pub(crate) action: Option<Action>,
    pub(crate) serialize_args: Option<ArgSerializer>,
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("depends", &self.depends)
            .field("lazy", &self.lazy)
            .field("nullable", &self.nullable)
            .field("state", &self.state)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl Unit {
    #[must_use]
    pub fn from_feature(def: FeatureDef) -> Self {
        Self {
            name: def.name,
            kind: UnitKind::Feature { selector: def.selector },
            depends: def.depends,
            lazy: def.lazy,
            nullable: def.nullable,
            state: UnitState::empty(),
            result: None,
            action: Some(def.action),
            serialize_args: def.serialize_args,
        }
    }

    #[must_use]
    pub fn from_data(def: DataDef) -> Self {
        Self {
            name: def.name,
            kind: UnitKind::Data,
            depends: def.depends,
            lazy: def.lazy,
            nullable: def.nullable,
            state: UnitState::empty(),
            result: None,
            action: Some(def.action),
            serialize_args: def.serialize_args,
        }
    }

    /// Environment entries carry no action and are loaded on registration.
    #[must_use]
    pub fn environment(name: Arc<str>, value: Value) -> Self {
        Self {
            name,
            kind: UnitKind::Environment,
            depends: Vec::new(),
            lazy: false,
            nullable: true,
            state: UnitState::LOADED,
            result: Some(Materialized::Ready(value)),
            action: None,
            serialize_args: None,
        }
    }

    /// Whether the unit's result is accepted for the current cycle.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.state.contains(UnitState::LOADED)
    }

    /// Whether the unit carries an action (environment entries do not).
    #[must_use]
    pub const fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Read-only view for diagnostics.
    #[must_use]
    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            name: self.name.clone(),
            kind: self.kind.clone(),
            depends: self.depends.clone(),
            lazy: self.lazy,
            nullable: self.nullable,
            state: self.state,
        }
    }
}

/// Insertion-ordered map of all registered units.
///
/// Units are never removed; name uniqueness is enforced across all three
/// categories at insert time.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: IndexMap<Arc<str>, Unit, FxBuildHasher>,
}

impl UnitRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a unit, enforcing name uniqueness.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] without mutating state if the
    /// name is taken.
    pub fn insert(&mut self, unit: Unit) -> Result<(), RegistryError> {
        if self.units.contains_key(&unit.name) {
            return Err(RegistryError::DuplicateName { name: unit.name, context: None });
        }
        self.units.insert(unit.name.clone(), unit);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Unit> {
        self.units.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Unit> {
        self.units.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// All unit names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<Arc<str>> {
        self.units.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Diagnostic resolution of a unit's declared dependencies: resolved
    /// units by kind, or an `Unknown` placeholder for unregistered names.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Vec<DependencyRef> {
        self.get(name).map_or_else(Vec::new, |unit| {
            unit.depends
                .iter()
                .map(|dep| {
                    self.get(dep).map_or_else(
                        || DependencyRef::Unknown { name: dep.clone() },
                        |resolved| DependencyRef::Resolved {
                            name: resolved.name.clone(),
                            kind: resolved.kind.clone(),
                        },
                    )
                })
                .collect()
        })
    }
}
