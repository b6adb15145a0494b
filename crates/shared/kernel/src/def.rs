//! Unit definitions accepted by the registration surface.

use crate::action::{Action, ArgSerializer, Invocation};
use bootlace_domain::Value;
use std::fmt;
use std::sync::Arc;

/// Definition of a feature unit: a mandatory action, optionally bound to
/// page elements by class selector.
///
/// Defaults: eager (`lazy = false`) and `nullable = true`, so side-effect
/// actions returning nothing meaningful still count as loaded.
#[derive(Clone)]
pub struct FeatureDef {
    pub(crate) name: Arc<str>,
    pub(crate) action: Action,
    pub(crate) depends: Vec<Arc<str>>,
    pub(crate) selector: Option<Box<str>>,
    pub(crate) lazy: bool,
    pub(crate) nullable: bool,
    pub(crate) serialize_args: Option<ArgSerializer>,
}

impl FeatureDef {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, action: Action) -> Self {
        Self {
            name: name.into(),
            action,
            depends: Vec::new(),
            selector: None,
            lazy: false,
            nullable: true,
            serialize_args: None,
        }
    }

    /// Declares dependencies; order determines the action's argument order.
    #[must_use]
    pub fn depends<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.depends = names.into_iter().map(Into::into).collect();
        self
    }

    /// Binds the feature to page elements carrying the given class; the
    /// action runs once per matched element.
    #[must_use]
    pub fn elements(mut self, class: impl Into<Box<str>>) -> Self {
        self.selector = Some(class.into());
        self
    }

    /// Defers evaluation until something depends on this unit.
    #[must_use]
    pub const fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Controls whether a falsy action result still counts as loaded.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Overrides the memoization serializer for this unit's arguments.
    #[must_use]
    pub fn serialize_args<F>(mut self, f: F) -> Self
    where
        F: Fn(&Invocation) -> Value + Send + Sync + 'static,
    {
        self.serialize_args = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for FeatureDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureDef")
            .field("name", &self.name)
            .field("depends", &self.depends)
            .field("selector", &self.selector)
            .field("lazy", &self.lazy)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

/// Definition of a data provider unit.
///
/// Defaults: `lazy = true` (evaluated only when depended upon) and
/// `nullable = false` (a falsy result does not count as materialized).
#[derive(Clone)]
pub struct DataDef {
    pub(crate) name: Arc<str>,
    pub(crate) action: Action,
    pub(crate) depends: Vec<Arc<str>>,
    pub(crate) lazy: bool,
    pub(crate) nullable: bool,
    pub(crate) serialize_args: Option<ArgSerializer>,
}

impl DataDef {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, action: Action) -> Self {
        Self {
            name: name.into(),
            action,
            depends: Vec::new(),
            lazy: true,
            nullable: false,
            serialize_args: None,
        }
    }

    /// Declares dependencies; order determines the action's argument order.
    #[must_use]
    pub fn depends<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.depends = names.into_iter().map(Into::into).collect();
        self
    }

    /// Forces eager evaluation on every drive.
    #[must_use]
    pub const fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Controls whether a falsy action result still counts as loaded.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Overrides the memoization serializer for this unit's arguments.
    #[must_use]
    pub fn serialize_args<F>(mut self, f: F) -> Self
    where
        F: Fn(&Invocation) -> Value + Send + Sync + 'static,
    {
        self.serialize_args = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for DataDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataDef")
            .field("name", &self.name)
            .field("depends", &self.depends)
            .field("lazy", &self.lazy)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}
