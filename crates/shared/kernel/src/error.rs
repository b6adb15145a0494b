use crate::action::ActionError;
use std::borrow::Cow;
use std::sync::Arc;

/// Errors raised at registration time.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A unit name collided with an already registered unit of any category.
    /// Registration fails before any state is mutated.
    #[error("Duplicate unit name{}: {name}", format_context(.context))]
    DuplicateName { name: Arc<str>, context: Option<Cow<'static, str>> },
}

/// Runtime load failures, reported through `UnitError` events.
///
/// These never abort a drive: the failing unit stays pending and sibling
/// units proceed.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// An upstream deferred result rejected while this unit gathered its
    /// arguments.
    #[error("Dependency '{dependency}' rejected{}: {source}", format_context(.context))]
    DependencyRejected {
        dependency: Arc<str>,
        #[source]
        source: ActionError,
        context: Option<Cow<'static, str>>,
    },

    /// The unit's own action returned a failure.
    #[error("Action failed{}: {source}", format_context(.context))]
    ActionFailed {
        #[source]
        source: ActionError,
        context: Option<Cow<'static, str>>,
    },
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
