//! Unit actions and the materialization of their results.

use bootlace_domain::Value;
use bootlace_page::ElementRef;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Failure raised by a unit action or a rejected deferred result.
///
/// Clonable so a single rejection can be observed by every dependent
/// awaiting the same shared result.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ActionError {
    message: Cow<'static, str>,
}

impl ActionError {
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self { message: message.into() }
    }
}

impl From<&'static str> for ActionError {
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// The materialized argument list handed to a unit action: the matched
/// element (for element-bound features) followed by dependency results in
/// declaration order.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub element: Option<ElementRef>,
    pub args: Vec<Value>,
}

impl Invocation {
    /// Dependency result at `index`, `Null` when out of range.
    #[must_use]
    pub fn arg(&self, index: usize) -> &Value {
        static NULL: Value = Value::Null;
        self.args.get(index).unwrap_or(&NULL)
    }
}

/// What an action produced: a value, or a deferred value still resolving.
pub enum ActionOutput {
    Ready(Value),
    Deferred(BoxFuture<'static, Result<Value, ActionError>>),
}

impl ActionOutput {
    /// Conventional output for side-effect-only feature actions.
    #[must_use]
    pub const fn done() -> Self {
        Self::Ready(Value::Bool(true))
    }
}

impl fmt::Debug for ActionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Deferred(_) => f.debug_tuple("Deferred").field(&"..").finish(),
        }
    }
}

pub type ActionResult = Result<ActionOutput, ActionError>;

/// A unit action. Invoked by the loader once per matched element (or once,
/// for element-free units) after all dependency values materialized.
pub type Action = Arc<dyn Fn(Invocation) -> ActionResult + Send + Sync>;

/// Maps a materialized argument list to a comparable value for memoization.
pub type ArgSerializer = Arc<dyn Fn(&Invocation) -> Value + Send + Sync>;

/// Wraps a synchronous closure returning a plain value into an [`Action`].
pub fn sync_action<F>(f: F) -> Action
where
    F: Fn(Invocation) -> Result<Value, ActionError> + Send + Sync + 'static,
{
    Arc::new(move |invocation| f(invocation).map(ActionOutput::Ready))
}

/// Wraps an async closure into an [`Action`] producing a deferred result.
pub fn async_action<F, Fut>(f: F) -> Action
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ActionError>> + Send + 'static,
{
    Arc::new(move |invocation| Ok(ActionOutput::Deferred(f(invocation).boxed())))
}

/// A shared, clonable handle onto a deferred result.
pub type SharedResult = Shared<BoxFuture<'static, Result<Value, ActionError>>>;

/// A unit result slot: already materialized, or still resolving.
#[derive(Clone)]
pub enum Materialized {
    Ready(Value),
    Deferred(SharedResult),
}

impl Materialized {
    /// Resolves the slot to its value, awaiting a deferred result.
    ///
    /// # Errors
    /// Propagates the rejection of a deferred result.
    pub async fn resolve(&self) -> Result<Value, ActionError> {
        match self {
            Self::Ready(value) => Ok(value.clone()),
            Self::Deferred(shared) => shared.clone().await,
        }
    }

    /// The value, when already materialized.
    #[must_use]
    pub const fn ready(&self) -> Option<&Value> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Deferred(_) => None,
        }
    }
}

impl fmt::Debug for Materialized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Deferred(_) => f.debug_tuple("Deferred").field(&"..").finish(),
        }
    }
}

/// Spawns a deferred result onto the ambient runtime and returns a shared
/// handle any number of dependents can await. The computation starts
/// immediately; a rejection is observed by every dependent but poisons
/// nothing else.
pub(crate) fn spawn_shared(fut: BoxFuture<'static, Result<Value, ActionError>>) -> SharedResult {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = tx.send(fut.await);
    });
    let recv: BoxFuture<'static, Result<Value, ActionError>> = Box::pin(async move {
        rx.await
            .unwrap_or_else(|_| Err(ActionError::new("deferred result dropped before resolving")))
    });
    recv.shared()
}
