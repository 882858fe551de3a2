//! # Execution context threaded through every lifecycle call.
//!
//! A [`Context`] couples a [`CancellationToken`] with an immutable, type-keyed
//! value map. Initializers enrich it with [`Context::with_value`] and hand the
//! result to the next component; the supervisor derives the runnables' scope from
//! the context returned by the last initializer.
//!
//! ## Rules
//! - Clones share the token and the values.
//! - [`Context::child`] derives a token: cancelling the parent cancels the child,
//!   never the other way round.
//! - [`Context::with_value`] keeps the token and adds (or shadows) one value.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

type Values = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Cancellation scope plus request-scoped values.
///
/// # Example
/// ```
/// use appvisor::Context;
///
/// #[derive(Debug, PartialEq)]
/// struct Region(&'static str);
///
/// let root = Context::background();
/// let enriched = root.with_value(Region("eu-west-1"));
/// assert_eq!(enriched.value::<Region>(), Some(&Region("eu-west-1")));
///
/// let child = enriched.child();
/// enriched.cancel();
/// assert!(child.is_cancelled());
/// ```
#[derive(Clone, Default)]
pub struct Context {
    token: CancellationToken,
    values: Arc<Values>,
}

impl Context {
    /// A fresh, never-cancelled root context without values.
    pub fn background() -> Self {
        Self::default()
    }

    /// Wraps an existing token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            values: Arc::default(),
        }
    }

    /// Derived context: same values, child cancellation token.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            values: Arc::clone(&self.values),
        }
    }

    /// Same token, with `value` added (replacing a previous value of the same type).
    pub fn with_value<T: Send + Sync + 'static>(&self, value: T) -> Self {
        let mut values: Values = (*self.values).clone();
        values.insert(TypeId::of::<T>(), Arc::new(value));
        Self {
            token: self.token.clone(),
            values: Arc::new(values),
        }
    }

    /// Returns the value of type `T`, if one was added.
    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// Cancels this context and everything derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the context is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Underlying token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .field("values", &self.values.len())
            .finish()
    }
}
