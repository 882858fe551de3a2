//! # Call-site attribution for recorded events.
//!
//! A [`Caller`] is built from a [`std::panic::Location`] obtained through
//! `#[track_caller]` on every framework entry point that user code reaches
//! (`Container::register`, `Container::resolve`, the `Wirer` methods emitted by
//! `#[derive(Wire)]`). Attribution therefore lands on the user's statement or
//! field declaration, never on framework internals.
//!
//! The function-qualified name cannot be read from a `Location`; it is taken from
//! the component scope the supervisor installs around each lifecycle call
//! (`<component>::initialize`, `<component>::run`, ...). Outside any scope it is empty.

use std::fmt;
use std::future::Future;
use std::panic::Location;

use serde::{Deserialize, Serialize};

tokio::task_local! {
    static SCOPE: ComponentScope;
}

/// Component and lifecycle operation currently executing on this task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ComponentScope {
    pub component: &'static str,
    pub operation: &'static str,
}

impl ComponentScope {
    pub(crate) fn new(component: &'static str, operation: &'static str) -> Self {
        Self {
            component,
            operation,
        }
    }

    /// Returns the scope of the current task, if any.
    pub(crate) fn current() -> Option<Self> {
        SCOPE.try_with(|s| *s).ok()
    }

    /// Runs `fut` with this scope installed as the task-local component scope.
    pub(crate) async fn enter<F: Future>(self, fut: F) -> F::Output {
        SCOPE.scope(self, fut).await
    }

    fn function(&self) -> String {
        format!("{}::{}", self.component, self.operation)
    }
}

/// Source location an event is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    /// `<component>::<operation>` of the enclosing lifecycle call; empty when unknown.
    pub function: String,
    /// Source file of the call site.
    pub file: String,
    /// Line of the call site.
    pub line: u32,
}

impl Caller {
    /// Builds a caller from explicit parts.
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }

    /// Captures the location of the (track_caller-propagated) call site.
    ///
    /// The function name comes from the current component scope.
    #[track_caller]
    pub fn here() -> Self {
        Self::at(Location::caller())
    }

    pub(crate) fn at(location: &'static Location<'static>) -> Self {
        let function = ComponentScope::current()
            .map(|s| s.function())
            .unwrap_or_default();
        Self::new(function, location.file(), location.line())
    }

    pub(crate) fn in_scope(scope: ComponentScope, location: &'static Location<'static>) -> Self {
        Self::new(scope.function(), location.file(), location.line())
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.function.is_empty() {
            write!(f, "{}:{}", self.file, self.line)
        } else {
            write!(f, "{} ({}:{})", self.function, self.file, self.line)
        }
    }
}
