//! Error types used by the appvisor runtime and its components.
//!
//! This module defines three error enums:
//!
//! - [`ContainerError`]: failures of the dependency container itself.
//! - [`WireError`]: failures while populating a component's marked fields.
//! - [`AppError`]: everything surfaced from [`App::run`](crate::App::run) and
//!   [`RunningApp::wait`](crate::RunningApp::wait), tagged with the failing phase and component.
//!
//! All of them provide `as_label` (stable snake_case, for logs/metrics).
//! Component code reports failures as [`BoxError`].

use std::time::Duration;
use thiserror::Error;

use crate::core::Lifecycle;
use crate::introspect::Caller;

/// Boxed error returned by initializers, runnables, introspectors and `close` hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by the dependency container.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// No binding exists for the requested `(abstraction, name)` key.
    #[error("no binding for {abstraction} (name={name:?})")]
    DependencyNotFound {
        /// Type name of the requested abstraction.
        abstraction: &'static str,
        /// Binding name (empty = default binding).
        name: String,
    },

    /// The stored value does not satisfy the abstraction of its key.
    #[error("value of type {found} cannot be bound as {abstraction} (name={name:?})")]
    InvalidBinding {
        /// Type name of the abstraction of the key.
        abstraction: &'static str,
        /// Binding name (empty = default binding).
        name: String,
        /// What was offered instead.
        found: String,
    },
}

impl ContainerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ContainerError::DependencyNotFound { .. } => "dependency_not_found",
            ContainerError::InvalidBinding { .. } => "invalid_binding",
        }
    }
}

/// # Errors produced while wiring a component.
///
/// Every variant carries the [`Caller`] of the field that failed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A `#[resolve]` field has no binding in the container.
    #[error("unsatisfied dependency {abstraction} (name={name:?}) at {caller}")]
    UnsatisfiedDependency {
        /// Type name of the requested abstraction.
        abstraction: &'static str,
        /// Binding name (empty = default binding).
        name: String,
        /// Field declaration that asked for it.
        caller: Caller,
    },

    /// A `#[config]` field found no provider value and declares no default.
    #[error("missing config {key:?} at {caller}")]
    MissingConfig {
        /// Configuration key.
        key: String,
        /// Field declaration that asked for it.
        caller: Caller,
    },

    /// A provider value or declared default could not be coerced to the field type.
    #[error("config {key:?}: cannot parse {value:?} as {target}: {reason}")]
    ConfigParse {
        /// Configuration key.
        key: String,
        /// Raw textual value.
        value: String,
        /// Name of the target type.
        target: &'static str,
        /// Parser message.
        reason: String,
        /// Field declaration that asked for it.
        caller: Caller,
    },
}

impl WireError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            WireError::UnsatisfiedDependency { .. } => "unsatisfied_dependency",
            WireError::MissingConfig { .. } => "missing_config",
            WireError::ConfigParse { .. } => "config_parse_error",
        }
    }

    /// Call site of the field that failed.
    pub fn caller(&self) -> &Caller {
        match self {
            WireError::UnsatisfiedDependency { caller, .. }
            | WireError::MissingConfig { caller, .. }
            | WireError::ConfigParse { caller, .. } => caller,
        }
    }
}

/// Startup phase in which a component was being wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Wiring an initializer, right before its `initialize`.
    Initialize,
    /// Wiring a runnable, after all initializers completed.
    Run,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Initialize => f.write_str("initialize"),
            Phase::Run => f.write_str("run"),
        }
    }
}

/// # Errors surfaced by an application run.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AppError {
    /// Wiring a component failed; startup aborted.
    #[error("phase={phase}: wiring {component} failed: {source}")]
    Wire {
        /// Phase in which the component was being wired.
        phase: Phase,
        /// Component type name.
        component: &'static str,
        /// Underlying wiring failure.
        #[source]
        source: WireError,
    },

    /// An initializer returned an error; later initializers and all runnables were skipped.
    #[error("phase=initialize: {component} failed: {source}")]
    Initializer {
        /// Component type name.
        component: &'static str,
        /// Error returned by `initialize`.
        #[source]
        source: BoxError,
    },

    /// The introspector callback returned an error; no runnable was spawned.
    #[error("phase=introspect: introspector failed: {source}")]
    Introspector {
        /// Error returned by `introspect`.
        #[source]
        source: BoxError,
    },

    /// A runnable returned an error; the application was shut down.
    #[error("phase=run: {component} failed: {source}")]
    Runnable {
        /// Component type name.
        component: &'static str,
        /// Error returned by `run`.
        #[source]
        source: BoxError,
    },

    /// `wait_for_readiness` deadline elapsed.
    #[error("not ready after {timeout:?}; pending: {pending:?}")]
    ReadinessTimeout {
        /// The deadline that elapsed.
        timeout: Duration,
        /// Components whose probe was still failing (or the lifecycle state if not yet running).
        pending: Vec<String>,
    },

    /// Readiness was requested from an application that is no longer (or never got) running.
    #[error("application is not running (state={state:?})")]
    NotRunning {
        /// Lifecycle state observed.
        state: Lifecycle,
    },

    /// A `close` hook failed or exceeded its timeout.
    #[error("phase=close: {component} failed: {source}")]
    Close {
        /// Component type name.
        component: &'static str,
        /// Error returned by `close`.
        #[source]
        source: BoxError,
    },

    /// Installing the OS signal handlers failed.
    #[error("signal handler registration failed: {0}")]
    Signal(#[from] std::io::Error),

    /// Building the tokio runtime for [`App::run_blocking`](crate::App::run_blocking) failed.
    #[error("runtime construction failed: {source}")]
    Runtime {
        /// I/O error from the runtime builder.
        #[source]
        source: std::io::Error,
    },

    /// The supervisor task itself panicked or was aborted.
    #[error("supervisor aborted: {message}")]
    Panicked {
        /// Panic payload or join error text.
        message: String,
    },
}

impl AppError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use appvisor::AppError;
    /// use std::time::Duration;
    ///
    /// let err = AppError::ReadinessTimeout { timeout: Duration::from_secs(1), pending: vec![] };
    /// assert_eq!(err.as_label(), "readiness_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AppError::Wire { source, .. } => source.as_label(),
            AppError::Initializer { .. } => "initializer_failure",
            AppError::Introspector { .. } => "introspector_failure",
            AppError::Runnable { .. } => "runnable_failure",
            AppError::ReadinessTimeout { .. } => "readiness_timeout",
            AppError::NotRunning { .. } => "not_running",
            AppError::Close { .. } => "close_failure",
            AppError::Signal(_) => "signal_registration",
            AppError::Runtime { .. } => "runtime_build",
            AppError::Panicked { .. } => "supervisor_panicked",
        }
    }

    /// Component type name this error is attributed to, when there is one.
    pub fn component(&self) -> Option<&'static str> {
        match self {
            AppError::Wire { component, .. }
            | AppError::Initializer { component, .. }
            | AppError::Runnable { component, .. }
            | AppError::Close { component, .. } => Some(component),
            _ => None,
        }
    }

    /// Returns the wiring failure, if this error is one.
    pub fn as_wire(&self) -> Option<&WireError> {
        match self {
            AppError::Wire { source, .. } => Some(source),
            _ => None,
        }
    }
}
