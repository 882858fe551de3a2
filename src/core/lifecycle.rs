//! # Application lifecycle state.
//!
//! ```text
//! Configured ──► Initializing ──► Running ──► Draining ──► Terminated
//!                     │                                       ▲
//!                     └──────────► Failed ────────────────────┘
//! ```
//!
//! - `Configured → Initializing` when the app starts.
//! - `Initializing → Failed` when wiring, an initializer or the introspector fails.
//! - `Initializing → Running` once every runnable was spawned.
//! - `Running → Draining` when the root context is cancelled or any runnable returns.
//! - `Draining → Terminated` once every runnable exited and `close` hooks ran.

use std::fmt;

use tokio::sync::watch;

/// Supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Built, not started.
    Configured,
    /// Running initializers, wiring runnables, calling the introspector.
    Initializing,
    /// Startup failed; cleanup in progress.
    Failed,
    /// Runnables are spawned.
    Running,
    /// Cancellation was requested; waiting for runnables to exit.
    Draining,
    /// Everything exited. Final.
    Terminated,
}

impl Lifecycle {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Lifecycle::Configured => "configured",
            Lifecycle::Initializing => "initializing",
            Lifecycle::Failed => "failed",
            Lifecycle::Running => "running",
            Lifecycle::Draining => "draining",
            Lifecycle::Terminated => "terminated",
        }
    }

    /// Returns true for states the app cannot return to `Running` from.
    pub fn is_past_running(&self) -> bool {
        matches!(
            self,
            Lifecycle::Failed | Lifecycle::Draining | Lifecycle::Terminated
        )
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Observable lifecycle cell shared by the supervisor and its handle.
#[derive(Debug)]
pub(crate) struct StateCell {
    tx: watch::Sender<Lifecycle>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(Lifecycle::Configured);
        Self { tx }
    }

    pub(crate) fn get(&self) -> Lifecycle {
        *self.tx.borrow()
    }

    pub(crate) fn set(&self, next: Lifecycle) {
        let prev = self.tx.send_replace(next);
        if prev != next {
            tracing::info!(state = ?next, previous = ?prev, "lifecycle transition");
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Lifecycle> {
        self.tx.subscribe()
    }
}
