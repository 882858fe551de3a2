//! # Cross-platform OS signal handling for [`App::run`](crate::App::run).
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT`
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! [`ShutdownSignals::install`] registers the listeners eagerly; a registration
//! failure aborts `App::run` before startup.

use tokio::task::JoinHandle;
use tracing::info;

use crate::context::Context;

/// Registered termination-signal listeners.
pub(crate) struct ShutdownSignals {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigquit: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    /// Registers the listeners.
    #[cfg(unix)]
    pub(crate) fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    /// Registers the listeners.
    #[cfg(not(unix))]
    pub(crate) fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Completes on the first termination signal.
    #[cfg(unix)]
    pub(crate) async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigint.recv()  => info!(signal = "SIGINT", "shutdown requested"),
            _ = self.sigterm.recv() => info!(signal = "SIGTERM", "shutdown requested"),
            _ = self.sigquit.recv() => info!(signal = "SIGQUIT", "shutdown requested"),
        }
    }

    /// Completes on the first termination signal.
    #[cfg(not(unix))]
    pub(crate) async fn recv(&mut self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!(signal = "ctrl_c", "shutdown requested"),
            Err(e) => {
                tracing::warn!(error = %e, "ctrl_c listener failed");
                std::future::pending::<()>().await;
            }
        }
    }

    /// Cancels `root` on the first signal; stops listening once `root` is cancelled.
    pub(crate) fn cancel_on_signal(mut self, root: Context) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                _ = self.recv() => root.cancel(),
                _ = root.cancelled() => {}
            }
        })
    }
}
