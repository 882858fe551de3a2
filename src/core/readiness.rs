//! # Aggregate readiness.
//!
//! ```text
//! wait_for_readiness(ctx, timeout):
//!   loop {
//!     state past Running            → NotRunning
//!     state == Running:
//!       probe every runnable (concurrently, is_ready(ctx))
//!       all Ok                      → Ok
//!     deadline reached / ctx done   → ReadinessTimeout { pending }
//!     sleep(poll)
//!   }
//! ```
//!
//! Runnables without a probe use the default `is_ready`, which is always ready.
//! A probe round is bounded by the deadline as well.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{Instant, sleep_until, timeout_at};

use crate::components::Runnable;
use crate::context::Context;
use crate::core::Lifecycle;
use crate::core::supervisor::Shared;
use crate::error::AppError;
use crate::introspect::ComponentScope;

/// Polls until the app is running and every probe succeeds, or `timeout` elapses.
pub(crate) async fn wait_for_readiness(
    shared: &Shared,
    ctx: &Context,
    timeout: Duration,
    poll: Duration,
) -> Result<(), AppError> {
    let deadline = Instant::now() + timeout;
    let mut pending: Vec<String> = Vec::new();

    loop {
        let state = shared.state.get();
        if state.is_past_running() {
            return Err(AppError::NotRunning { state });
        }

        match (state, shared.runnables.get()) {
            (Lifecycle::Running, Some(runnables)) => {
                match timeout_at(deadline, probe(runnables, ctx)).await {
                    Ok(failing) => pending = failing,
                    Err(_elapsed) => {
                        if pending.is_empty() {
                            pending = runnables.iter().map(|r| r.name().to_string()).collect();
                        }
                        return Err(AppError::ReadinessTimeout { timeout, pending });
                    }
                }
                if pending.is_empty() {
                    return match shared.state.get() {
                        Lifecycle::Running => Ok(()),
                        state => Err(AppError::NotRunning { state }),
                    };
                }
            }
            (state, _) => pending = vec![format!("state={state}")],
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(AppError::ReadinessTimeout { timeout, pending });
        }
        tokio::select! {
            _ = sleep_until((now + poll).min(deadline)) => {}
            _ = ctx.cancelled() => return Err(AppError::ReadinessTimeout { timeout, pending }),
        }
    }
}

/// Runs one probe round; returns `"<name>: <error>"` for every failing probe.
async fn probe(runnables: &[Arc<dyn Runnable>], ctx: &Context) -> Vec<String> {
    let rounds = runnables.iter().map(|r| async move {
        let name = r.name();
        ComponentScope::new(name, "is_ready")
            .enter(r.is_ready(ctx))
            .await
            .err()
            .map(|e| format!("{name}: {e}"))
    });
    join_all(rounds).await.into_iter().flatten().collect()
}
