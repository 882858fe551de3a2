use async_trait::async_trait;

use crate::context::Context;
use crate::error::BoxError;
use crate::wiring::Wire;

/// # Long-lived, cancelable worker.
///
/// `run` is expected to block for the worker's lifetime and return promptly once
/// `ctx` is cancelled. Returning (with or without error) cancels the siblings.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use appvisor::{BoxError, Context, Runnable, Wire};
///
/// #[derive(Default, Wire)]
/// struct Ticker {
///     #[config("TICK", default = "250ms")]
///     every: Duration,
/// }
///
/// #[async_trait]
/// impl Runnable for Ticker {
///     async fn run(&self, ctx: Context) -> Result<(), BoxError> {
///         loop {
///             tokio::select! {
///                 _ = ctx.cancelled() => return Ok(()),
///                 _ = tokio::time::sleep(self.every) => {}
///             }
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Runnable: Wire + Send + Sync + 'static {
    /// Executes until completion or cancellation.
    async fn run(&self, ctx: Context) -> Result<(), BoxError>;

    /// Short, side-effect-free probe; `Ok` means ready. Ready by default.
    async fn is_ready(&self, _ctx: &Context) -> Result<(), BoxError> {
        Ok(())
    }

    /// Releases resources after every runnable exited.
    async fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Name used in reports, logs and errors; the type name by default.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
