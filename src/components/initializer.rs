use async_trait::async_trait;

use crate::context::Context;
use crate::error::BoxError;
use crate::wiring::Wire;

/// # Startup step.
///
/// Initializers run sequentially on the supervisor task, each after its fields were
/// wired. The context an initializer returns becomes the parent of every later
/// initializer and of all runnables.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use appvisor::{BoxError, Context, Initializer, Wire, register};
///
/// pub trait Logger: Send + Sync { fn log(&self, line: &str); }
/// struct Stdout;
/// impl Logger for Stdout { fn log(&self, line: &str) { println!("{line}"); } }
///
/// #[derive(Default, Wire)]
/// struct LoggerInit {
///     #[config("LOG_PREFIX", default = "app")]
///     prefix: String,
/// }
///
/// #[async_trait]
/// impl Initializer for LoggerInit {
///     async fn initialize(&mut self, ctx: Context) -> Result<Context, BoxError> {
///         register!(dyn Logger, "", Stdout);
///         Ok(ctx.with_value(self.prefix.clone()))
///     }
/// }
/// ```
#[async_trait]
pub trait Initializer: Wire + Send + Sync + 'static {
    /// Performs the step and returns the context for everything that follows.
    async fn initialize(&mut self, ctx: Context) -> Result<Context, BoxError>;

    /// Releases resources after every runnable exited.
    ///
    /// Only called when `initialize` succeeded.
    async fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Name used in reports, logs and errors; the type name by default.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
