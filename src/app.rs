//! # Application facade.
//!
//! [`App`] collects initializers, runnables, an optional introspector and the
//! configuration providers, then hands them to the supervisor.
//!
//! ```text
//! App::new()
//!   .with_provider(..)*       (none → [EnvProvider])
//!   .with_initializer(..)*    declaration order = initialization order
//!   .with_runnable(..)*       spawned concurrently
//!   .with_introspector(..)?   called once, before the first runnable
//!
//! run()            root = fresh context, cancelled by SIGINT/SIGTERM/SIGQUIT (cfg.handle_signals)
//! run_blocking()   same, on a new multi-thread tokio runtime
//! run_async(&ctx)  root = ctx.child(); returns RunningApp immediately
//! ```
//!
//! ## Example
//! ```
//! use std::time::Duration;
//! use appvisor::{App, BoxError, Context, RunnableFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let parent = Context::background();
//!     let app = App::new()
//!         .with_runnable(RunnableFn::new("idle", |ctx: Context| async move {
//!             ctx.cancelled().await;
//!             Ok::<_, BoxError>(())
//!         }))
//!         .run_async(&parent);
//!
//!     app.wait_for_readiness(&parent, Duration::from_secs(1)).await?;
//!     parent.cancel();
//!     app.wait().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::components::{Initializer, Runnable};
use crate::config::AppConfig;
use crate::container::Container;
use crate::context::Context;
use crate::core::Lifecycle;
use crate::core::readiness;
use crate::core::runner::panic_message;
use crate::core::shutdown::ShutdownSignals;
use crate::core::supervisor::{Registered, Shared, Supervisor};
use crate::error::AppError;
use crate::introspect::Introspector;
use crate::provider::{ConfigProvider, EnvProvider, ProviderChain};

/// Builder for one application run.
pub struct App {
    cfg: AppConfig,
    providers: ProviderChain,
    initializers: Vec<Registered<dyn Initializer>>,
    runnables: Vec<Registered<dyn Runnable>>,
    introspector: Option<Arc<dyn Introspector>>,
    seq: u64,
}

impl App {
    /// Empty application with [`AppConfig::default`].
    pub fn new() -> Self {
        Self {
            cfg: AppConfig::default(),
            providers: ProviderChain::new(),
            initializers: Vec::new(),
            runnables: Vec::new(),
            introspector: None,
            seq: 0,
        }
    }

    /// Replaces the runtime settings.
    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Appends a configuration provider; earlier providers take precedence.
    pub fn with_provider<P: ConfigProvider>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Appends an initializer.
    pub fn with_initializer<I: Initializer>(mut self, initializer: I) -> Self {
        let seq = self.next_seq();
        self.initializers.push(Registered {
            seq,
            component: Box::new(initializer),
        });
        self
    }

    /// Appends a runnable.
    pub fn with_runnable<R: Runnable>(mut self, runnable: R) -> Self {
        let seq = self.next_seq();
        self.runnables.push(Registered {
            seq,
            component: Box::new(runnable),
        });
        self
    }

    /// Sets the introspector, replacing a previous one.
    pub fn with_introspector<I: Introspector>(mut self, introspector: I) -> Self {
        self.introspector = Some(Arc::new(introspector));
        self
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Runs until every runnable exited.
    ///
    /// The root context is fresh and, when [`AppConfig::handle_signals`] is set,
    /// cancelled by the first SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows). Otherwise
    /// the app only stops when a runnable returns.
    ///
    /// # Errors
    /// The first failure of the run; see [`AppError`].
    pub async fn run(self) -> Result<(), AppError> {
        let root = Context::background();
        let listener = if self.cfg.handle_signals {
            Some(ShutdownSignals::install()?.cancel_on_signal(root.clone()))
        } else {
            None
        };

        let result = self.run_async(&root).wait().await;

        if let Some(listener) = listener {
            listener.abort();
        }
        result
    }

    /// [`App::run`] on a dedicated multi-thread tokio runtime.
    ///
    /// # Errors
    /// [`AppError::Runtime`] if the runtime cannot be built, otherwise as [`App::run`].
    pub fn run_blocking(self) -> Result<(), AppError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|source| AppError::Runtime { source })?;
        runtime.block_on(self.run())
    }

    /// Starts the app under a child of `parent` and returns immediately.
    ///
    /// Cancelling `parent` (or calling [`RunningApp::cancel`]) starts the shutdown.
    /// No OS signal handler is installed.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn run_async(self, parent: &Context) -> RunningApp {
        let root = parent.child();
        let shared = Arc::new(Shared::new());
        let poll = self.cfg.readiness_poll();

        let providers = if self.providers.is_empty() {
            ProviderChain::new().with(EnvProvider::new())
        } else {
            self.providers
        };
        info!(
            initializers = self.initializers.len(),
            runnables = self.runnables.len(),
            providers = providers.len(),
            "starting application"
        );

        let supervisor = Supervisor {
            cfg: self.cfg,
            container: Container::global(),
            providers,
            initializers: self.initializers,
            runnables: self.runnables,
            introspector: self.introspector,
            shared: Arc::clone(&shared),
        };
        let handle = tokio::spawn(supervisor.run(root.clone()));

        RunningApp {
            root,
            shared,
            poll,
            handle,
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle of an app started with [`App::run_async`].
pub struct RunningApp {
    root: Context,
    shared: Arc<Shared>,
    poll: Duration,
    handle: JoinHandle<Result<(), AppError>>,
}

impl RunningApp {
    /// Waits until the app fully drained and returns its final result.
    ///
    /// `Ok` when every runnable exited cleanly and every `close` succeeded;
    /// otherwise the first runnable error, or the first close error.
    ///
    /// # Errors
    /// See [`AppError`].
    pub async fn wait(self) -> Result<(), AppError> {
        match self.handle.await {
            Ok(result) => result,
            Err(join_err) => {
                self.root.cancel();
                self.shared.state.set(Lifecycle::Terminated);
                let message = if join_err.is_panic() {
                    panic_message(join_err.into_panic().as_ref())
                } else {
                    join_err.to_string()
                };
                Err(AppError::Panicked { message })
            }
        }
    }

    /// Cancels the root context of the app.
    pub fn cancel(&self) {
        self.root.cancel();
    }

    /// [`RunningApp::cancel`] followed by [`RunningApp::wait`].
    ///
    /// # Errors
    /// See [`RunningApp::wait`].
    pub async fn shutdown(self) -> Result<(), AppError> {
        self.cancel();
        self.wait().await
    }

    /// Current lifecycle state.
    pub fn state(&self) -> Lifecycle {
        self.shared.state.get()
    }

    /// Receiver notified on every lifecycle transition.
    pub fn watch_state(&self) -> watch::Receiver<Lifecycle> {
        self.shared.state.subscribe()
    }

    /// Returns once the app is running and every readiness probe succeeds.
    ///
    /// Probes get `ctx`; cancelling it gives up early. Does not shut the app down.
    ///
    /// # Errors
    /// [`AppError::ReadinessTimeout`] when `timeout` elapses (or `ctx` is cancelled),
    /// [`AppError::NotRunning`] once the app is failing, draining or terminated.
    pub async fn wait_for_readiness(&self, ctx: &Context, timeout: Duration) -> Result<(), AppError> {
        readiness::wait_for_readiness(&self.shared, ctx, timeout, self.poll).await
    }
}
