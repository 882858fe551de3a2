//! # Supervisor: startup ordering, parallel runnables, shutdown and cleanup.
//!
//! The [`Supervisor`] owns the components of one application run. It wires and
//! initializes them in declaration order, hands the report to the introspector,
//! spawns every runnable under the context the last initializer returned and
//! drains them. Draining cancels that context, so anything an initializer tied to
//! it stops as well.
//!
//! ## High-level flow
//! ```text
//! Supervisor::run(parent)
//!   recorder.reset(); record component descriptors
//!
//! Initialize (sequential, on this task):
//!   for init in initializers:
//!       init.wire(Wirer)                                 ─► AppError::Wire { phase: Initialize }
//!       ctx = init.initialize(ctx)  in scope <init>::initialize ─► AppError::Initializer
//!
//! Prepare:
//!   for r in runnables: r.wire(Wirer)                    ─► AppError::Wire { phase: Run }
//!   introspector.introspect(ctx, recorder.report())      ─► AppError::Introspector
//!   (any failure above: state Failed, close initialized initializers, state Terminated)
//!
//! Run:
//!   JoinSet ◄── run_one(r, ctx.clone())  for every runnable        state Running
//!   first of { ctx cancelled, any runnable exits } ─► ctx.cancel()  state Draining
//!   join every runnable, keep the first error; ctx is cancelled afterwards
//!
//! Cleanup:
//!   close() in reverse registration order (initializers and runnables interleaved)
//!   state Terminated
//!   result = first runnable error, else first close error, else Ok
//! ```

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::components::{Initializer, Runnable};
use crate::config::AppConfig;
use crate::container::Container;
use crate::context::Context;
use crate::core::lifecycle::{Lifecycle, StateCell};
use crate::core::runner::{Closable, Exit, close_one, run_one};
use crate::error::{AppError, Phase};
use crate::introspect::{ComponentScope, Introspector, Role};
use crate::provider::ProviderChain;
use crate::wiring::Wirer;

/// State observed by the [`RunningApp`](crate::RunningApp) handle.
pub(crate) struct Shared {
    pub state: StateCell,
    /// Spawned runnables, set right before entering `Running`.
    pub runnables: OnceCell<Vec<Arc<dyn Runnable>>>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            state: StateCell::new(),
            runnables: OnceCell::new(),
        }
    }
}

/// Component plus its registration sequence number.
pub(crate) struct Registered<T: ?Sized> {
    pub seq: u64,
    pub component: Box<T>,
}

/// Drives one application run.
pub(crate) struct Supervisor {
    pub cfg: AppConfig,
    pub container: &'static Container,
    pub providers: ProviderChain,
    pub initializers: Vec<Registered<dyn Initializer>>,
    pub runnables: Vec<Registered<dyn Runnable>>,
    pub introspector: Option<Arc<dyn Introspector>>,
    pub shared: Arc<Shared>,
}

impl Supervisor {
    /// Runs the application under `parent` until every runnable exited.
    pub(crate) async fn run(self, parent: Context) -> Result<(), AppError> {
        let Supervisor {
            cfg,
            container,
            providers,
            initializers,
            runnables,
            introspector,
            shared,
        } = self;

        shared.state.set(Lifecycle::Initializing);
        let recorder = container.recorder();
        recorder.reset();
        for (position, init) in initializers.iter().enumerate() {
            recorder.record_component(Role::Initializer, init.component.name(), position);
        }
        for (position, r) in runnables.iter().enumerate() {
            recorder.record_component(Role::Runner, r.component.name(), position);
        }

        let mut closables: Vec<(u64, Closable)> = Vec::new();

        let started = async {
            let ctx = initialize(container, &providers, initializers, &mut closables, parent).await?;
            let runnables = wire_runnables(container, &providers, runnables)?;
            if let Some(introspector) = &introspector {
                let report = recorder.report();
                debug!(introspector = introspector.name(), events = report.events().len(), "introspecting");
                introspector
                    .introspect(&ctx, &report)
                    .await
                    .map_err(|source| AppError::Introspector { source })?;
            }
            Ok::<_, AppError>((ctx, runnables))
        }
        .await;

        let (ctx, runnables) = match started {
            Ok(ready) => ready,
            Err(err) => {
                error!(error = %err, label = err.as_label(), "startup failed");
                shared.state.set(Lifecycle::Failed);
                if let Some(close_err) = close_all(closables, &cfg).await {
                    warn!(error = %close_err, "close failed after startup failure");
                }
                shared.state.set(Lifecycle::Terminated);
                return Err(err);
            }
        };

        let mut set: JoinSet<Exit> = JoinSet::new();
        let mut spawned = Vec::with_capacity(runnables.len());
        for (position, (seq, runnable)) in runnables.into_iter().enumerate() {
            set.spawn(run_one(position, Arc::clone(&runnable), ctx.clone()));
            closables.push((seq, Closable::Runnable(Arc::clone(&runnable))));
            spawned.push(runnable);
        }
        let count = spawned.len();
        let _ = shared.runnables.set(spawned);
        shared.state.set(Lifecycle::Running);
        info!(runnables = count, "application running");

        let first_error = drain(&mut set, &ctx, &shared.state).await;

        let close_error = close_all(closables, &cfg).await;
        shared.state.set(Lifecycle::Terminated);

        match (first_error, close_error) {
            (Some(err), _) | (None, Some(err)) => Err(err),
            (None, None) => {
                info!("application terminated cleanly");
                Ok(())
            }
        }
    }
}

/// Wires and initializes every initializer in order, threading the context.
async fn initialize(
    container: &Container,
    providers: &ProviderChain,
    initializers: Vec<Registered<dyn Initializer>>,
    closables: &mut Vec<(u64, Closable)>,
    parent: Context,
) -> Result<Context, AppError> {
    let mut ctx = parent;
    for Registered { seq, mut component } in initializers {
        let name = component.name();
        component
            .wire(&Wirer::new(container, providers, name))
            .map_err(|source| AppError::Wire {
                phase: Phase::Initialize,
                component: name,
                source,
            })?;

        debug!(component = name, "initializing");
        ctx = ComponentScope::new(name, "initialize")
            .enter(component.initialize(ctx))
            .await
            .map_err(|source| AppError::Initializer {
                component: name,
                source,
            })?;
        closables.push((seq, Closable::Initializer(component)));
    }
    Ok(ctx)
}

/// Wires every runnable in order and makes them shareable across tasks.
fn wire_runnables(
    container: &Container,
    providers: &ProviderChain,
    runnables: Vec<Registered<dyn Runnable>>,
) -> Result<Vec<(u64, Arc<dyn Runnable>)>, AppError> {
    runnables
        .into_iter()
        .map(|Registered { seq, mut component }| {
            let name = component.name();
            component
                .wire(&Wirer::new(container, providers, name))
                .map_err(|source| AppError::Wire {
                    phase: Phase::Run,
                    component: name,
                    source,
                })?;
            Ok((seq, Arc::from(component)))
        })
        .collect()
}

/// Joins every runnable; the first exit or a cancelled `root` starts draining.
///
/// `root` is cancelled on the first exit and once every runnable has joined.
/// Returns the first runnable error observed.
async fn drain(set: &mut JoinSet<Exit>, root: &Context, state: &StateCell) -> Option<AppError> {
    let mut first_error: Option<AppError> = None;
    let mut draining = false;

    loop {
        tokio::select! {
            _ = root.cancelled(), if !draining => {
                draining = true;
                state.set(Lifecycle::Draining);
            }
            joined = set.join_next() => {
                let Some(joined) = joined else { break };
                let failure = match joined {
                    Ok(Exit { position, component, result }) => {
                        debug!(component, position, ok = result.is_ok(), "runnable joined");
                        result.err().map(|source| AppError::Runnable { component, source })
                    }
                    Err(join_err) => Some(AppError::Panicked { message: join_err.to_string() }),
                };
                if let Some(err) = failure {
                    if first_error.is_none() {
                        first_error = Some(err);
                    } else {
                        warn!(error = %err, "additional runnable failure");
                    }
                }
                if !draining {
                    draining = true;
                    state.set(Lifecycle::Draining);
                }
                root.cancel();
            }
        }
    }

    root.cancel();

    if !draining {
        state.set(Lifecycle::Draining);
    }
    first_error
}

/// Closes components in reverse registration order; returns the first failure.
async fn close_all(mut closables: Vec<(u64, Closable)>, cfg: &AppConfig) -> Option<AppError> {
    closables.sort_by(|a, b| b.0.cmp(&a.0));
    let mut first: Option<AppError> = None;
    for (_, component) in &closables {
        debug!(component = component.name(), "closing");
        if let Err(err) = close_one(component, cfg.close_timeout()).await {
            first.get_or_insert(err);
        }
    }
    first
}
