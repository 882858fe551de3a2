//! # Run one runnable, run one close hook.
//!
//! ```text
//! run_one:
//!   ComponentScope(<name>, "run") ─► runnable.run(ctx) ─► catch_unwind
//!       Ok(())        → exited cleanly
//!       Err(e)        → RunnableFailure
//!       panic(msg)    → RunnableFailure("panicked: msg")
//!
//! close_one:
//!   ComponentScope(<name>, "close") ─► close() ─► optional timeout
//! ```
//!
//! ## Rules
//! - Panics never escape a runnable task.
//! - A close hook that exceeds the timeout is reported as a close failure.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::components::{Initializer, Runnable};
use crate::context::Context;
use crate::error::{AppError, BoxError};
use crate::introspect::ComponentScope;

/// Exit of one runnable task.
pub(crate) struct Exit {
    pub position: usize,
    pub component: &'static str,
    pub result: Result<(), BoxError>,
}

/// Runs `runnable` to completion inside its component scope.
pub(crate) async fn run_one(position: usize, runnable: Arc<dyn Runnable>, ctx: Context) -> Exit {
    let component = runnable.name();
    debug!(component, position, "runnable started");

    let fut = ComponentScope::new(component, "run").enter(runnable.run(ctx));
    let result = match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref())).into()),
    };

    match &result {
        Ok(()) => debug!(component, position, "runnable exited"),
        Err(e) => warn!(component, position, error = %e, "runnable failed"),
    }
    Exit {
        position,
        component,
        result,
    }
}

/// Component that owns a `close` hook.
pub(crate) enum Closable {
    Initializer(Box<dyn Initializer>),
    Runnable(Arc<dyn Runnable>),
}

impl Closable {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Closable::Initializer(i) => i.name(),
            Closable::Runnable(r) => r.name(),
        }
    }

    async fn close(&self) -> Result<(), BoxError> {
        match self {
            Closable::Initializer(i) => i.close().await,
            Closable::Runnable(r) => r.close().await,
        }
    }
}

/// Calls the close hook of `component`, bounded by `timeout` when set.
pub(crate) async fn close_one(
    component: &Closable,
    timeout: Option<Duration>,
) -> Result<(), AppError> {
    let name = component.name();
    let fut = ComponentScope::new(name, "close").enter(component.close());

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(r) => r,
            Err(_elapsed) => Err(format!("close did not finish within {limit:?}").into()),
        },
        None => fut.await,
    };

    result.map_err(|source| {
        warn!(component = name, error = %source, "close failed");
        AppError::Close {
            component: name,
            source,
        }
    })
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
