//! # Closure-backed components (`RunnableFn`, `InitializerFn`)
//!
//! [`RunnableFn`] wraps `F: Fn(Context) -> Fut`; [`InitializerFn`] wraps
//! `F: FnMut(Context) -> Fut` returning the next context. Neither has marked
//! fields, so wiring is a no-op; capture shared state with `Arc` explicitly.
//!
//! ## Example
//! ```rust
//! use appvisor::{BoxError, Context, Runnable, RunnableFn};
//!
//! let worker = RunnableFn::new("worker", |ctx: Context| async move {
//!     ctx.cancelled().await;
//!     Ok::<_, BoxError>(())
//! });
//! assert_eq!(worker.name(), "worker");
//! ```

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

use crate::components::{Initializer, Runnable};
use crate::context::Context;
use crate::error::{BoxError, WireError};
use crate::wiring::{Wire, Wirer};

/// Function-backed runnable. Each `run` creates a fresh future.
pub struct RunnableFn<F> {
    name: &'static str,
    f: F,
}

impl<F> RunnableFn<F> {
    /// Creates a new function-backed runnable.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> fmt::Debug for RunnableFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnableFn").field("name", &self.name).finish()
    }
}

impl<F> Wire for RunnableFn<F> {
    fn wire(&mut self, _wirer: &Wirer<'_>) -> Result<(), WireError> {
        Ok(())
    }
}

#[async_trait]
impl<F, Fut> Runnable for RunnableFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn run(&self, ctx: Context) -> Result<(), BoxError> {
        (self.f)(ctx).await
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Function-backed initializer.
pub struct InitializerFn<F> {
    name: &'static str,
    f: F,
}

impl<F> InitializerFn<F> {
    /// Creates a new function-backed initializer.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> fmt::Debug for InitializerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializerFn")
            .field("name", &self.name)
            .finish()
    }
}

impl<F> Wire for InitializerFn<F> {
    fn wire(&mut self, _wirer: &Wirer<'_>) -> Result<(), WireError> {
        Ok(())
    }
}

#[async_trait]
impl<F, Fut> Initializer for InitializerFn<F>
where
    F: FnMut(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Context, BoxError>> + Send + 'static,
{
    async fn initialize(&mut self, ctx: Context) -> Result<Context, BoxError> {
        (self.f)(ctx).await
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
