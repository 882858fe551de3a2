//! # Introspector callback.
//!
//! An [`Introspector`] receives the [`Report`] exactly once per run: after every
//! initializer succeeded and every runnable was wired, before any runnable starts.
//! Returning an error aborts startup.

use async_trait::async_trait;

use crate::context::Context;
use crate::error::BoxError;

use super::report::Report;

/// Terminal hook over the pre-start report.
///
/// Typical uses: logging the report, writing the dependency graph, serving it
/// from a debug endpoint.
///
/// # Example
/// ```
/// use appvisor::{BoxError, Context, Introspector, Report};
/// use async_trait::async_trait;
///
/// struct CountDeps;
///
/// #[async_trait]
/// impl Introspector for CountDeps {
///     async fn introspect(&self, _ctx: &Context, report: &Report) -> Result<(), BoxError> {
///         println!("{} container events", report.deps.len());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Introspector: Send + Sync + 'static {
    /// Inspects the report; an error aborts startup.
    async fn introspect(&self, ctx: &Context, report: &Report) -> Result<(), BoxError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
