//! Runtime core: orchestration and lifecycle.
//!
//! The only public item from this module is [`Lifecycle`]; the facade
//! ([`App`](crate::App), [`RunningApp`](crate::RunningApp)) drives the rest.
//!
//! Internal modules:
//! - [`supervisor`]: startup ordering, spawning, draining, cleanup;
//! - [`runner`]: runs one runnable (panic-safe) and one close hook;
//! - [`readiness`]: aggregate readiness polling;
//! - [`lifecycle`]: the observable state machine;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod lifecycle;
pub(crate) mod readiness;
pub(crate) mod runner;
pub(crate) mod shutdown;
pub(crate) mod supervisor;

pub use lifecycle::Lifecycle;
