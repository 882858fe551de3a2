//! # Component protocols.
//!
//! This module provides the contracts the supervisor drives:
//! - [`Initializer`] - runs once, in declaration order, and may enrich the context
//! - [`Runnable`] - long-lived worker, spawned concurrently with its siblings
//! - [`InitializerFn`] / [`RunnableFn`] - closure-backed implementations

mod fn_adapters;
mod initializer;
mod runnable;

pub use fn_adapters::{InitializerFn, RunnableFn};
pub use initializer::Initializer;
pub use runnable::Runnable;
