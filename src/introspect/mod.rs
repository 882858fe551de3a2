//! Introspection: event recorder, report model and the introspector callback.
//!
//! ## Contents
//! - [`Recorder`] append-only, order-stamped log of container and config events
//! - [`Report`] and its entries, serializable with stable field names
//! - [`Caller`] call-site attribution
//! - [`Introspector`] the pre-start callback, and [`LogIntrospector`]
//!
//! ## Quick reference
//! - **Writers**: `Container::register`/`resolve`, `Wirer::config`, the supervisor
//!   (component descriptors).
//! - **Readers**: the supervisor hands `Recorder::report()` to the introspector
//!   after the last initializer and before the first runnable.

mod caller;
mod introspector;
mod log;
mod recorder;
mod report;

pub(crate) use caller::ComponentScope;
pub(crate) use recorder::Role;

pub use caller::Caller;
pub use introspector::Introspector;
pub use log::{LogFormat, LogIntrospector};
pub use recorder::Recorder;
pub use report::{
    ComponentDescriptor, ConfigAccess, DependencyEvent, DependencyKind, Report, ReportEvent,
};
