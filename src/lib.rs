//! # appvisor
//!
//! **Appvisor** is an application composition runtime for Rust services.
//!
//! It wires long-lived worker components together: a process-wide typed
//! dependency container, declarative field wiring from the container and
//! configuration providers, a recorder that explains every registration,
//! resolution and config read, and a supervisor that runs the workers under one
//! cancellation scope with aggregate readiness and orderly shutdown.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌────────────────┐  ┌────────────────┐        ┌────────────────┐  ┌────────────────┐
//!   │  Initializer   │  │  Initializer   │  ...   │    Runnable    │  │    Runnable    │
//!   │ #[derive(Wire)]│  │ #[derive(Wire)]│        │ #[derive(Wire)]│  │ #[derive(Wire)]│
//!   └───────┬────────┘  └───────┬────────┘        └───────┬────────┘  └───────┬────────┘
//!           ▼                   ▼                         ▼                   ▼
//! ┌───────────────────────────────────────────────────────────────────────────────────┐
//! │  App (facade) ──► Supervisor                                                       │
//! │   - Wirer: Dep<T> fields ◄── Container,  #[config] fields ◄── ProviderChain        │
//! │   - Recorder: REGISTER / RESOLVE / config events, one monotonic `order` counter    │
//! │   - Introspector: receives the Report before the first runnable starts            │
//! └───────┬───────────────────────────────────────────────────────────────┬───────────┘
//!         ▼                                                               ▼
//!   sequential initialize(ctx) ─► ctx'              concurrent run(scope) per runnable
//!   (may register!/resolve)                          first exit or cancel ─► drain ─► close
//! ```
//!
//! ### Lifecycle
//! ```text
//! Configured ─► Initializing ─┬─► Running ─► Draining ─► Terminated
//!                             └─► Failed ───────────────► Terminated
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Container**     | Typed bindings keyed by abstraction + name.                   | [`Container`], [`register!`], [`DependencyKey`] |
//! | **Wiring**        | Populate marked fields before each lifecycle call.            | [`Wire`], [`Dep`], [`FromConfig`]          |
//! | **Providers**     | Ordered configuration sources.                                | [`ConfigProvider`], [`ProviderChain`]      |
//! | **Components**    | Startup steps and long-lived workers.                         | [`Initializer`], [`Runnable`]              |
//! | **Introspection** | Report of every dependency and config event.                  | [`Recorder`], [`Report`], [`Introspector`] |
//! | **Supervision**   | Parallel run, readiness, shutdown, cleanup.                   | [`App`], [`RunningApp`], [`Lifecycle`]     |
//! | **Errors**        | Typed errors tagged with phase, component and call site.      | [`AppError`], [`WireError`], [`ContainerError`] |
//!
//! ## Optional features
//! - `logging`: exports [`logging::init`], a `tracing-subscriber` bootstrap honouring `APPVISOR_LOG`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use appvisor::{App, AppConfig, BoxError, Context, Dep, Initializer, Runnable, StaticProvider, Wire, register};
//!
//! pub trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//! impl Greeter for English {
//!     fn greet(&self) -> String { "hello".into() }
//! }
//!
//! #[derive(Default, Wire)]
//! struct Setup;
//!
//! #[async_trait]
//! impl Initializer for Setup {
//!     async fn initialize(&mut self, ctx: Context) -> Result<Context, BoxError> {
//!         register!(dyn Greeter, "", English);
//!         Ok(ctx)
//!     }
//! }
//!
//! #[derive(Default, Wire)]
//! struct Once {
//!     #[resolve]
//!     greeter: Dep<dyn Greeter>,
//!     #[config("TIMES", default = "1")]
//!     times: u32,
//! }
//!
//! #[async_trait]
//! impl Runnable for Once {
//!     async fn run(&self, _ctx: Context) -> Result<(), BoxError> {
//!         for _ in 0..self.times {
//!             println!("{}", self.greeter.greet());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = AppConfig::default();
//!     cfg.handle_signals = false;
//!
//!     App::new()
//!         .with_config(cfg)
//!         .with_provider(StaticProvider::new().set("TIMES", "2"))
//!         .with_initializer(Setup)
//!         .with_runnable(Once::default())
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

extern crate self as appvisor;

mod app;
mod components;
mod config;
mod container;
mod context;
mod core;
mod error;
mod introspect;
mod provider;
mod wiring;

#[cfg(test)]
mod testing;

#[cfg(feature = "logging")]
pub mod logging;

// ---- Public re-exports ----

pub use app::{App, RunningApp};
pub use components::{Initializer, InitializerFn, Runnable, RunnableFn};
pub use config::AppConfig;
pub use container::{Abstraction, BindingInfo, Container, DependencyKey};
pub use context::Context;
pub use crate::core::Lifecycle;
pub use error::{AppError, BoxError, ContainerError, Phase, WireError};
pub use introspect::{
    Caller, ComponentDescriptor, ConfigAccess, DependencyEvent, DependencyKind, Introspector,
    LogFormat, LogIntrospector, Recorder, Report, ReportEvent,
};
pub use provider::{
    ConfigProvider, ConfigValue, EnvProvider, ProviderChain, SecretsDirProvider, StaticProvider,
    TomlProvider, TomlProviderError,
};
pub use wiring::{Dep, FromConfig, Injectable, Wire, Wirer};

/// Derives [`Wire`] from `#[resolve]` and `#[config]` field markers.
pub use appvisor_macros::Wire;

/// Registers a value in the global [`Container`], recording its concrete type.
///
/// ```
/// use appvisor::{Container, register};
///
/// pub trait Clock: Send + Sync { fn now(&self) -> u64; }
/// struct Fixed;
/// impl Clock for Fixed { fn now(&self) -> u64 { 7 } }
///
/// register!(dyn Clock, "fixed", Fixed);
/// assert_eq!(Container::global().resolve::<dyn Clock>("fixed").unwrap().now(), 7);
///
/// let snapshot = Container::global().snapshot();
/// assert!(snapshot.iter().any(|b| b.name == "fixed" && b.implementation.ends_with("Fixed")));
/// ```
///
/// Forms:
/// - `register!(dyn Trait, "name", value)`
/// - `register!(dyn Trait, value)` (default binding, empty name)
#[macro_export]
macro_rules! register {
    ($abstraction:ty, $name:expr, $value:expr $(,)?) => {{
        let concrete = $value;
        let implementation = ::std::any::type_name_of_val(&concrete);
        let value: ::std::sync::Arc<$abstraction> = ::std::sync::Arc::new(concrete);
        $crate::Container::global().register_described::<$abstraction>($name, value, implementation)
    }};
    ($abstraction:ty, $value:expr $(,)?) => {
        $crate::register!($abstraction, "", $value)
    };
}
