//! # appvisor-macros
//!
//! Derive macro that generates the field wiring of an `appvisor` component.
//!
//! `#[derive(Wire)]` reads two field markers:
//! - `#[resolve]`, `#[resolve("name")]`, `#[resolve(name = "name")]` on a `Dep<T>` field:
//!   resolved from the container under `(T, name)`;
//! - `#[config("KEY")]`, `#[config("KEY", default = "2s")]`, `#[config(key = "KEY")]`
//!   on any `FromConfig` field: read from the configured providers, falling back to
//!   the declared default.
//!
//! Unmarked fields are left untouched. The generated `wire` computes every marked
//! field first and assigns them only once all succeeded.
//!
//! ```ignore
//! use std::time::Duration;
//! use appvisor::{Dep, Wire};
//!
//! #[derive(Wire)]
//! struct Poller {
//!     #[resolve]
//!     logger: Dep<dyn Logger>,
//!     #[config("POLL_INTERVAL", default = "2s")]
//!     interval: Duration,
//!     hits: u64,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod wire;

/// Derives `appvisor::Wire` for a struct with `#[resolve]` / `#[config]` fields.
#[proc_macro_derive(Wire, attributes(resolve, config))]
pub fn derive_wire(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match wire::expand(input) {
        Ok(output) => output.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
