//! Subscriber bootstrap for binaries (feature `logging`).
//!
//! The library itself only emits `tracing` events; installing a subscriber is the
//! binary's call. [`init`] installs a `tracing-subscriber` fmt layer filtered by
//! `APPVISOR_LOG` (falling back to the given directive).

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Environment variable read for the filter directive.
pub const LOG_ENV: &str = "APPVISOR_LOG";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Installs the global subscriber.
///
/// `default_filter` is used when `APPVISOR_LOG` is unset or invalid
/// (e.g. `"info,appvisor=debug"`).
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init(default_filter: &str, format: Format) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = Registry::default().with(filter);

    match format {
        Format::Json => registry
            .with(fmt::layer().json().with_target(true).with_thread_names(true))
            .try_init(),
        Format::Text => registry
            .with(fmt::layer().with_target(true).with_thread_names(true))
            .try_init(),
    }
}
