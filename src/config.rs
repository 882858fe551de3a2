//! # Runtime settings of the supervisor.
//!
//! [`AppConfig`] controls how the supervisor polls readiness probes, whether
//! [`App::run`](crate::App::run) listens for OS signals, and how long each
//! `close` hook may take.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use appvisor::AppConfig;
//!
//! let mut cfg = AppConfig::default();
//! cfg.readiness_poll = Duration::from_millis(10);
//! cfg.handle_signals = false;
//! cfg.close_timeout = Duration::ZERO;
//!
//! assert_eq!(cfg.close_timeout(), None);
//! ```

use std::time::Duration;

/// Lower bound applied to [`AppConfig::readiness_poll`].
const MIN_POLL: Duration = Duration::from_millis(1);

/// Supervisor settings.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Interval between readiness probe rounds in `wait_for_readiness`.
    pub readiness_poll: Duration,
    /// Whether [`App::run`](crate::App::run) cancels the root context on SIGINT/SIGTERM/SIGQUIT.
    pub handle_signals: bool,
    /// Upper bound for each `close` hook (0 = unbounded).
    pub close_timeout: Duration,
}

impl AppConfig {
    /// Effective probe interval, never below 1ms.
    pub fn readiness_poll(&self) -> Duration {
        self.readiness_poll.max(MIN_POLL)
    }

    /// Close timeout, `None` when unbounded.
    pub fn close_timeout(&self) -> Option<Duration> {
        (self.close_timeout > Duration::ZERO).then_some(self.close_timeout)
    }
}

impl Default for AppConfig {
    /// Provides a default configuration:
    /// - `readiness_poll = 25ms`
    /// - `handle_signals = true`
    /// - `close_timeout = 10s`
    fn default() -> Self {
        Self {
            readiness_poll: Duration::from_millis(25),
            handle_signals: true,
            close_timeout: Duration::from_secs(10),
        }
    }
}
