//! # LogIntrospector: writes the report through `tracing`
//!
//! ## Example output (text format)
//! ```text
//! INFO appvisor: [initializer] type=app::LoggerInit position=0 order=1
//! INFO appvisor: [register] abstraction=dyn app::Logger name="" impl=app::Stdout at=app::LoggerInit::initialize (src/main.rs:31) order=3
//! INFO appvisor: [config] key=POLL_INTERVAL provider=env default=false component=app::Poller order=5
//! INFO appvisor: [resolve] abstraction=dyn app::Logger name="" at=app::Poller::wire (src/main.rs:12) order=6
//! ```

use async_trait::async_trait;
use tracing::info;

use crate::context::Context;
use crate::error::BoxError;

use super::introspector::Introspector;
use super::report::{DependencyKind, Report, ReportEvent};

/// Output format of [`LogIntrospector`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One line per event, in `order`.
    #[default]
    Text,
    /// The whole report as a single JSON document.
    Json,
}

/// Introspector that logs the report.
#[derive(Debug, Default)]
pub struct LogIntrospector {
    format: LogFormat,
}

impl LogIntrospector {
    /// Construct a text-format [`LogIntrospector`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a [`LogIntrospector`] with the given format.
    #[must_use]
    pub fn with_format(format: LogFormat) -> Self {
        Self { format }
    }
}

#[async_trait]
impl Introspector for LogIntrospector {
    async fn introspect(&self, _ctx: &Context, report: &Report) -> Result<(), BoxError> {
        match self.format {
            LogFormat::Json => {
                let json = serde_json::to_string(report)?;
                info!(target: "appvisor", report = %json, "introspection report");
            }
            LogFormat::Text => {
                for ev in report.events() {
                    log_event(&ev);
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogIntrospector"
    }
}

fn log_event(ev: &ReportEvent<'_>) {
    match ev {
        ReportEvent::Initializer(c) => info!(
            target: "appvisor",
            "[initializer] type={} position={} order={}",
            c.type_name, c.position, c.order
        ),
        ReportEvent::Runner(c) => info!(
            target: "appvisor",
            "[runner] type={} position={} order={}",
            c.type_name, c.position, c.order
        ),
        ReportEvent::Config(c) => info!(
            target: "appvisor",
            "[config] key={} provider={} default={} component={} order={}",
            c.key, c.provider, c.used_default, c.component, c.order
        ),
        ReportEvent::Dependency(d) => match d.kind {
            DependencyKind::Register => info!(
                target: "appvisor",
                "[register] abstraction={} name={:?} impl={} at={} order={}",
                d.abstraction, d.name, d.implementation, d.caller, d.order
            ),
            DependencyKind::Resolve => info!(
                target: "appvisor",
                "[resolve] abstraction={} name={:?} at={} order={}",
                d.abstraction, d.name, d.caller, d.order
            ),
        },
    }
}
