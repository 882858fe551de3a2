//! # Append-only introspection log.
//!
//! The [`Recorder`] keeps, per run, every container registration and resolution,
//! every configuration access and the declared components. Each entry gets a stamp
//! from a single counter taken under the same lock that appends it, so the stamp
//! order equals the append order across all lists.
//!
//! ## Rules
//! - Stamps start at 1 and strictly increase until [`Recorder::reset`].
//! - A new run resets the process-global recorder.
//! - [`Recorder::report`] is a copy; entries appended afterwards are not in it.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::caller::Caller;
use super::report::{ComponentDescriptor, ConfigAccess, DependencyEvent, DependencyKind, Report};

static GLOBAL: Lazy<Arc<Recorder>> = Lazy::new(|| Arc::new(Recorder::new()));

#[derive(Default)]
struct Log {
    last: u64,
    report: Report,
}

impl Log {
    fn stamp(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

/// Role of a declared component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Initializer,
    Runner,
}

/// Thread-safe, append-only event log.
#[derive(Default)]
pub struct Recorder {
    log: Mutex<Log>,
}

impl Recorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-global recorder fed by [`Container::global`](crate::Container::global).
    pub fn global() -> &'static Arc<Recorder> {
        &GLOBAL
    }

    /// Drops every entry and restarts the stamp counter.
    pub fn reset(&self) {
        *self.log.lock() = Log::default();
    }

    /// Copy of everything recorded so far.
    pub fn report(&self) -> Report {
        self.log.lock().report.clone()
    }

    /// Last stamp handed out (0 when empty).
    pub fn last_order(&self) -> u64 {
        self.log.lock().last
    }

    pub(crate) fn record_dependency(
        &self,
        kind: DependencyKind,
        abstraction: &str,
        name: &str,
        implementation: &str,
        caller: Caller,
        component: Option<&str>,
    ) -> u64 {
        let mut log = self.log.lock();
        let order = log.stamp();
        log.report.deps.push(DependencyEvent {
            kind,
            abstraction: abstraction.to_string(),
            name: name.to_string(),
            implementation: implementation.to_string(),
            caller,
            component: component.unwrap_or_default().to_string(),
            order,
        });
        order
    }

    pub(crate) fn record_config(
        &self,
        key: &str,
        provider: &str,
        used_default: bool,
        caller: Caller,
        component: &str,
    ) -> u64 {
        let mut log = self.log.lock();
        let order = log.stamp();
        log.report.configs.push(ConfigAccess {
            key: key.to_string(),
            provider: provider.to_string(),
            used_default,
            caller,
            component: component.to_string(),
            order,
        });
        order
    }

    pub(crate) fn record_component(&self, role: Role, type_name: &str, position: usize) -> u64 {
        let mut log = self.log.lock();
        let order = log.stamp();
        let descriptor = ComponentDescriptor {
            type_name: type_name.to_string(),
            position,
            order,
        };
        match role {
            Role::Initializer => log.report.initializers.push(descriptor),
            Role::Runner => log.report.runners.push(descriptor),
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller() -> Caller {
        Caller::new("", "src/lib.rs", 1)
    }

    #[test]
    fn stamps_increase_across_lists() {
        let rec = Recorder::new();
        let a = rec.record_component(Role::Initializer, "app::Init", 0);
        let b = rec.record_config("PORT", "env", false, caller(), "app::Init");
        let c = rec.record_dependency(
            DependencyKind::Register,
            "dyn app::Logger",
            "",
            "app::Stdout",
            caller(),
            Some("app::Init"),
        );
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(rec.last_order(), 3);

        let report = rec.report();
        assert_eq!(report.initializers.len(), 1);
        assert_eq!(report.configs[0].order, 2);
        assert_eq!(report.deps[0].component, "app::Init");
    }

    #[test]
    fn reset_clears_and_restarts_counter() {
        let rec = Recorder::new();
        rec.record_component(Role::Runner, "app::Worker", 0);
        rec.reset();
        assert!(rec.report().is_empty());
        assert_eq!(rec.record_component(Role::Runner, "app::Worker", 0), 1);
    }

    #[test]
    fn report_is_a_snapshot() {
        let rec = Recorder::new();
        rec.record_component(Role::Runner, "app::Worker", 0);
        let before = rec.report();
        rec.record_config("LATE", "", true, caller(), "app::Worker");
        assert!(before.configs.is_empty());
        assert_eq!(rec.report().configs.len(), 1);
    }
}
