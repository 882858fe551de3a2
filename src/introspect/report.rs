//! # Introspection report.
//!
//! [`Report`] is the chronological record of one run: configuration accesses,
//! container registrations/resolutions and the declared components. Every entry
//! carries the global `order` stamp of the [`Recorder`](super::Recorder); list
//! indices mean nothing, `order` is the total order across all lists.
//!
//! The serialized form uses the stable field names `configs`, `deps`, `runners`,
//! `initializers`, and dependency events carry `"kind": "register" | "resolve"`.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::caller::Caller;

/// Kind of a container event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// A binding was stored (or replaced).
    Register,
    /// A binding was looked up successfully.
    Resolve,
}

/// One container registration or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEvent {
    /// Register or resolve.
    pub kind: DependencyKind,
    /// Type name of the abstraction (e.g. `dyn my_app::Logger`).
    pub abstraction: String,
    /// Binding name; empty for the default binding.
    pub name: String,
    /// Type name of the stored implementation.
    pub implementation: String,
    /// Call site.
    pub caller: Caller,
    /// Component whose lifecycle call emitted the event; empty outside components.
    pub component: String,
    /// Global order stamp.
    pub order: u64,
}

/// One configuration read performed while wiring a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigAccess {
    /// Configuration key.
    pub key: String,
    /// Identifier of the provider that supplied the value; empty when the default applied.
    pub provider: String,
    /// Whether the declared default was used.
    pub used_default: bool,
    /// Field declaration that asked for the key.
    pub caller: Caller,
    /// Component being wired.
    pub component: String,
    /// Global order stamp.
    pub order: u64,
}

/// A component declared on the [`App`](crate::App).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Concrete type name of the component.
    pub type_name: String,
    /// Declaration index within its list (initializers or runnables).
    pub position: usize,
    /// Global order stamp.
    pub order: u64,
}

/// Snapshot of everything recorded during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Configuration accesses.
    pub configs: Vec<ConfigAccess>,
    /// Container events.
    pub deps: Vec<DependencyEvent>,
    /// Declared runnables.
    pub runners: Vec<ComponentDescriptor>,
    /// Declared initializers.
    pub initializers: Vec<ComponentDescriptor>,
}

/// Borrowed view over any report entry, used for merged chronological iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEvent<'a> {
    /// A configuration access.
    Config(&'a ConfigAccess),
    /// A container event.
    Dependency(&'a DependencyEvent),
    /// A declared initializer.
    Initializer(&'a ComponentDescriptor),
    /// A declared runnable.
    Runner(&'a ComponentDescriptor),
}

impl ReportEvent<'_> {
    /// Global order stamp of the entry.
    pub fn order(&self) -> u64 {
        match self {
            ReportEvent::Config(c) => c.order,
            ReportEvent::Dependency(d) => d.order,
            ReportEvent::Initializer(c) | ReportEvent::Runner(c) => c.order,
        }
    }
}

impl Report {
    /// All entries merged and sorted by `order`.
    pub fn events(&self) -> Vec<ReportEvent<'_>> {
        let mut out: Vec<ReportEvent<'_>> = self
            .configs
            .iter()
            .map(ReportEvent::Config)
            .chain(self.deps.iter().map(ReportEvent::Dependency))
            .chain(self.initializers.iter().map(ReportEvent::Initializer))
            .chain(self.runners.iter().map(ReportEvent::Runner))
            .collect();
        out.sort_by_key(ReportEvent::order);
        out
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
            && self.deps.is_empty()
            && self.runners.is_empty()
            && self.initializers.is_empty()
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Renders the dependency graph in Graphviz DOT.
    ///
    /// Components point at the keys they register or resolve; keys point (dashed)
    /// at the implementation registered under them. Events emitted outside any
    /// component are attributed to `<root>`.
    pub fn to_dot(&self) -> String {
        let mut edges: BTreeSet<(String, String, &'static str)> = BTreeSet::new();
        for dep in &self.deps {
            let owner = if dep.component.is_empty() {
                "<root>".to_string()
            } else {
                dep.component.clone()
            };
            let key = if dep.name.is_empty() {
                dep.abstraction.clone()
            } else {
                format!("{}[{}]", dep.abstraction, dep.name)
            };
            match dep.kind {
                DependencyKind::Register => {
                    edges.insert((owner, key.clone(), "register"));
                    edges.insert((key, dep.implementation.clone(), "impl"));
                }
                DependencyKind::Resolve => {
                    edges.insert((owner, key, "resolve"));
                }
            }
        }

        let mut out = String::from("digraph appvisor {\n");
        for (from, to, label) in edges {
            let style = if label == "impl" { ", style=dashed" } else { "" };
            let _ = writeln!(
                out,
                "  \"{}\" -> \"{}\" [label=\"{}\"{}];",
                escape(&from),
                escape(&to),
                label,
                style
            );
        }
        out.push('}');
        out.push('\n');
        out
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
