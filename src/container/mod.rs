//! # Process-wide dependency container.
//!
//! [`Container`] maps [`DependencyKey`]s to shared values (`Arc<T>`). Initializers
//! register bindings; the [`Wirer`](crate::Wirer) resolves them into component
//! fields. Every registration and successful resolution is appended to the
//! [`Recorder`] from inside the lock that performs it, so the recorded order is the
//! linearization order.
//!
//! ## Rules
//! - At most one binding per key; registering again replaces it and is recorded
//!   as a new registration.
//! - Reads run in parallel, writes are exclusive.
//! - No cycle detection: components are wired one at a time, in declaration order,
//!   against whatever is registered at that point.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use appvisor::{Container, Recorder};
//!
//! trait Clock: Send + Sync { fn now(&self) -> u64; }
//! struct Fixed;
//! impl Clock for Fixed { fn now(&self) -> u64 { 42 } }
//!
//! let container = Container::new(Arc::new(Recorder::new()));
//! container.register::<dyn Clock>("", Arc::new(Fixed));
//! assert_eq!(container.resolve::<dyn Clock>("").unwrap().now(), 42);
//! assert!(container.resolve::<dyn Clock>("utc").is_err());
//! ```

mod key;

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::panic::Location;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::ContainerError;
use crate::introspect::{Caller, ComponentScope, DependencyKind, Recorder};

pub use key::{Abstraction, DependencyKey};

static GLOBAL: Lazy<Container> = Lazy::new(|| Container::new(Arc::clone(Recorder::global())));

/// Stored binding: an `Arc<T>` of the key's abstraction, type-erased.
struct Entry {
    value: Box<dyn Any + Send + Sync>,
    implementation: &'static str,
}

/// One row of [`Container::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    /// Type name of the abstraction.
    pub abstraction: &'static str,
    /// Binding name (empty = default binding).
    pub name: String,
    /// Type name of the stored implementation.
    pub implementation: &'static str,
}

/// Typed registry of shared values keyed by abstraction and name.
pub struct Container {
    bindings: RwLock<HashMap<DependencyKey, Entry>>,
    recorder: Arc<Recorder>,
}

impl Container {
    /// Creates an empty container that reports into `recorder`.
    pub fn new(recorder: Arc<Recorder>) -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
            recorder,
        }
    }

    /// The process-global container, reporting into [`Recorder::global`].
    pub fn global() -> &'static Container {
        &GLOBAL
    }

    /// Recorder this container reports into.
    pub fn recorder(&self) -> &Arc<Recorder> {
        &self.recorder
    }

    /// Binds `value` under `(T, name)`, replacing any previous binding.
    ///
    /// The implementation recorded is `T` itself; use [`register!`](crate::register)
    /// or [`Container::register_described`] to record the concrete type.
    #[track_caller]
    pub fn register<T>(&self, name: &str, value: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_described(name, value, type_name::<T>());
    }

    /// Like [`Container::register`], recording `implementation` as the concrete type.
    #[track_caller]
    pub fn register_described<T>(&self, name: &str, value: Arc<T>, implementation: &'static str)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = DependencyKey::of::<T>(name);
        self.store(key, Box::new(value), implementation, Location::caller());
    }

    /// Type-erased registration; `value` must be an `Arc` of the key's abstraction.
    ///
    /// # Errors
    /// [`ContainerError::InvalidBinding`] when `value` is anything else. Nothing is
    /// stored or recorded in that case.
    #[track_caller]
    pub fn register_erased(
        &self,
        key: DependencyKey,
        value: Box<dyn Any + Send + Sync>,
        implementation: &'static str,
    ) -> Result<(), ContainerError> {
        if !key.abstraction().accepts(value.as_ref()) {
            return Err(ContainerError::InvalidBinding {
                abstraction: key.abstraction().name(),
                name: key.name().to_string(),
                found: implementation.to_string(),
            });
        }
        self.store(key, value, implementation, Location::caller());
        Ok(())
    }

    fn store(
        &self,
        key: DependencyKey,
        value: Box<dyn Any + Send + Sync>,
        implementation: &'static str,
        location: &'static Location<'static>,
    ) {
        let scope = ComponentScope::current();
        let caller = Caller::at(location);

        let mut bindings = self.bindings.write();
        let replaced = bindings
            .insert(
                key.clone(),
                Entry {
                    value,
                    implementation,
                },
            )
            .is_some();
        let order = self.recorder.record_dependency(
            DependencyKind::Register,
            key.abstraction().name(),
            key.name(),
            implementation,
            caller,
            scope.map(|s| s.component),
        );
        drop(bindings);

        debug!(key = %key, implementation, replaced, order, "binding registered");
    }

    /// Returns the value bound under `(T, name)`.
    ///
    /// # Errors
    /// [`ContainerError::DependencyNotFound`] when no binding exists.
    #[track_caller]
    pub fn resolve<T>(&self, name: &str) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let scope = ComponentScope::current();
        self.resolve_as(name, Caller::at(Location::caller()), scope.map(|s| s.component))
    }

    /// Resolution with an explicit caller and owning component (used by the wirer).
    pub(crate) fn resolve_as<T>(
        &self,
        name: &str,
        caller: Caller,
        component: Option<&str>,
    ) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = DependencyKey::of::<T>(name);
        let bindings = self.bindings.read();
        let Some(entry) = bindings.get(&key) else {
            return Err(ContainerError::DependencyNotFound {
                abstraction: key.abstraction().name(),
                name: name.to_string(),
            });
        };
        let Some(value) = entry.value.downcast_ref::<Arc<T>>() else {
            return Err(ContainerError::InvalidBinding {
                abstraction: key.abstraction().name(),
                name: name.to_string(),
                found: entry.implementation.to_string(),
            });
        };
        let value = Arc::clone(value);
        let order = self.recorder.record_dependency(
            DependencyKind::Resolve,
            key.abstraction().name(),
            name,
            entry.implementation,
            caller,
            component,
        );
        drop(bindings);

        debug!(key = %key, order, "binding resolved");
        Ok(value)
    }

    /// Returns true if `(T, name)` is bound. Not recorded.
    pub fn contains<T>(&self, name: &str) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.bindings
            .read()
            .contains_key(&DependencyKey::of::<T>(name))
    }

    /// Current bindings, sorted by abstraction then name.
    pub fn snapshot(&self) -> Vec<BindingInfo> {
        let bindings = self.bindings.read();
        let mut out: Vec<BindingInfo> = bindings
            .iter()
            .map(|(key, entry)| BindingInfo {
                abstraction: key.abstraction().name(),
                name: key.name().to_string(),
                implementation: entry.implementation,
            })
            .collect();
        out.sort_by(|a, b| (a.abstraction, &a.name).cmp(&(b.abstraction, &b.name)));
        out
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }

    /// Drops every binding. Not recorded.
    pub fn clear(&self) {
        self.bindings.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Logger: Send + Sync {
        fn tag(&self) -> &'static str;
    }

    struct Stdout;
    impl Logger for Stdout {
        fn tag(&self) -> &'static str {
            "stdout"
        }
    }

    struct Null;
    impl Logger for Null {
        fn tag(&self) -> &'static str {
            "null"
        }
    }

    fn container() -> Container {
        Container::new(Arc::new(Recorder::new()))
    }

    #[test]
    fn last_registration_wins() {
        let c = container();
        c.register::<dyn Logger>("", Arc::new(Stdout));
        c.register::<dyn Logger>("", Arc::new(Null));
        assert_eq!(c.resolve::<dyn Logger>("").unwrap().tag(), "null");
        assert_eq!(c.len(), 1);

        let report = c.recorder().report();
        let registers = report
            .deps
            .iter()
            .filter(|d| d.kind == DependencyKind::Register)
            .count();
        assert_eq!(registers, 2);
        assert!(report.deps[0].order < report.deps[1].order);
    }

    #[test]
    fn names_discriminate_bindings() {
        let c = container();
        c.register::<dyn Logger>("", Arc::new(Stdout));
        c.register::<dyn Logger>("audit", Arc::new(Null));
        assert_eq!(c.resolve::<dyn Logger>("").unwrap().tag(), "stdout");
        assert_eq!(c.resolve::<dyn Logger>("audit").unwrap().tag(), "null");
    }

    #[test]
    fn missing_key_is_not_recorded() {
        let c = container();
        let err = c.resolve::<dyn Logger>("").err().unwrap();
        assert_eq!(err.as_label(), "dependency_not_found");
        assert!(c.recorder().report().deps.is_empty());
    }

    #[test]
    fn erased_registration_rejects_foreign_values() {
        let c = container();
        let key = DependencyKey::of::<dyn Logger>("");
        let err = c
            .register_erased(key.clone(), Box::new(Arc::new(Stdout)), "Stdout")
            .unwrap_err();
        assert_eq!(err.as_label(), "invalid_binding");
        assert!(c.is_empty());
        assert!(c.recorder().report().deps.is_empty());

        let ok: Arc<dyn Logger> = Arc::new(Stdout);
        c.register_erased(key, Box::new(ok), "Stdout").unwrap();
        assert_eq!(c.resolve::<dyn Logger>("").unwrap().tag(), "stdout");
    }

    #[test]
    fn resolve_records_caller_in_this_file() {
        let c = container();
        c.register::<dyn Logger>("", Arc::new(Stdout));
        let line = line!() + 1;
        let _ = c.resolve::<dyn Logger>("").unwrap();
        let report = c.recorder().report();
        let resolve = report.deps.last().unwrap();
        assert_eq!(resolve.kind, DependencyKind::Resolve);
        assert_eq!(resolve.caller.file, file!());
        assert_eq!(resolve.caller.line, line);
        assert!(resolve.component.is_empty());
    }

    #[test]
    fn snapshot_is_sorted() {
        let c = container();
        c.register::<dyn Logger>("b", Arc::new(Stdout));
        c.register::<dyn Logger>("a", Arc::new(Null));
        let snap = c.snapshot();
        let names: Vec<&str> = snap.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        c.clear();
        assert!(c.snapshot().is_empty());
    }
}
