//! # Field wiring.
//!
//! Before a component's `initialize` or `run` is called, the supervisor hands it a
//! [`Wirer`] through [`Wire::wire`]. `#[derive(Wire)]` generates that method from
//! field markers:
//!
//! ```text
//! #[resolve] / #[resolve("name")]          Dep<T> field  ─► Container::resolve::<T>(name)
//! #[config("KEY", default = "2s")]         T: FromConfig ─► providers (first found) ─► default ─► MissingConfig
//! (no marker)                              left untouched
//! ```
//!
//! ## Rules
//! - Fields are processed in declaration order.
//! - Wiring is atomic: generated code computes every marked field, then assigns
//!   them all; on the first failure nothing is assigned.
//! - Every config read is recorded (`used_default`, provider id); every resolution
//!   is recorded by the container. Both are attributed to the field declaration.

mod parse;

use std::any::type_name;
use std::fmt;
use std::ops::Deref;
use std::panic::Location;
use std::sync::Arc;

use tracing::debug;

use crate::container::Container;
use crate::error::{ContainerError, WireError};
use crate::introspect::{Caller, ComponentScope};
use crate::provider::ConfigProvider;

pub use parse::FromConfig;

/// A component whose marked fields can be populated by a [`Wirer`].
///
/// Usually derived:
/// ```
/// use std::time::Duration;
/// use appvisor::{Dep, Wire};
///
/// trait Clock: Send + Sync {}
///
/// #[derive(Default, Wire)]
/// struct Poller {
///     #[resolve]
///     clock: Dep<dyn Clock>,
///     #[config("POLL_INTERVAL", default = "2s")]
///     interval: Duration,
///     polls: u64,
/// }
/// ```
///
/// Hand-written implementations must keep the same atomicity: assign only after
/// every field was computed.
pub trait Wire {
    /// Populates the marked fields of `self`.
    fn wire(&mut self, wirer: &Wirer<'_>) -> Result<(), WireError>;
}

/// Field types that `#[resolve]` can populate.
pub trait Injectable: Sized {
    /// Produces the field value for binding `name`.
    fn inject(wirer: &Wirer<'_>, name: &str, caller: Caller) -> Result<Self, WireError>;
}

/// Resolves and coerces field values for one component.
pub struct Wirer<'a> {
    container: &'a Container,
    providers: &'a dyn ConfigProvider,
    component: &'static str,
}

impl<'a> Wirer<'a> {
    /// Wirer for `component` over `container` and `providers`.
    pub fn new(
        container: &'a Container,
        providers: &'a dyn ConfigProvider,
        component: &'static str,
    ) -> Self {
        Self {
            container,
            providers,
            component,
        }
    }

    /// Type name of the component being wired.
    pub fn component(&self) -> &'static str {
        self.component
    }

    fn caller(&self, location: &'static Location<'static>) -> Caller {
        Caller::in_scope(ComponentScope::new(self.component, "wire"), location)
    }

    /// Value for a `#[resolve]` field.
    #[track_caller]
    pub fn dependency<D: Injectable>(&self, name: &str) -> Result<D, WireError> {
        let caller = self.caller(Location::caller());
        D::inject(self, name, caller)
    }

    /// Resolves `(T, name)` attributing the event to `caller`.
    ///
    /// # Errors
    /// [`WireError::UnsatisfiedDependency`] if nothing is bound under the key.
    pub fn resolve_at<T>(&self, name: &str, caller: Caller) -> Result<Arc<T>, WireError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.container
            .resolve_as::<T>(name, caller.clone(), Some(self.component))
            .map_err(|err| match err {
                ContainerError::DependencyNotFound { abstraction, name } => {
                    WireError::UnsatisfiedDependency {
                        abstraction,
                        name,
                        caller,
                    }
                }
                ContainerError::InvalidBinding {
                    abstraction, name, ..
                } => WireError::UnsatisfiedDependency {
                    abstraction,
                    name,
                    caller,
                },
            })
    }

    /// Value for a `#[config]` field.
    ///
    /// Providers are queried in order; the first that finds `key` wins. Otherwise
    /// `default` applies; without a default the field is missing, except for
    /// `Option<_>` fields, which are recorded as defaulted and set to `None`.
    ///
    /// # Errors
    /// [`WireError::MissingConfig`] or [`WireError::ConfigParse`].
    #[track_caller]
    pub fn config<T: FromConfig>(&self, key: &str, default: Option<&str>) -> Result<T, WireError> {
        let caller = self.caller(Location::caller());
        let recorder = self.container.recorder();

        let raw = match self.providers.get(key) {
            Some(found) => {
                let order = recorder.record_config(
                    key,
                    &found.provider,
                    false,
                    caller.clone(),
                    self.component,
                );
                debug!(key, provider = %found.provider, used_default = false, order, component = self.component, "config read");
                found.value
            }
            None => match default {
                Some(literal) => {
                    let order =
                        recorder.record_config(key, "", true, caller.clone(), self.component);
                    debug!(key, provider = "", used_default = true, order, component = self.component, "config read");
                    literal.to_string()
                }
                None => {
                    let Some(absent) = T::missing() else {
                        return Err(WireError::MissingConfig {
                            key: key.to_string(),
                            caller,
                        });
                    };
                    let order =
                        recorder.record_config(key, "", true, caller, self.component);
                    debug!(key, provider = "", used_default = true, order, component = self.component, "optional config absent");
                    return Ok(absent);
                }
            },
        };

        T::from_config(&raw).map_err(|reason| WireError::ConfigParse {
            key: key.to_string(),
            value: raw,
            target: T::type_name(),
            reason,
            caller,
        })
    }
}

/// Dependency slot filled by `#[resolve]`.
///
/// Starts unwired ([`Default`]); after wiring it dereferences to the bound value.
///
/// # Panics
/// Dereferencing an unwired `Dep` panics. The supervisor wires every component
/// before calling into it, so this only happens when a component is used outside
/// an [`App`](crate::App) without being wired.
pub struct Dep<T: ?Sized>(Option<Arc<T>>);

impl<T: ?Sized> Dep<T> {
    /// An empty slot.
    pub const fn unwired() -> Self {
        Self(None)
    }

    /// A slot holding `value`.
    pub fn wired(value: Arc<T>) -> Self {
        Self(Some(value))
    }

    /// Returns true once wired.
    pub fn is_wired(&self) -> bool {
        self.0.is_some()
    }

    /// The bound value, if wired.
    pub fn get(&self) -> Option<&Arc<T>> {
        self.0.as_ref()
    }
}

impl<T: ?Sized> Default for Dep<T> {
    fn default() -> Self {
        Self::unwired()
    }
}

impl<T: ?Sized> Clone for Dep<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized> Deref for Dep<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.0 {
            Some(value) => value,
            None => panic!("Dep<{}> used before wiring", type_name::<T>()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Dep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_wired() { "wired" } else { "unwired" };
        write!(f, "Dep<{}>({state})", type_name::<T>())
    }
}

impl<T> Injectable for Dep<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn inject(wirer: &Wirer<'_>, name: &str, caller: Caller) -> Result<Self, WireError> {
        wirer.resolve_at::<T>(name, caller).map(Dep::wired)
    }
}

/// Optional dependency: `None` when nothing is bound under the key.
impl<T> Injectable for Option<Dep<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn inject(wirer: &Wirer<'_>, name: &str, caller: Caller) -> Result<Self, WireError> {
        match wirer.resolve_at::<T>(name, caller) {
            Ok(value) => Ok(Some(Dep::wired(value))),
            Err(WireError::UnsatisfiedDependency { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    }
}
