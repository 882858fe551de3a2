//! # Dependency keys.
//!
//! A [`DependencyKey`] is `(abstraction, name)`. The abstraction is identified by
//! its `TypeId` (nominal identity; two traits with the same methods are different
//! keys); its type name is kept for reports and errors. An empty name is the
//! default binding.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Nominal identity of an abstraction, usually a `dyn Trait`.
#[derive(Clone, Copy)]
pub struct Abstraction {
    id: TypeId,
    name: &'static str,
    accepts: fn(&(dyn Any + Send + Sync)) -> bool,
}

fn accepts<T: ?Sized + Send + Sync + 'static>(value: &(dyn Any + Send + Sync)) -> bool {
    value.is::<Arc<T>>()
}

impl Abstraction {
    /// Identity of `T`; values bound under it are `Arc<T>`.
    pub fn of<T: ?Sized + Send + Sync + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            accepts: accepts::<T>,
        }
    }

    /// Type name of the abstraction.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true if `value` is an `Arc` of this abstraction.
    pub fn accepts(&self, value: &(dyn Any + Send + Sync)) -> bool {
        (self.accepts)(value)
    }
}

impl PartialEq for Abstraction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Abstraction {}

impl Hash for Abstraction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Abstraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Container key: abstraction plus binding name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyKey {
    abstraction: Abstraction,
    name: String,
}

impl DependencyKey {
    /// Key of `T` under `name` (empty = default binding).
    pub fn of<T: ?Sized + Send + Sync + 'static>(name: impl Into<String>) -> Self {
        Self::new(Abstraction::of::<T>(), name)
    }

    /// Key from an already computed abstraction.
    pub fn new(abstraction: Abstraction, name: impl Into<String>) -> Self {
        Self {
            abstraction,
            name: name.into(),
        }
    }

    /// Abstraction part.
    pub fn abstraction(&self) -> &Abstraction {
        &self.abstraction
    }

    /// Name part.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(self.abstraction.name)
        } else {
            write!(f, "{}[{}]", self.abstraction.name, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {}
    trait Farewell: Send + Sync {}

    #[test]
    fn equality_is_nominal_and_structural_on_name() {
        assert_eq!(DependencyKey::of::<dyn Greeter>(""), DependencyKey::of::<dyn Greeter>(""));
        assert_ne!(DependencyKey::of::<dyn Greeter>(""), DependencyKey::of::<dyn Greeter>("x"));
        assert_ne!(DependencyKey::of::<dyn Greeter>(""), DependencyKey::of::<dyn Farewell>(""));
    }

    #[test]
    fn accepts_only_arc_of_the_abstraction() {
        struct Hello;
        impl Greeter for Hello {}

        let abs = Abstraction::of::<dyn Greeter>();
        let ok: Arc<dyn Greeter> = Arc::new(Hello);
        assert!(abs.accepts(&ok));
        assert!(!abs.accepts(&Arc::new(Hello)));
        assert!(!abs.accepts(&"not an arc"));
    }

    #[test]
    fn display_includes_name_when_present() {
        let key = DependencyKey::of::<u32>("replica");
        assert_eq!(key.to_string(), "u32[replica]");
        assert_eq!(DependencyKey::of::<u32>("").to_string(), "u32");
    }
}
