//! In-memory provider, mostly for tests and embedding fixed settings.

use std::collections::HashMap;

use super::{ConfigProvider, ConfigValue};

/// Provider backed by a fixed map.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    id: String,
    values: HashMap<String, String>,
}

impl Default for StaticProvider {
    fn default() -> Self {
        Self::named("static")
    }
}

impl StaticProvider {
    /// Empty provider with id `"static"`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty provider reporting `id` as its identifier.
    pub fn named(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: HashMap::new(),
        }
    }

    /// Adds (or replaces) a value.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for StaticProvider
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(StaticProvider::new(), |p, (k, v)| p.set(k, v))
    }
}

impl ConfigProvider for StaticProvider {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values
            .get(key)
            .map(|v| ConfigValue::new(v.clone(), self.id.clone()))
    }

    fn name(&self) -> &'static str {
        "StaticProvider"
    }
}
