//! # Configuration providers.
//!
//! A [`ConfigProvider`] answers "what is the value of this key?" with the textual
//! value and the identifier of whoever supplied it, or `None`. A missing key is
//! not an error here; the [`Wirer`](crate::Wirer) decides using the field's default.
//!
//! Providers compose through [`ProviderChain`]: first provider that finds the key wins.
//!
//! Built-in providers:
//! - [`EnvProvider`] process environment (`"env"`)
//! - [`StaticProvider`] in-memory pairs
//! - [`TomlProvider`] a TOML document, flattened (`"toml:<path>"`)
//! - [`SecretsDirProvider`] one file per key (`"secrets:<dir>"`)

mod env;
mod memory;
mod secrets;
mod toml_file;

use std::fmt;
use std::sync::Arc;

pub use env::EnvProvider;
pub use memory::StaticProvider;
pub use secrets::SecretsDirProvider;
pub use toml_file::{TomlProvider, TomlProviderError};

/// A value found by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue {
    /// Textual value, parsed later by the field's type.
    pub value: String,
    /// Provider identifier (free-form, e.g. `"env"`, `"vault/app"`).
    pub provider: String,
}

impl ConfigValue {
    /// Builds a found value.
    pub fn new(value: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            provider: provider.into(),
        }
    }
}

/// Source of configuration values.
///
/// Implementations must be cheap to query and safe to share; the chain is
/// read-only once the application starts.
pub trait ConfigProvider: Send + Sync + 'static {
    /// Looks `key` up; `None` means "not found here".
    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Ordered provider composition; the first provider that finds a key wins.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn ConfigProvider>>,
}

impl ProviderChain {
    /// Empty chain (finds nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a provider with the lowest precedence so far.
    pub fn push(&mut self, provider: Arc<dyn ConfigProvider>) {
        self.providers.push(provider);
    }

    /// Builder-style [`ProviderChain::push`].
    #[must_use]
    pub fn with(mut self, provider: impl ConfigProvider) -> Self {
        self.push(Arc::new(provider));
        self
    }

    /// Number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if the chain has no provider.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ConfigProvider for ProviderChain {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.providers.iter().find_map(|p| p.get(key))
    }

    fn name(&self) -> &'static str {
        "ProviderChain"
    }
}

impl fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

impl FromIterator<Arc<dyn ConfigProvider>> for ProviderChain {
    fn from_iter<I: IntoIterator<Item = Arc<dyn ConfigProvider>>>(iter: I) -> Self {
        Self {
            providers: iter.into_iter().collect(),
        }
    }
}
