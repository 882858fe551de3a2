//! Process environment provider.

use super::{ConfigProvider, ConfigValue};

/// Reads keys from the process environment, optionally under a prefix.
///
/// With prefix `"APP_"`, key `PORT` reads `APP_PORT`. The reported id is `"env"`.
#[derive(Debug, Clone, Default)]
pub struct EnvProvider {
    prefix: String,
}

impl EnvProvider {
    /// Provider without prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider reading `<prefix><KEY>`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ConfigProvider for EnvProvider {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        let var = format!("{}{}", self.prefix, key);
        std::env::var(&var)
            .ok()
            .map(|value| ConfigValue::new(value, "env"))
    }

    fn name(&self) -> &'static str {
        "EnvProvider"
    }
}
