//! TOML document provider.
//!
//! The document is flattened once at construction. A value at `db.url` answers to
//! both `db.url` and `DB_URL`; arrays become comma-separated strings.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use toml::{Table, Value};

use super::{ConfigProvider, ConfigValue};

/// Errors loading a TOML provider.
#[derive(Error, Debug)]
pub enum TomlProviderError {
    /// The file could not be read.
    #[error("reading {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid TOML.
    #[error("parsing {id}: {source}")]
    Parse {
        /// Provider id.
        id: String,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Provider over a flattened TOML document.
#[derive(Debug, Clone)]
pub struct TomlProvider {
    id: String,
    values: HashMap<String, String>,
}

impl TomlProvider {
    /// Loads `path`; id `"toml:<path>"`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TomlProviderError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TomlProviderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(format!("toml:{}", path.display()), &text)
    }

    /// Parses `text`, reporting `id` as the provider identifier.
    pub fn parse(id: impl Into<String>, text: &str) -> Result<Self, TomlProviderError> {
        let id = id.into();
        let table: Table = text.parse().map_err(|source| TomlProviderError::Parse {
            id: id.clone(),
            source,
        })?;
        let mut values = HashMap::new();
        flatten(&mut values, "", &table);
        Ok(Self { id, values })
    }
}

fn flatten(out: &mut HashMap<String, String>, prefix: &str, table: &Table) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Table(inner) => flatten(out, &path, inner),
            other => {
                let text = scalar(other);
                out.insert(path.replace('.', "_").to_uppercase(), text.clone());
                out.insert(path, text);
            }
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(scalar).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

impl ConfigProvider for TomlProvider {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values
            .get(key)
            .map(|v| ConfigValue::new(v.clone(), self.id.clone()))
    }

    fn name(&self) -> &'static str {
        "TomlProvider"
    }
}
