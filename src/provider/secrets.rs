//! Secrets-directory provider (one file per key, as mounted by docker/k8s).

use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::{ConfigProvider, ConfigValue};

/// Reads `<dir>/<KEY>`; a single trailing newline is trimmed.
///
/// Keys containing path separators or `..` are never looked up.
#[derive(Debug, Clone)]
pub struct SecretsDirProvider {
    dir: PathBuf,
    id: String,
}

impl SecretsDirProvider {
    /// Provider over `dir`, id `"secrets:<dir>"`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let id = format!("secrets:{}", dir.display());
        Self { dir, id }
    }
}

impl ConfigProvider for SecretsDirProvider {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            return None;
        }
        let path = self.dir.join(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %path.display(), error = %err, provider = %self.id, "secret file unreadable, treated as absent");
                return None;
            }
        };
        let value = raw
            .strip_suffix("\r\n")
            .or_else(|| raw.strip_suffix('\n'))
            .unwrap_or(&raw);
        Some(ConfigValue::new(value, self.id.clone()))
    }

    fn name(&self) -> &'static str {
        "SecretsDirProvider"
    }
}
