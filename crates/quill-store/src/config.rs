use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Name of the optional config file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "store.toml";

/// Settings for the on-disk store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// File name of the database inside the config directory.
    pub file_name: String,
    /// How long the file stays open after the last operation.
    pub idle_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file_name: "quill.db".into(),
            idle_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `store.toml` from `dir`, falling back to defaults if it does not exist.
    pub fn load(dir: &Path) -> StoreResult<Self> {
        match fs::read_to_string(dir.join(CONFIG_FILE_NAME)) {
            Ok(s) => Self::from_toml_str(&s),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.file_name.is_empty() {
            return Err(StoreError::Config("file_name is empty".into()));
        }
        if self.file_name.contains(['/', '\\']) {
            return Err(StoreError::Config(format!(
                "file_name must not contain a path separator: {}",
                self.file_name
            )));
        }
        if self.idle_timeout_ms == 0 {
            return Err(StoreError::Config("idle_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}
