use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::diagnostics::DEFAULT_DIAGNOSTICS_CAPACITY;
use crate::log::{FileStorage, DEFAULT_STORAGE_KEY};

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Where the event log is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage key the whole log is written under (default: "screenflow.eventLog").
    #[serde(default = "default_storage_key")]
    pub key: String,
    /// Directory holding persisted keys. Defaults to the platform data dir.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// When false the runtime keeps the log in memory only (default: true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Diagnostics surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Number of stage records retained (default: 256).
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_capacity() -> usize {
    DEFAULT_DIAGNOSTICS_CAPACITY
}

impl StorageConfig {
    /// Configured directory, or the platform default.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(FileStorage::default_dir)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: default_storage_key(),
            dir: None,
            enabled: default_enabled(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}
