//! Configuration types.

use dpdp_compliance::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DpdpConfig {
    /// Compliance engine settings.
    pub engine: EngineConfig,
    /// Where records and the audit log live.
    pub storage: StorageConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local; state is lost on exit.
    Memory,
    /// A single SQLite database file.
    #[default]
    Sqlite,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file for the SQLite backend.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_path: PathBuf::from("dpdp.db"),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `dpdp_compliance=debug`.
    pub level: String,
    /// One of `pretty`, `compact` or `json`.
    pub format: String,
    /// Also write logs to this file.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Accepted values of `format`.
    pub const FORMATS: [&'static str; 3] = ["pretty", "compact", "json"];
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}
