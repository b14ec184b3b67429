//! Recorder binary configuration.

use bstat_core::RecorderConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "bstat.toml";

/// Top-level configuration.
///
/// ```toml
/// log_level = "debug"
///
/// [recorder]
/// component = "wpcore"
/// context_timeout_ms = 250
///
/// [context]
/// blog = 3
/// variations = { x1 = "control" }
///
/// [store]
/// path = "/var/log/bstat/footsteps.jsonl"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Recorder settings.
    pub recorder: RecorderConfig,
    /// Fixed context values.
    pub context: ContextConfig,
    /// Footstep log settings.
    pub store: StoreConfig,
}

impl AppConfig {
    /// Returns the configured log level, defaulting to `info`.
    pub fn log_level(&self) -> &str {
        if self.log_level.is_empty() {
            "info"
        } else {
            &self.log_level
        }
    }
}

/// Context values attached to every footstep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Site identity.
    pub blog: u64,
    /// Session identifier. A fresh one is generated per run when unset.
    pub session: Option<String>,
    /// Variation labels keyed by slot (`x1`..`x7`).
    pub variations: HashMap<String, String>,
}

/// Footstep log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON Lines log.
    pub path: PathBuf,
    /// Sync each line to disk before acknowledging it.
    pub sync_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("footsteps.jsonl"),
            sync_writes: false,
        }
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let content =
        std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::IoError(e.to_string()))?;
    parse_config(&content)
}

/// Loads configuration from a TOML file, falling back to defaults when the
/// file does not exist.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        Ok(AppConfig::default())
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}
