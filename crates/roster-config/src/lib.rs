//! # Roster Config
//!
//! Single-file configuration for Roster.
//! A single `configs/roster.yaml` configures the engine limits, the shift store
//! backend and observability settings.

mod loader;

pub use loader::{load_config, validate_config, ConfigError};

use serde::Deserialize;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "configs/roster.yaml";

/// Store backend holding shifts only in process memory.
pub const BACKEND_IN_MEMORY: &str = "in_memory";

/// Store backend persisting shifts to a JSON snapshot file.
pub const BACKEND_JSON_FILE: &str = "json_file";

/// Top-level configuration schema for Roster.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub store: StoreSpec,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            engine: EngineConfig::default(),
            store: StoreSpec::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_env(),
        }
    }
}

fn default_app_name() -> String {
    "roster".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on occurrences produced by one series expansion.
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: usize,
    /// Days granted to a series whose start was moved past its end date.
    #[serde(default = "default_recurrence_clamp_days")]
    pub recurrence_clamp_days: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_occurrences: default_max_occurrences(),
            recurrence_clamp_days: default_recurrence_clamp_days(),
        }
    }
}

fn default_max_occurrences() -> usize {
    300
}

fn default_recurrence_clamp_days() -> u64 {
    28
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSpec {
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Snapshot path, required by the `json_file` backend.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for StoreSpec {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
        }
    }
}

fn default_backend() -> String {
    BACKEND_IN_MEMORY.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
