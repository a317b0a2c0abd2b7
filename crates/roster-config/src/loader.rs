//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::{RosterConfig, BACKEND_IN_MEMORY, BACKEND_JSON_FILE};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load full Roster configuration from YAML file.
pub fn load_config(path: &Path) -> Result<RosterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RosterConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &RosterConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.app.name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "app.name must not be empty".to_string(),
        ));
    }

    if config.engine.max_occurrences == 0 {
        return Err(ConfigError::Invalid(
            "engine.max_occurrences must be > 0".to_string(),
        ));
    }

    if config.engine.recurrence_clamp_days == 0 {
        return Err(ConfigError::Invalid(
            "engine.recurrence_clamp_days must be > 0".to_string(),
        ));
    }

    match config.store.backend.as_str() {
        BACKEND_IN_MEMORY => {}
        BACKEND_JSON_FILE => {
            let has_path = config
                .store
                .path
                .as_deref()
                .is_some_and(|p| !p.trim().is_empty());
            if !has_path {
                return Err(ConfigError::Invalid(
                    "store.path is required for the json_file backend".to_string(),
                ));
            }
        }
        other => {
            return Err(ConfigError::Invalid(format!(
                "store.backend '{}' is not supported",
                other
            )));
        }
    }

    if config.observability.log_level.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "observability.log_level must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config_accepts_defaults() {
        let config = RosterConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.engine.max_occurrences, 300);
        assert_eq!(config.engine.recurrence_clamp_days, 28);
        assert_eq!(config.store.backend, "in_memory");
    }

    #[test]
    fn test_load_config_fills_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.yaml");
        fs::write(
            &path,
            "version: 1\nengine:\n  max_occurrences: 50\nstore:\n  backend: json_file\n  path: data/shifts.json\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.engine.max_occurrences, 50);
        assert_eq!(config.engine.recurrence_clamp_days, 28);
        assert_eq!(config.store.path.as_deref(), Some("data/shifts.json"));
        assert_eq!(config.app.name, "roster");
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_validate_config_rejects_json_file_without_path() {
        let mut config = RosterConfig::default();
        config.store.backend = "json_file".to_string();

        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_validate_config_rejects_unknown_backend_and_zero_cap() {
        let mut config = RosterConfig::default();
        config.store.backend = "postgres".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid(_))
        ));

        let mut config = RosterConfig::default();
        config.engine.max_occurrences = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_config_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(&dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_bundled_default_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../..")
            .join(crate::DEFAULT_CONFIG_FILE);

        let config = load_config(&path).unwrap();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.store.backend, BACKEND_JSON_FILE);
        assert_eq!(config.store.path.as_deref(), Some("data/shifts.json"));
        assert_eq!(config.engine.max_occurrences, 300);
    }
}
