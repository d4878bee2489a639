//! Tankwatch configuration: server, storage and water-quality thresholds
//!
//! Every struct implements `Default`, so an empty or missing config file
//! yields the built-in behavior.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use super::validation::unknown_keys;
use crate::types::HealthThresholds;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a tankwatch deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TankwatchConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Record storage backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Water-quality classification thresholds
    #[serde(default)]
    pub health: HealthThresholds,
}

impl TankwatchConfig {
    /// Load configuration using the standard search order:
    /// 1. `explicit` path (from `--config`); failures are returned
    /// 2. `$TANKWATCH_CONFIG`; failures fall back with a warning
    /// 3. `./tankwatch.toml`; failures fall back with a warning
    /// 4. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), "Loaded config from --config");
            return Ok(config);
        }

        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", defaults::CONFIG_ENV_VAR);
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", defaults::CONFIG_FILE_NAME);
                    return Ok(config);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::CONFIG_FILE_NAME);
                }
            }
        }

        info!("No {} found, using built-in defaults", defaults::CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys are logged, not rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for unknown in unknown_keys(contents) {
            warn!("{}", unknown);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "server.addr: '{}' is not a valid socket address",
                self.server.addr
            ));
        }

        if self.storage.backend == StorageBackend::Sled
            && self.storage.path.as_os_str().is_empty()
        {
            errors.push("storage.path: required for the sled backend".to_string());
        }

        let numbers = [
            self.health.temperature.critical_min,
            self.health.temperature.critical_max,
            self.health.temperature.ideal,
            self.health.temperature.tolerance,
            self.health.ph.critical_min,
            self.health.ph.critical_max,
            self.health.ph.ideal,
            self.health.ph.tolerance,
            self.health.oxygen.critical_below,
            self.health.oxygen.warning_below,
            self.health.ammonia.max,
            self.health.nitrite.max,
            self.health.nitrate.max,
            self.health.ceiling_warning_fraction,
        ];
        if numbers.iter().any(|v| !v.is_finite()) {
            errors.push("health: all thresholds must be finite".to_string());
        } else {
            errors.extend(self.health.validate());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            ConfigError::Parse(_, e) => Some(e),
            ConfigError::Serialize(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `TANKWATCH_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sled,
    /// Not durable; for demos and tests
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(defaults::SLED_PATH)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = TankwatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.addr, "0.0.0.0:8080");
        assert_eq!(config.storage.backend, StorageBackend::Sled);
        assert_eq!(config.health, HealthThresholds::default());
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let config = TankwatchConfig::from_toml_str("").unwrap();
        assert_eq!(config, TankwatchConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let raw = r#"
            [storage]
            backend = "memory"

            [health.oxygen]
            critical_below = 4.0
            warning_below = 6.5
        "#;
        let config = TankwatchConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!((config.health.oxygen.warning_below - 6.5).abs() < f64::EPSILON);
        // Untouched tables keep their defaults.
        assert_eq!(config.health.ph, HealthThresholds::default().ph);
    }

    #[test]
    fn test_inconsistent_thresholds_rejected() {
        let raw = r#"
            [health.oxygen]
            critical_below = 9.0
            warning_below = 8.0
        "#;
        match TankwatchConfig::from_toml_str(raw) {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("health.oxygen")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_warning_band_outside_critical_range_rejected() {
        let raw = r#"
            [health.temperature]
            critical_min = 20.0
            critical_max = 28.0
            ideal = 27.0
            tolerance = 2.0
        "#;
        match TankwatchConfig::from_toml_str(raw) {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.starts_with("health.temperature: ideal ±")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_addr_rejected() {
        let result = TankwatchConfig::from_toml_str("[server]\naddr = \"not-an-addr\"\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\naddr = \"127.0.0.1:9100\"").unwrap();

        let config = TankwatchConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:9100");
    }

    #[test]
    fn test_load_explicit_missing_file_errors() {
        let result = TankwatchConfig::load(Some(Path::new("/nonexistent/tankwatch.toml")));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    fn test_toml_round_trip_preserves_thresholds() {
        let mut config = TankwatchConfig::default();
        config.health.nitrate.max = 25.0;
        let text = config.to_toml().unwrap();
        let parsed = TankwatchConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
