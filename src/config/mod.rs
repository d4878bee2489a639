//! Service Configuration Module
//!
//! Provides the service configuration loaded from a TOML file. Water-quality
//! thresholds are operator-tunable here; their defaults match the values in
//! `types::thresholds`.
//!
//! ## Loading Order
//!
//! 1. `--config` CLI flag (must exist and parse)
//! 2. `TANKWATCH_CONFIG` environment variable (path to TOML file)
//! 3. `tankwatch.toml` in the current working directory
//! 4. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! let config = TankwatchConfig::load(cli_path.as_deref())?;
//! config.validate()?;
//! ```

mod tankwatch_config;
pub mod defaults;
pub mod validation;

pub use tankwatch_config::*;

use std::sync::OnceLock;

/// Process-wide configuration, installed once at startup.
static CONFIG: OnceLock<TankwatchConfig> = OnceLock::new();

/// Install the process-wide configuration. Later calls are ignored.
pub fn init(config: TankwatchConfig) {
    if CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// The process-wide configuration.
///
/// Before `init()` this installs and returns the built-in defaults, after
/// which `init()` has no effect.
pub fn get() -> &'static TankwatchConfig {
    CONFIG.get_or_init(TankwatchConfig::default)
}

pub fn is_initialized() -> bool {
    CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_get() {
        let mut custom = TankwatchConfig::default();
        custom.server.addr = "127.0.0.1:7070".to_string();

        init(custom.clone());
        assert!(is_initialized());
        assert_eq!(get(), &custom);

        // Second install is ignored.
        init(TankwatchConfig::default());
        assert_eq!(get().server.addr, "127.0.0.1:7070");
    }
}
