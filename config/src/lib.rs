//! # Configuration System
//!
//! Centralized configuration for the AI resilience layer.
//!
//! This crate provides:
//! - Configuration structures for every component
//! - Configuration file loading (TOML/YAML)
//! - Environment variable overrides (12-factor app principles)
//! - Configuration precedence (env > file > defaults)
//! - Configuration validation with the `validator` crate

pub mod config;
pub mod file_loader;
pub mod loader;

pub use config::{
    AnalyticsConfig, AnomalyConfig, CacheConfig, Config, MonitorConfig, ObservabilityConfig,
    RedisConfig, RetryConfig, TrackingConfig,
};
pub use file_loader::{load_from_file, load_from_toml, load_from_yaml};
pub use loader::{apply_env, load_from_env};
pub use validator::Validate;

use errors::ConfigError;
use std::path::Path;

/// Load the effective configuration: defaults, then the optional file, then
/// environment overrides, then validation.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let base = match path {
        Some(path) => load_from_file(path)?,
        None => Config::default(),
    };
    let config = apply_env(base)?;
    config.validate().map_err(|e| ConfigError::Invalid {
        reason: e.to_string(),
    })?;
    tracing::debug!(namespace = %config.redis.namespace, "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[redis]\nhost = \"from-file\"\nport = 6390\n")
            .unwrap();

        unsafe {
            std::env::set_var("RD_HOST", "from-env");
        }
        let config = load(Some(file.path()));
        unsafe {
            std::env::remove_var("RD_HOST");
        }

        let config = config.unwrap();
        assert_eq!(config.redis.host, "from-env");
        assert_eq!(config.redis.port, 6390);
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_values() {
        unsafe {
            std::env::set_var("OB_LOGGING_LEVEL", "loud");
        }
        let result = load(None);
        unsafe {
            std::env::remove_var("OB_LOGGING_LEVEL");
        }
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
