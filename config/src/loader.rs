//! # Environment Variable Loader
//!
//! Overlays environment variables onto a base configuration following
//! 12-factor app principles.
//!
//! # Naming Convention
//! - `RD_*`: Redis / metrics store settings
//! - `RT_*`: Retry executor settings
//! - `CC_*`: Content cache settings
//! - `MN_*`: Reliability monitor settings
//! - `OB_*`: Observability settings

use crate::config::Config;
use errors::ConfigError;
use std::env;
use std::str::FromStr;

/// Load configuration from environment variables on top of the defaults.
///
/// ## Environment Variables
/// - `RD_HOST`, `RD_PORT`, `RD_DB`, `RD_NAMESPACE`
/// - `RT_SKIP_DELAYS`, `RT_MAX_DELAY_SECONDS`
/// - `CC_ENABLED`, `CC_ANALYSIS_TTL_HOURS`, `CC_DOCUMENT_TTL_HOURS`,
///   `CC_SMALL_CONTENT_THRESHOLD_BYTES`
/// - `MN_LATENCY_MULTIPLIER`, `MN_ERROR_RATE_THRESHOLD_PERCENT`,
///   `MN_COST_MULTIPLIER`
/// - `OB_METRICS_ENABLED`, `OB_LOGGING_LEVEL`
pub fn load_from_env() -> Result<Config, ConfigError> {
    apply_env(Config::default())
}

/// Override every field whose environment variable is set. Unset variables
/// leave the field untouched; set-but-unparsable ones are an error.
pub fn apply_env(mut config: Config) -> Result<Config, ConfigError> {
    override_from_env("RD_HOST", &mut config.redis.host)?;
    override_from_env("RD_PORT", &mut config.redis.port)?;
    override_from_env("RD_DB", &mut config.redis.db)?;
    override_from_env("RD_NAMESPACE", &mut config.redis.namespace)?;

    override_from_env("RT_SKIP_DELAYS", &mut config.retry.skip_delays)?;
    override_from_env("RT_MAX_DELAY_SECONDS", &mut config.retry.max_delay_seconds)?;

    override_from_env("CC_ENABLED", &mut config.cache.enabled)?;
    override_from_env("CC_ANALYSIS_TTL_HOURS", &mut config.cache.analysis_ttl_hours)?;
    override_from_env("CC_DOCUMENT_TTL_HOURS", &mut config.cache.document_ttl_hours)?;
    override_from_env(
        "CC_SMALL_CONTENT_THRESHOLD_BYTES",
        &mut config.cache.small_content_threshold_bytes,
    )?;

    override_from_env("MN_LATENCY_MULTIPLIER", &mut config.monitor.latency_multiplier)?;
    override_from_env(
        "MN_ERROR_RATE_THRESHOLD_PERCENT",
        &mut config.monitor.error_rate_threshold_percent,
    )?;
    override_from_env("MN_COST_MULTIPLIER", &mut config.monitor.cost_multiplier)?;

    override_from_env("OB_METRICS_ENABLED", &mut config.observability.metrics_enabled)?;
    override_from_env("OB_LOGGING_LEVEL", &mut config.observability.logging_level)?;

    Ok(config)
}

fn override_from_env<T>(key: &str, field: &mut T) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display
{
    if let Some(value) = parse_env::<T>(key)? {
        *field = value;
    }
    Ok(())
}

fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display
{
    match env::var(key) {
        Ok(s) => s.trim().parse::<T>().map(Some).map_err(|e| ConfigError::Env {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_from_env_defaults() {
        unsafe {
            env::remove_var("RD_HOST");
            env::remove_var("RT_SKIP_DELAYS");
            env::remove_var("OB_LOGGING_LEVEL");
        }
        let config = load_from_env().unwrap();
        assert_eq!(config.redis.host, "localhost");
        assert!(!config.retry.skip_delays);
        assert_eq!(config.observability.logging_level, "info");
    }

    #[test]
    #[serial]
    fn test_load_from_env_overrides() {
        unsafe {
            env::set_var("RD_HOST", "redis.internal");
            env::set_var("RD_PORT", "6380");
            env::set_var("RT_SKIP_DELAYS", "true");
            env::set_var("MN_LATENCY_MULTIPLIER", "3.5");
        }

        let config = load_from_env();

        unsafe {
            env::remove_var("RD_HOST");
            env::remove_var("RD_PORT");
            env::remove_var("RT_SKIP_DELAYS");
            env::remove_var("MN_LATENCY_MULTIPLIER");
        }

        let config = config.unwrap();
        assert_eq!(config.redis.host, "redis.internal");
        assert_eq!(config.redis.port, 6380);
        assert!(config.retry.skip_delays);
        assert_eq!(config.monitor.latency_multiplier, 3.5);
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_is_reported() {
        unsafe {
            env::set_var("RD_PORT", "not_a_port");
        }
        let result = load_from_env();
        unsafe {
            env::remove_var("RD_PORT");
        }

        match result {
            Err(ConfigError::Env { key, .. }) => assert_eq!(key, "RD_PORT"),
            other => panic!("Expected Env error, got {:?}", other)
        }
    }

    #[test]
    fn test_parse_env_missing() {
        let result: Option<u32> = parse_env("AI_RESILIENCE_NONEXISTENT_VAR").unwrap();
        assert!(result.is_none());
    }
}
