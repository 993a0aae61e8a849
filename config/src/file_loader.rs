//! # Configuration File Loading
//!
//! Loads configuration from TOML or YAML files, detecting the format from
//! the file extension. Missing sections and fields fall back to defaults.

use crate::config::Config;
use errors::ConfigError;
use std::path::Path;

pub fn load_from_toml(path: &Path) -> Result<Config, ConfigError> {
    let contents = read(path)?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        format: "TOML".to_string(),
        reason: e.to_string(),
    })
}

pub fn load_from_yaml(path: &Path) -> Result<Config, ConfigError> {
    let contents = read(path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        format: "YAML".to_string(),
        reason: e.to_string(),
    })
}

/// Load configuration from file with auto-detection.
///
/// ## Supported Formats
/// - `.toml`: TOML format
/// - `.yaml` / `.yml`: YAML format
pub fn load_from_file(path: &Path) -> Result<Config, ConfigError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("toml") => load_from_toml(path),
        Some("yaml" | "yml") => load_from_yaml(path),
        Some(other) => Err(ConfigError::Invalid {
            reason: format!("Unsupported config file format: {}", other),
        }),
        None => Err(ConfigError::Invalid {
            reason: "Config file has no extension".to_string(),
        })
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
