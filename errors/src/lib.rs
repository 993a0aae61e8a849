//! # Resilience Errors
//!
//! Error types shared by every crate of the AI resilience layer.
//!
//! Follows the workspace conventions:
//! - Uses `thiserror` for structured error definitions
//! - Named fields in every variant so messages stay self-describing
//! - Observability code never propagates these to the caller of the primary
//!   AI operation; they surface only from storage and configuration APIs

use serde::Serialize;
use thiserror::Error;

/// Storage layer errors raised by `MetricsStore` implementations.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum StorageError {
    #[error("Connection to {backend} failed: {reason}")]
    ConnectionError { backend: String, reason: String },

    #[error("Query on {backend} failed: {reason}")]
    QueryError { backend: String, reason: String },

    #[error("Serialization error: {error_type} - {reason}")]
    SerializationError { error_type: String, reason: String },

    #[error("Backend {backend} unavailable: {reason}")]
    Unavailable { backend: String, reason: String },
}

impl StorageError {
    pub fn query(backend: &str, reason: impl ToString) -> Self {
        StorageError::QueryError {
            backend: backend.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn json(reason: impl ToString) -> Self {
        StorageError::SerializationError {
            error_type: "JSON".to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },

    #[error("Failed to read configuration file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse {format} configuration: {reason}")]
    Parse { format: String, reason: String },

    #[error("Invalid value for environment variable {key}: {reason}")]
    Env { key: String, reason: String },
}

/// Error tracking input errors.
///
/// `ErrorTracker::track` maps these to a `false` return; they exist so the
/// validation step can be tested and logged precisely.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("Unknown error kind: {kind}")]
    UnknownErrorKind { kind: String },

    #[error("Unknown severity: {severity}")]
    UnknownSeverity { severity: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let conn_error = StorageError::ConnectionError {
            backend: "Redis".to_string(),
            reason: "Connection refused".to_string(),
        };
        let query_error = StorageError::query("Redis", "Command failed");

        assert_eq!(
            conn_error.to_string(),
            "Connection to Redis failed: Connection refused"
        );
        assert_eq!(
            query_error.to_string(),
            "Query on Redis failed: Command failed"
        );
    }

    #[test]
    fn test_error_messages_include_backend_name() {
        let errors = vec![
            StorageError::ConnectionError {
                backend: "Redis".to_string(),
                reason: "test".to_string(),
            },
            StorageError::query("Redis", "test"),
            StorageError::json("test"),
            StorageError::Unavailable {
                backend: "Redis".to_string(),
                reason: "test".to_string(),
            },
        ];

        for error in errors {
            let msg = error.to_string();
            assert!(
                msg.contains("Redis") || msg.contains("JSON"),
                "Error message should contain backend or error type: {}",
                msg
            );
        }
    }

    #[test]
    fn test_tracking_error_display() {
        let err = TrackingError::UnknownErrorKind {
            kind: "validation_error".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown error kind: validation_error");

        let err = TrackingError::UnknownSeverity {
            severity: "panic".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown severity: panic");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Parse {
            format: "TOML".to_string(),
            reason: "expected `=`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse TOML configuration: expected `=`"
        );
    }
}
