//! # AI Resilience Core
//!
//! Shared types, traits, and key helpers for the AI-operation resilience
//! layer.
//!
//! This crate provides:
//! - The closed `ErrorKind` taxonomy that drives retry policy
//! - Retry plan and input-modification types
//! - Usage, error, and anomaly records
//! - The `MetricsStore` and `MonitoringSink` seams every component consumes
//!
//! # Best Practices
//!
//! - Uses Rust Edition 2024
//! - Exhaustive `match` tables instead of string-keyed lookups
//! - Comprehensive error handling with `thiserror`

pub mod fault;
pub mod keys;
pub mod traits;
pub mod types;

pub use fault::AiFault;
pub use keys::KeySpace;
pub use traits::{MetricsStore, MonitoringSink};
pub use types::{
    AlertSeverity, AnomalyAlert, AnomalyType, Complexity, ErrorKind, ErrorRecord, ExpectedRange,
    InputModifications, MonitoringEvent, RetryPlan, RetryStrategy, Severity, UsageRecord,
};
