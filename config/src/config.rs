//! # Configuration Structures
//!
//! All configuration structures for the AI resilience layer.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization with per-field defaults
//! - Use `validator` for input validation
//! - Default to the policy constants the components were tuned with

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main configuration structure.
///
/// Aggregates one sub-configuration per component. Each component
/// constructor takes only its own section.
///
/// ## Usage
/// ```rust,no_run
/// use config::Config;
///
/// let config = Config::default();
/// println!("Redis: {}", config.redis.connection_url());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Config {
    /// Shared metrics store (Redis) connection and key namespace
    #[serde(default)]
    #[validate(nested)]
    pub redis: RedisConfig,

    /// Retry executor behaviour
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig,

    /// Content-addressed result cache
    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheConfig,

    /// Usage analytics retention and windows
    #[serde(default)]
    #[validate(nested)]
    pub analytics: AnalyticsConfig,

    /// Per-model reliability monitor thresholds
    #[serde(default)]
    #[validate(nested)]
    pub monitor: MonitorConfig,

    /// Cross-cutting usage anomaly thresholds
    #[serde(default)]
    #[validate(nested)]
    pub anomaly: AnomalyConfig,

    /// Error tracker retention and forwarding
    #[serde(default)]
    #[validate(nested)]
    pub tracking: TrackingConfig,

    /// Logging and metrics
    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct RedisConfig {
    #[serde(default = "default_redis_host")]
    #[validate(length(min = 1, max = 255))]
    pub host: String,

    #[serde(default = "default_redis_port")]
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    #[serde(default)]
    #[validate(range(min = 0, max = 15))]
    pub db: u8,

    /// Prefix for every key this layer writes
    #[serde(default = "default_redis_namespace")]
    #[validate(length(min = 1, max = 64))]
    pub namespace: String,
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_redis_namespace() -> String {
    "ai".to_string()
}

impl RedisConfig {
    pub fn connection_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
            db: 0,
            namespace: default_redis_namespace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct RetryConfig {
    /// Deterministic mode: plans are computed and logged but the executor
    /// does not sleep between attempts.
    #[serde(default)]
    pub skip_delays: bool,

    /// Upper bound applied to every planned delay
    #[serde(default = "default_max_delay_seconds")]
    #[validate(range(min = 0.0, max = 600.0))]
    pub max_delay_seconds: f64,

    /// Retry-event history kept per operation type
    #[serde(default = "default_retry_event_capacity")]
    #[validate(range(min = 1, max = 1000))]
    pub event_capacity: usize,

    /// Retention of the per-day retry counters
    #[serde(default = "default_counter_retention_days")]
    #[validate(range(min = 1, max = 366))]
    pub counter_retention_days: u32,
}

fn default_max_delay_seconds() -> f64 {
    60.0
}

fn default_retry_event_capacity() -> usize {
    50
}

fn default_counter_retention_days() -> u32 {
    32
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            skip_delays: false,
            max_delay_seconds: default_max_delay_seconds(),
            event_capacity: default_retry_event_capacity(),
            counter_retention_days: default_counter_retention_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    #[serde(default = "default_analysis_ttl_hours")]
    #[validate(range(min = 1, max = 8760))]
    pub analysis_ttl_hours: u64,

    #[serde(default = "default_document_ttl_hours")]
    #[validate(range(min = 1, max = 8760))]
    pub document_ttl_hours: u64,

    /// Inputs at or below this size are hashed over their full content;
    /// larger ones over metadata only.
    #[serde(default = "default_small_content_threshold_bytes")]
    #[validate(range(min = 1))]
    pub small_content_threshold_bytes: usize,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_analysis_ttl_hours() -> u64 {
    24 * 7
}

fn default_document_ttl_hours() -> u64 {
    24
}

fn default_small_content_threshold_bytes() -> usize {
    1024 * 1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            analysis_ttl_hours: default_analysis_ttl_hours(),
            document_ttl_hours: default_document_ttl_hours(),
            small_content_threshold_bytes: default_small_content_threshold_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct AnalyticsConfig {
    /// Daily/monthly aggregate retention
    #[serde(default = "default_aggregate_retention_days")]
    #[validate(range(min = 1, max = 366))]
    pub aggregate_retention_days: u32,

    /// Retention of the full per-call usage records
    #[serde(default = "default_record_retention_days")]
    #[validate(range(min = 1, max = 3650))]
    pub record_retention_days: u32,

    #[serde(default = "default_window_size")]
    #[validate(range(min = 1, max = 10000))]
    pub latency_window_size: usize,
}

fn default_aggregate_retention_days() -> u32 {
    32
}

fn default_record_retention_days() -> u32 {
    90
}

fn default_window_size() -> usize {
    100
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            aggregate_retention_days: default_aggregate_retention_days(),
            record_retention_days: default_record_retention_days(),
            latency_window_size: default_window_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct MonitorConfig {
    #[serde(default = "default_window_size")]
    #[validate(range(min = 1, max = 10000))]
    pub window_size: usize,

    /// Samples (or requests today) required before any check fires
    #[serde(default = "default_min_samples")]
    #[validate(range(min = 1, max = 10000))]
    pub min_samples: usize,

    #[serde(default = "default_latency_multiplier")]
    #[validate(range(min = 1.0))]
    pub latency_multiplier: f64,

    #[serde(default = "default_error_rate_threshold_percent")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub error_rate_threshold_percent: f64,

    #[serde(default = "default_cost_multiplier")]
    #[validate(range(min = 1.0))]
    pub cost_multiplier: f64,

    #[serde(default = "default_alert_retention_hours")]
    #[validate(range(min = 1, max = 720))]
    pub alert_retention_hours: u64,

    #[serde(default = "default_alert_capacity")]
    #[validate(range(min = 1, max = 1000))]
    pub alert_capacity: usize,

    #[serde(default = "default_aggregate_retention_days")]
    #[validate(range(min = 1, max = 366))]
    pub counter_retention_days: u32,
}

fn default_min_samples() -> usize {
    10
}

fn default_latency_multiplier() -> f64 {
    2.5
}

fn default_error_rate_threshold_percent() -> f64 {
    20.0
}

fn default_cost_multiplier() -> f64 {
    3.0
}

fn default_alert_retention_hours() -> u64 {
    24
}

fn default_alert_capacity() -> usize {
    50
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            min_samples: default_min_samples(),
            latency_multiplier: default_latency_multiplier(),
            error_rate_threshold_percent: default_error_rate_threshold_percent(),
            cost_multiplier: default_cost_multiplier(),
            alert_retention_hours: default_alert_retention_hours(),
            alert_capacity: default_alert_capacity(),
            counter_retention_days: default_aggregate_retention_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct AnomalyConfig {
    /// Number of equal-length previous periods averaged into the baseline
    #[serde(default = "default_baseline_periods")]
    #[validate(range(min = 1, max = 90))]
    pub baseline_periods: u32,

    #[serde(default = "default_request_multiplier")]
    #[validate(range(min = 1.0))]
    pub request_multiplier: f64,

    #[serde(default = "default_anomaly_cost_multiplier")]
    #[validate(range(min = 1.0))]
    pub cost_multiplier: f64,

    #[serde(default = "default_anomaly_error_rate_percent")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub error_rate_percent: f64,

    #[serde(default = "default_latency_seconds")]
    #[validate(range(min = 0.0))]
    pub latency_seconds: f64,

    #[serde(default = "default_burst_per_minute")]
    #[validate(range(min = 1))]
    pub burst_per_minute: u64,
}

fn default_baseline_periods() -> u32 {
    7
}

fn default_request_multiplier() -> f64 {
    3.0
}

fn default_anomaly_cost_multiplier() -> f64 {
    4.0
}

fn default_anomaly_error_rate_percent() -> f64 {
    15.0
}

fn default_latency_seconds() -> f64 {
    30.0
}

fn default_burst_per_minute() -> u64 {
    100
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            baseline_periods: default_baseline_periods(),
            request_multiplier: default_request_multiplier(),
            cost_multiplier: default_anomaly_cost_multiplier(),
            error_rate_percent: default_anomaly_error_rate_percent(),
            latency_seconds: default_latency_seconds(),
            burst_per_minute: default_burst_per_minute(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct TrackingConfig {
    #[serde(default = "default_tracking_retention_days")]
    #[validate(range(min = 1, max = 366))]
    pub retention_days: u32,

    /// Forward `error`/`fatal` events to the monitoring sink
    #[serde(default = "default_forward_to_sink")]
    pub forward_to_sink: bool,

    #[serde(default = "default_recent_capacity")]
    #[validate(range(min = 1, max = 1000))]
    pub recent_capacity: usize,
}

fn default_tracking_retention_days() -> u32 {
    30
}

fn default_forward_to_sink() -> bool {
    true
}

fn default_recent_capacity() -> usize {
    100
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            retention_days: default_tracking_retention_days(),
            forward_to_sink: default_forward_to_sink(),
            recent_capacity: default_recent_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    /// Enable `metrics` facade emission
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,

    #[serde(default = "default_logging_level")]
    #[validate(custom(function = "validate_logging_level"))]
    pub logging_level: String,
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

fn validate_logging_level(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid logging level")),
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
            logging_level: default_logging_level(),
        }
    }
}
