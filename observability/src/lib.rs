//! # Observability
//!
//! Usage, reliability, and error observability for AI operations:
//! - Usage analytics with daily/monthly cost roll-ups
//! - LLM reliability monitoring with latency, error-rate, and cost anomalies
//! - Usage anomaly detection with risk scoring
//! - Structured error tracking with optional external forwarding
//! - `metrics` facade telemetry

pub mod error_tracker;
pub mod pricing;
pub mod reliability;
pub mod sink;
pub mod telemetry;
pub mod usage_analytics;
pub mod usage_anomaly;

pub use error_tracker::{ErrorCounts, ErrorTracker};
pub use pricing::{ModelPrice, PriceTable};
pub use reliability::{LlmObservation, LlmReliabilityMonitor, ModelPerformance};
pub use sink::{NoopSink, TracingSink};
pub use telemetry::ResilienceTelemetry;
pub use usage_analytics::{CostScope, UsageAnalytics, WindowMetrics};
pub use usage_anomaly::{
    Assessment, RiskAssessment, RiskSeverity, UsageAnomaly, UsageAnomalyDetector,
    UsageAnomalyType,
};
