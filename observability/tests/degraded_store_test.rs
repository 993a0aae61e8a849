//! Every observability component keeps working, reading zeros and
//! returning `false`/empty, when the metrics store is unreachable.

use ai_core::keys::today;
use ai_core::{ErrorKind, KeySpace, MetricsStore, Severity, UsageRecord};
use config::{AnalyticsConfig, MonitorConfig, TrackingConfig};
use observability::{
    CostScope, ErrorTracker, LlmObservation, LlmReliabilityMonitor, ResilienceTelemetry,
    UsageAnalytics, WindowMetrics,
};
use serde_json::json;
use std::sync::Arc;
use testing::{RecordingSink, UnavailableStore};

fn store() -> Arc<dyn MetricsStore> {
    Arc::new(UnavailableStore)
}

#[tokio::test]
async fn test_analytics_degrades_to_zero() {
    let analytics = UsageAnalytics::new(store(), KeySpace::default(), AnalyticsConfig::default())
        .with_telemetry(ResilienceTelemetry::disabled());

    analytics
        .record(&UsageRecord::new("form_generation", "gpt-4o", 0.2, 10, 100, true))
        .await;

    assert_eq!(analytics.success_rate("form_generation", today()).await, 0.0);
    assert_eq!(analytics.average_latency("form_generation").await, 0.0);
    assert_eq!(analytics.daily_cost(&CostScope::Platform, today()).await, 0.0);
    assert_eq!(analytics.window_metrics(today()).await, WindowMetrics::default());
}

#[tokio::test]
async fn test_monitor_yields_no_alerts() {
    let monitor = LlmReliabilityMonitor::new(store(), KeySpace::default(), MonitorConfig::default())
        .with_telemetry(ResilienceTelemetry::disabled());

    let alerts = monitor
        .observe(&LlmObservation::failure("gpt-4o", "op", ErrorKind::LlmError, 100))
        .await;
    assert!(alerts.is_empty());
    assert!(monitor.recent_alerts(10).await.is_empty());
    assert_eq!(monitor.model_performance("gpt-4o", today()).await.requests, 0);
}

#[tokio::test]
async fn test_tracker_returns_false_but_still_forwards() {
    let sink = Arc::new(RecordingSink::new());
    let tracker = ErrorTracker::new(store(), KeySpace::default(), TrackingConfig::default())
        .with_sink(sink.clone())
        .with_telemetry(ResilienceTelemetry::disabled());

    let tracked = tracker
        .track("database_error", "pool exhausted", json!({"pool": "primary"}), "fatal", 3)
        .await;

    assert!(!tracked);
    assert_eq!(sink.count_with_severity(Severity::Fatal), 1);
    assert!(tracker.recent_errors(5).await.is_empty());
    assert_eq!(tracker.daily_error_counts(today()).await.total, 0);
}
