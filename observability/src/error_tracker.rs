//! Structured error tracking: log line, daily counters, optional forwarding
//! to an external monitoring sink, and a retained audit record.
//!
//! Tracking never fails the caller. Every internal problem turns into a
//! `false` return and a warning.

use crate::telemetry::ResilienceTelemetry;
use ai_core::keys::{date_of, date_segment};
use ai_core::{AnomalyAlert, ErrorKind, ErrorRecord, KeySpace, MetricsStore, MonitoringEvent, MonitoringSink, Severity};
use chrono::NaiveDate;
use config::TrackingConfig;
use errors::{StorageError, TrackingError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use storage::{MetricsStoreExt, RollingWindow};

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorCounts {
    pub total: u64,
    pub by_kind: BTreeMap<ErrorKind, u64>,
}

pub struct ErrorTracker {
    store: Arc<dyn MetricsStore>,
    keys: KeySpace,
    config: TrackingConfig,
    sink: Option<Arc<dyn MonitoringSink>>,
    telemetry: ResilienceTelemetry,
}

impl ErrorTracker {
    pub fn new(store: Arc<dyn MetricsStore>, keys: KeySpace, config: TrackingConfig) -> Self {
        Self {
            store,
            keys,
            config,
            sink: None,
            telemetry: ResilienceTelemetry::new(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn MonitoringSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_telemetry(mut self, telemetry: ResilienceTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Track an error given by name. Unknown kinds or severities are
    /// rejected with `false`.
    pub async fn track(
        &self,
        error_kind: &str,
        message: &str,
        context: serde_json::Value,
        severity: &str,
        retry_count: u32,
    ) -> bool {
        match parse(error_kind, severity) {
            Ok((kind, severity)) => {
                self.track_kind(kind, message, context, severity, retry_count)
                    .await
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rejected error tracking request");
                false
            }
        }
    }

    pub async fn track_kind(
        &self,
        error_kind: ErrorKind,
        message: &str,
        context: serde_json::Value,
        severity: Severity,
        retry_count: u32,
    ) -> bool {
        self.track_record(
            ErrorRecord::new(error_kind, message, severity, context, retry_count),
            true,
        )
        .await
    }

    /// Record a reliability alert as an `llm_error`. The monitor forwards
    /// alerts to the sink itself, so nothing is forwarded here.
    pub async fn track_alert(&self, alert: &AnomalyAlert) -> bool {
        let context = serde_json::json!({
            "anomaly_type": alert.anomaly_type,
            "model": alert.model,
            "operation_type": alert.operation_type,
            "current_value": alert.current_value,
            "expected_range": alert.expected_range
        });
        self.track_record(
            ErrorRecord::new(
                ErrorKind::LlmError,
                &alert.description,
                alert.severity.as_tracking_severity(),
                context,
                0,
            ),
            false,
        )
        .await
    }

    async fn track_record(&self, record: ErrorRecord, forward: bool) -> bool {
        let error_kind = record.error_kind;
        let severity = record.severity;
        let retry_count = record.retry_count;
        log_record(&record);
        self.telemetry
            .record_error_tracked(error_kind.as_str(), severity.as_ref());

        if forward && severity.is_forwarded() && self.config.forward_to_sink {
            if let Some(sink) = &self.sink {
                let event = MonitoringEvent::new(
                    format!("AI Error: {}", record.message),
                    severity,
                )
                .tag("error_type", error_kind.to_string())
                .tag("retry_count", retry_count.to_string())
                .extra(record.context.clone());
                sink.capture(&event);
            }
        }

        match self.persist(&record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, error_kind = %error_kind, "Failed to persist tracked error");
                false
            }
        }
    }

    async fn persist(&self, record: &ErrorRecord) -> Result<(), StorageError> {
        let ttl = self.retention();
        let day = date_segment(date_of(record.timestamp));

        self.store
            .increment(&self.keys.key(&["errors", &day, "total"]), 1, Some(ttl))
            .await?;
        self.store
            .increment(
                &self.keys.key(&["errors", &day, record.error_kind.as_str()]),
                1,
                Some(ttl),
            )
            .await?;
        self.store
            .set_json(&self.keys.key(&["errors", "record", &record.id]), record, Some(ttl))
            .await?;
        self.recent_window().push(record.clone()).await?;
        Ok(())
    }

    pub async fn daily_error_counts(&self, date: NaiveDate) -> ErrorCounts {
        let day = date_segment(date);
        let mut counts = ErrorCounts {
            total: self
                .store
                .get_i64_or_zero(&self.keys.key(&["errors", &day, "total"]))
                .await
                .max(0) as u64,
            by_kind: BTreeMap::new(),
        };
        for kind in ErrorKind::ALL {
            let count = self
                .store
                .get_i64_or_zero(&self.keys.key(&["errors", &day, kind.as_str()]))
                .await;
            if count > 0 {
                counts.by_kind.insert(kind, count as u64);
            }
        }
        counts
    }

    /// Newest first.
    pub async fn recent_errors(&self, limit: usize) -> Vec<ErrorRecord> {
        match self.recent_window().values().await {
            Ok(records) => records.into_iter().rev().take(limit).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read recent errors");
                Vec::new()
            }
        }
    }

    fn recent_window(&self) -> RollingWindow<ErrorRecord> {
        RollingWindow::new(
            Arc::clone(&self.store),
            self.keys.key(&["errors", "recent"]),
            self.config.recent_capacity,
        )
        .with_ttl(self.retention())
    }

    fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.config.retention_days) * SECONDS_PER_DAY)
    }
}

fn parse(error_kind: &str, severity: &str) -> Result<(ErrorKind, Severity), TrackingError> {
    let kind = ErrorKind::from_str(error_kind).map_err(|_| TrackingError::UnknownErrorKind {
        kind: error_kind.to_string(),
    })?;
    let severity = Severity::from_str(severity).map_err(|_| TrackingError::UnknownSeverity {
        severity: severity.to_string(),
    })?;
    Ok((kind, severity))
}

fn log_record(record: &ErrorRecord) {
    let payload = serde_json::to_string(record).unwrap_or_default();
    match record.severity {
        Severity::Debug => tracing::debug!(error_kind = %record.error_kind, "[AI_ERROR] {}", payload),
        Severity::Info => tracing::info!(error_kind = %record.error_kind, "[AI_ERROR] {}", payload),
        Severity::Warn => tracing::warn!(error_kind = %record.error_kind, "[AI_ERROR] {}", payload),
        Severity::Error | Severity::Fatal => {
            tracing::error!(error_kind = %record.error_kind, "[AI_ERROR] {}", payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_core::keys::today;
    use serde_json::json;
    use std::sync::Mutex;
    use storage::InMemoryStore;

    #[derive(Default)]
    struct CapturingSink {
        events: Mutex<Vec<MonitoringEvent>>,
    }

    impl MonitoringSink for CapturingSink {
        fn capture(&self, event: &MonitoringEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn tracker(sink: Arc<CapturingSink>) -> ErrorTracker {
        ErrorTracker::new(
            Arc::new(InMemoryStore::new()),
            KeySpace::default(),
            TrackingConfig::default(),
        )
        .with_sink(sink)
        .with_telemetry(ResilienceTelemetry::disabled())
    }

    #[tokio::test]
    async fn test_track_valid_error() {
        let sink = Arc::new(CapturingSink::default());
        let tracker = tracker(sink.clone());

        let tracked = tracker
            .track(
                "llm_error",
                "model overloaded",
                json!({"operation": "form_generation"}),
                "error",
                1,
            )
            .await;
        assert!(tracked);

        let counts = tracker.daily_error_counts(today()).await;
        assert_eq!(counts.total, 1);
        assert_eq!(counts.by_kind.get(&ErrorKind::LlmError), Some(&1));

        let recent = tracker.recent_errors(5).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message, "model overloaded");
        assert_eq!(recent[0].retry_count, 1);

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tags.get("error_type").map(String::as_str), Some("llm_error"));
    }

    #[tokio::test]
    async fn test_unknown_kind_or_severity_is_rejected() {
        let sink = Arc::new(CapturingSink::default());
        let tracker = tracker(sink.clone());

        assert!(!tracker.track("validation_error", "x", json!({}), "error", 0).await);
        assert!(!tracker.track("llm_error", "x", json!({}), "critical", 0).await);
        assert_eq!(tracker.daily_error_counts(today()).await.total, 0);
        assert!(sink.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_error_and_fatal_are_forwarded() {
        let sink = Arc::new(CapturingSink::default());
        let tracker = tracker(sink.clone());

        for severity in ["debug", "info", "warn", "error", "fatal"] {
            assert!(tracker.track("network_error", "reset", json!({}), severity, 0).await);
        }
        assert_eq!(sink.events.lock().unwrap().len(), 2);
        assert_eq!(tracker.daily_error_counts(today()).await.total, 5);
    }

    #[tokio::test]
    async fn test_forwarding_can_be_disabled() {
        let sink = Arc::new(CapturingSink::default());
        let tracker = ErrorTracker::new(
            Arc::new(InMemoryStore::new()),
            KeySpace::default(),
            TrackingConfig {
                forward_to_sink: false,
                ..TrackingConfig::default()
            },
        )
        .with_sink(sink.clone());

        assert!(tracker.track("timeout_error", "slow", json!({}), "fatal", 0).await);
        assert!(sink.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_errors_newest_first() {
        let tracker = tracker(Arc::new(CapturingSink::default()));
        for i in 0..3 {
            tracker
                .track_kind(ErrorKind::DatabaseError, &format!("e{i}"), json!(null), Severity::Warn, i)
                .await;
        }
        let recent = tracker.recent_errors(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "e2");
        assert_eq!(recent[1].message, "e1");
    }
}
