//! # Retry Executor
//!
//! Runs an AI operation, classifies each failure, consults the
//! [`RetryPlanner`], waits, and retries until the operation succeeds or the
//! budget runs out. The original error is returned unchanged on exhaustion.
//!
//! Every transition is counted in the metrics store under
//! `retry:{operation}:{date}:{attempted|succeeded|exhausted}` and appended to
//! a bounded per-operation event window.

use crate::classifier::classify;
use crate::planner::RetryPlanner;
use ai_core::keys::{date_segment, today};
use ai_core::{ErrorKind, KeySpace, MetricsStore, Severity};
use chrono::{DateTime, NaiveDate, Utc};
use config::RetryConfig;
use observability::{ErrorTracker, ResilienceTelemetry};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use storage::{MetricsStoreExt, RollingWindow};
use strum::Display;

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RetryOutcome {
    Attempted,
    Succeeded,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryEvent {
    pub operation_type: String,
    pub outcome: RetryOutcome,
    /// Retries performed so far.
    pub retry_count: u32,
    pub error_kind: Option<ErrorKind>,
    pub delay_seconds: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryStats {
    pub attempted: u64,
    pub succeeded: u64,
    pub exhausted: u64,
}

pub struct RetryExecutor {
    planner: RetryPlanner,
    store: Arc<dyn MetricsStore>,
    keys: KeySpace,
    config: RetryConfig,
    tracker: Option<Arc<ErrorTracker>>,
    telemetry: ResilienceTelemetry,
}

impl RetryExecutor {
    pub fn new(store: Arc<dyn MetricsStore>, keys: KeySpace, config: RetryConfig) -> Self {
        Self {
            planner: RetryPlanner::from_config(&config),
            store,
            keys,
            config,
            tracker: None,
            telemetry: ResilienceTelemetry::new(),
        }
    }

    pub fn with_tracker(mut self, tracker: Arc<ErrorTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn with_telemetry(mut self, telemetry: ResilienceTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn planner(&self) -> &RetryPlanner {
        &self.planner
    }

    /// Run `operation` with classified retries.
    ///
    /// `operation` receives the zero-based attempt index. At most
    /// `max_retries` retries happen, fewer when the error kind's own budget
    /// is smaller.
    pub async fn execute_with_retry<T, E, F, Fut>(
        &self,
        operation_type: &str,
        max_retries: u32,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static
    {
        let mut attempt_count = 0u32;
        loop {
            let error = match operation(attempt_count).await {
                Ok(value) => {
                    if attempt_count > 0 {
                        self.on_success(operation_type, attempt_count).await;
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let kind = classify(&error);
            let message = error.to_string();
            let plan = if attempt_count < max_retries {
                self.planner.plan(kind, attempt_count, operation_type)
            } else {
                None
            };

            let Some(plan) = plan else {
                self.on_exhausted(operation_type, kind, attempt_count, &message)
                    .await;
                return Err(error);
            };

            self.on_attempt(operation_type, kind, attempt_count, plan.delay_seconds, &message)
                .await;
            if !self.config.skip_delays && plan.delay_seconds > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(plan.delay_seconds)).await;
            }
            attempt_count += 1;
        }
    }

    async fn on_attempt(
        &self,
        operation_type: &str,
        kind: ErrorKind,
        attempt_count: u32,
        delay_seconds: f64,
        message: &str,
    ) {
        tracing::warn!(
            operation = %operation_type,
            error_kind = %kind,
            attempt = attempt_count + 1,
            delay_seconds,
            "[RETRY_ATTEMPT] {}",
            message
        );
        self.telemetry
            .record_retry_attempt(operation_type, kind.as_str());
        self.count(operation_type, RetryOutcome::Attempted).await;
        self.push_event(RetryEvent {
            operation_type: operation_type.to_string(),
            outcome: RetryOutcome::Attempted,
            retry_count: attempt_count,
            error_kind: Some(kind),
            delay_seconds: Some(delay_seconds),
            timestamp: Utc::now(),
        })
        .await;
        self.track(operation_type, kind, attempt_count, message, Severity::Warn)
            .await;
    }

    async fn on_success(&self, operation_type: &str, retry_count: u32) {
        tracing::info!(
            operation = %operation_type,
            retry_count,
            "[RETRY_SUCCESS] {} succeeded after {} attempts",
            operation_type,
            retry_count
        );
        self.telemetry
            .record_retry_success(operation_type, retry_count);
        self.count(operation_type, RetryOutcome::Succeeded).await;
        self.push_event(RetryEvent {
            operation_type: operation_type.to_string(),
            outcome: RetryOutcome::Succeeded,
            retry_count,
            error_kind: None,
            delay_seconds: None,
            timestamp: Utc::now(),
        })
        .await;
    }

    async fn on_exhausted(
        &self,
        operation_type: &str,
        kind: ErrorKind,
        retry_count: u32,
        message: &str,
    ) {
        tracing::error!(
            operation = %operation_type,
            error_kind = %kind,
            retry_count,
            "[RETRY_EXHAUSTED] {}",
            message
        );
        self.telemetry
            .record_retry_exhausted(operation_type, kind.as_str());
        self.count(operation_type, RetryOutcome::Exhausted).await;
        self.push_event(RetryEvent {
            operation_type: operation_type.to_string(),
            outcome: RetryOutcome::Exhausted,
            retry_count,
            error_kind: Some(kind),
            delay_seconds: None,
            timestamp: Utc::now(),
        })
        .await;
        self.track(operation_type, kind, retry_count, message, Severity::Error)
            .await;
    }

    async fn track(
        &self,
        operation_type: &str,
        kind: ErrorKind,
        retry_count: u32,
        message: &str,
        severity: Severity,
    ) {
        if let Some(tracker) = &self.tracker {
            let context = serde_json::json!({
                "operation_type": operation_type,
                "attempt": retry_count + 1,
            });
            tracker
                .track_kind(kind, message, context, severity, retry_count)
                .await;
        }
    }

    async fn count(&self, operation_type: &str, outcome: RetryOutcome) {
        let key = self.stats_key(operation_type, today(), outcome);
        if let Err(e) = self
            .store
            .increment(&key, 1, Some(self.counter_ttl()))
            .await
        {
            tracing::warn!(key = %key, error = %e, "Failed to count retry transition");
        }
    }

    async fn push_event(&self, event: RetryEvent) {
        if let Err(e) = self.event_window(&event.operation_type).push(event).await {
            tracing::warn!(error = %e, "Failed to record retry event");
        }
    }

    pub async fn retry_stats(&self, operation_type: &str, date: NaiveDate) -> RetryStats {
        RetryStats {
            attempted: self
                .read_count(operation_type, date, RetryOutcome::Attempted)
                .await,
            succeeded: self
                .read_count(operation_type, date, RetryOutcome::Succeeded)
                .await,
            exhausted: self
                .read_count(operation_type, date, RetryOutcome::Exhausted)
                .await,
        }
    }

    /// Newest first.
    pub async fn recent_retry_events(&self, operation_type: &str) -> Vec<RetryEvent> {
        match self.event_window(operation_type).values().await {
            Ok(events) => events.into_iter().rev().collect(),
            Err(e) => {
                tracing::warn!(operation = %operation_type, error = %e, "Failed to read retry events");
                Vec::new()
            }
        }
    }

    async fn read_count(&self, operation_type: &str, date: NaiveDate, outcome: RetryOutcome) -> u64 {
        self.store
            .get_i64_or_zero(&self.stats_key(operation_type, date, outcome))
            .await
            .max(0) as u64
    }

    fn stats_key(&self, operation_type: &str, date: NaiveDate, outcome: RetryOutcome) -> String {
        self.keys.key(&[
            "retry",
            operation_type,
            &date_segment(date),
            &outcome.to_string()
        ])
    }

    fn event_window(&self, operation_type: &str) -> RollingWindow<RetryEvent> {
        RollingWindow::new(
            Arc::clone(&self.store),
            self.keys.key(&["retry", operation_type, "events"]),
            self.config.event_capacity,
        )
        .with_ttl(self.counter_ttl())
    }

    fn counter_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.config.counter_retention_days) * SECONDS_PER_DAY)
    }
}
