//! # LLM Reliability Monitor
//!
//! Per-model performance tracking plus statistical anomaly detection on
//! every LLM call.
//!
//! Three checks run per observation:
//!
//! | Check      | Minimum data                    | Fires when                          | Severity |
//! |------------|---------------------------------|-------------------------------------|----------|
//! | Latency    | `min_samples` prior latencies   | latency > `latency_multiplier` × mean | warning  |
//! | Error rate | `min_samples` requests today    | error % > `error_rate_threshold_percent` | error |
//! | Cost       | `min_samples` prior costs       | cost > `cost_multiplier` × mean     | warning  |
//!
//! Latency windows are keyed by (model, operation type); cost windows by
//! operation type.

use crate::error_tracker::ErrorTracker;
use crate::pricing::PriceTable;
use crate::telemetry::ResilienceTelemetry;
use ai_core::keys::{date_segment, today};
use ai_core::{
    AlertSeverity, AnomalyAlert, AnomalyType, ErrorKind, ExpectedRange, KeySpace, MetricsStore,
    MonitoringEvent, MonitoringSink,
};
use chrono::{NaiveDate, Utc};
use config::MonitorConfig;
use errors::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use storage::{MetricsStoreExt, RollingWindow};

const SECONDS_PER_DAY: u64 = 86_400;

/// One completed (or failed) LLM call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmObservation {
    pub model: String,
    pub operation_type: String,
    pub request_tokens: u64,
    pub response_tokens: u64,
    pub latency_ms: u64,
    pub success: bool,
    pub error_kind: Option<ErrorKind>,
    pub retry_count: u32,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LlmObservation {
    pub fn success(
        model: impl Into<String>,
        operation_type: impl Into<String>,
        request_tokens: u64,
        response_tokens: u64,
        latency_ms: u64,
    ) -> Self {
        Self {
            model: model.into(),
            operation_type: operation_type.into(),
            request_tokens,
            response_tokens,
            latency_ms,
            success: true,
            error_kind: None,
            retry_count: 0,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn failure(
        model: impl Into<String>,
        operation_type: impl Into<String>,
        error_kind: ErrorKind,
        latency_ms: u64,
    ) -> Self {
        Self {
            success: false,
            error_kind: Some(error_kind),
            ..Self::success(model, operation_type, 0, 0, latency_ms)
        }
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = Some(temperature);
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub model: String,
    pub date: NaiveDate,
    pub requests: u64,
    pub successes: u64,
    pub errors: u64,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub request_tokens: u64,
    pub response_tokens: u64,
    pub retries: u64,
    pub estimated_cost: f64,
    pub errors_by_kind: BTreeMap<ErrorKind, u64>,
}

pub struct LlmReliabilityMonitor {
    store: Arc<dyn MetricsStore>,
    keys: KeySpace,
    config: MonitorConfig,
    prices: PriceTable,
    sink: Option<Arc<dyn MonitoringSink>>,
    tracker: Option<Arc<ErrorTracker>>,
    telemetry: ResilienceTelemetry,
}

impl LlmReliabilityMonitor {
    pub fn new(store: Arc<dyn MetricsStore>, keys: KeySpace, config: MonitorConfig) -> Self {
        Self {
            store,
            keys,
            config,
            prices: PriceTable::default(),
            sink: None,
            tracker: None,
            telemetry: ResilienceTelemetry::new(),
        }
    }

    pub fn with_prices(mut self, prices: PriceTable) -> Self {
        self.prices = prices;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn MonitoringSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Every raised alert is also recorded as a tracked error.
    pub fn with_tracker(mut self, tracker: Arc<ErrorTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn with_telemetry(mut self, telemetry: ResilienceTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Record an observation and return any anomalies it triggered.
    ///
    /// Never fails: store errors are logged and yield no alerts.
    pub async fn observe(&self, observation: &LlmObservation) -> Vec<AnomalyAlert> {
        match self.try_observe(observation).await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::warn!(
                    model = %observation.model,
                    operation = %observation.operation_type,
                    error = %e,
                    "LLM reliability tracking failed"
                );
                Vec::new()
            }
        }
    }

    async fn try_observe(
        &self,
        observation: &LlmObservation,
    ) -> Result<Vec<AnomalyAlert>, StorageError> {
        let cost = self.prices.cost(
            &observation.model,
            observation.request_tokens,
            observation.response_tokens,
        );
        self.record_counters(observation, cost).await?;

        tracing::debug!(
            model = %observation.model,
            operation = %observation.operation_type,
            latency_ms = observation.latency_ms,
            success = observation.success,
            retry_count = observation.retry_count,
            temperature = ?observation.temperature,
            max_tokens = ?observation.max_tokens,
            cost,
            "LLM call observed"
        );

        let mut alerts = Vec::new();
        if let Some(alert) = self.check_latency(observation).await? {
            alerts.push(alert);
        }
        if let Some(alert) = self.check_error_rate(observation).await {
            alerts.push(alert);
        }
        if let Some(alert) = self.check_cost(observation, cost).await? {
            alerts.push(alert);
        }

        for alert in &alerts {
            self.raise(alert).await;
        }
        Ok(alerts)
    }

    async fn record_counters(
        &self,
        observation: &LlmObservation,
        cost: f64,
    ) -> Result<(), StorageError> {
        let ttl = Some(self.counter_ttl());
        let day = date_segment(today());
        let model = observation.model.as_str();
        let op = observation.operation_type.as_str();

        let model_key = |metric: &str| self.keys.key(&["llm", "model", model, &day, metric]);
        let op_key = |metric: &str| self.keys.key(&["llm", "operation", op, &day, metric]);

        self.store.increment(&model_key("requests"), 1, ttl).await?;
        self.store.increment(&op_key("requests"), 1, ttl).await?;
        if observation.success {
            self.store.increment(&model_key("success"), 1, ttl).await?;
        } else {
            self.store.increment(&model_key("errors"), 1, ttl).await?;
            let kind = observation.error_kind.unwrap_or(ErrorKind::UnknownError);
            self.store
                .increment(&model_key(&format!("error:{kind}")), 1, ttl)
                .await?;
        }

        let tokens = observation.request_tokens + observation.response_tokens;
        self.store
            .increment(&model_key("request_tokens"), observation.request_tokens as i64, ttl)
            .await?;
        self.store
            .increment(&model_key("response_tokens"), observation.response_tokens as i64, ttl)
            .await?;
        self.store
            .increment(&op_key("tokens"), tokens as i64, ttl)
            .await?;
        self.store
            .increment(&model_key("latency_ms_sum"), observation.latency_ms as i64, ttl)
            .await?;
        if observation.retry_count > 0 {
            self.store
                .increment(&model_key("retries"), i64::from(observation.retry_count), ttl)
                .await?;
        }
        if cost > 0.0 {
            self.store
                .increment_float(&model_key("cost"), cost, ttl)
                .await?;
        }
        Ok(())
    }

    async fn check_latency(
        &self,
        observation: &LlmObservation,
    ) -> Result<Option<AnomalyAlert>, StorageError> {
        let window = self.latency_window(&observation.model, &observation.operation_type);
        let history = window.push(observation.latency_ms).await?;
        if history.len() < self.config.min_samples {
            return Ok(None);
        }

        let values: Vec<f64> = history.iter().map(|v| *v as f64).collect();
        let average = storage::mean(&values);
        let limit = average * self.config.latency_multiplier;
        let current = observation.latency_ms as f64;
        if average <= 0.0 || current <= limit {
            return Ok(None);
        }

        Ok(Some(self.alert(
            AnomalyType::ResponseTimeAnomaly,
            AlertSeverity::Warning,
            observation,
            current,
            ExpectedRange {
                min: 0.0,
                max: limit,
            },
            format!(
                "Response time {current:.0}ms exceeds {:.1}x the rolling average of {average:.0}ms",
                self.config.latency_multiplier
            ),
        )))
    }

    /// Runs against today's counters after the current observation is
    /// counted.
    async fn check_error_rate(&self, observation: &LlmObservation) -> Option<AnomalyAlert> {
        let day = date_segment(today());
        let model = observation.model.as_str();
        let total = self
            .store
            .get_i64_or_zero(&self.keys.key(&["llm", "model", model, &day, "requests"]))
            .await;
        if total < self.config.min_samples as i64 || total <= 0 {
            return None;
        }
        let success = self
            .store
            .get_i64_or_zero(&self.keys.key(&["llm", "model", model, &day, "success"]))
            .await;

        let error_rate = (total - success) as f64 / total as f64 * 100.0;
        if error_rate <= self.config.error_rate_threshold_percent {
            return None;
        }

        Some(self.alert(
            AnomalyType::ErrorRateAnomaly,
            AlertSeverity::Error,
            observation,
            error_rate,
            ExpectedRange {
                min: 0.0,
                max: self.config.error_rate_threshold_percent,
            },
            format!(
                "Error rate {error_rate:.1}% for {model} over {total} requests today exceeds {:.0}%",
                self.config.error_rate_threshold_percent
            ),
        ))
    }

    async fn check_cost(
        &self,
        observation: &LlmObservation,
        cost: f64,
    ) -> Result<Option<AnomalyAlert>, StorageError> {
        let window = self.cost_window(&observation.operation_type);
        let history = window.push(cost).await?;
        if history.len() < self.config.min_samples {
            return Ok(None);
        }

        let average = storage::mean(&history);
        let limit = average * self.config.cost_multiplier;
        if average <= 0.0 || cost <= limit {
            return Ok(None);
        }

        Ok(Some(self.alert(
            AnomalyType::CostAnomaly,
            AlertSeverity::Warning,
            observation,
            cost,
            ExpectedRange {
                min: 0.0,
                max: limit,
            },
            format!(
                "Cost ${cost:.4} for {} exceeds {:.1}x the rolling average of ${average:.4}",
                observation.operation_type, self.config.cost_multiplier
            ),
        )))
    }

    fn alert(
        &self,
        anomaly_type: AnomalyType,
        severity: AlertSeverity,
        observation: &LlmObservation,
        current_value: f64,
        expected_range: ExpectedRange,
        description: String,
    ) -> AnomalyAlert {
        AnomalyAlert {
            anomaly_type,
            severity,
            model: observation.model.clone(),
            operation_type: observation.operation_type.clone(),
            current_value,
            expected_range,
            description,
            timestamp: Utc::now(),
        }
    }

    async fn raise(&self, alert: &AnomalyAlert) {
        let payload = serde_json::to_string(alert).unwrap_or_default();
        tracing::warn!(
            anomaly_type = %alert.anomaly_type,
            severity = %alert.severity,
            model = %alert.model,
            "[LLM_ANOMALY] {}",
            payload
        );
        self.telemetry
            .record_llm_anomaly(&alert.anomaly_type.to_string(), &alert.model);

        if let Some(sink) = &self.sink {
            let event = MonitoringEvent::new(
                format!("LLM anomaly: {}", alert.description),
                alert.severity.as_tracking_severity(),
            )
            .tag("anomaly_type", alert.anomaly_type.to_string())
            .tag("model", alert.model.clone())
            .tag("operation_type", alert.operation_type.clone())
            .extra(serde_json::to_value(alert).unwrap_or_default());
            sink.capture(&event);
        }

        if let Some(tracker) = &self.tracker {
            tracker.track_alert(alert).await;
        }

        if let Err(e) = self.alert_window().push(alert.clone()).await {
            tracing::warn!(error = %e, "Failed to retain anomaly alert");
        }
    }

    pub async fn model_performance(&self, model: &str, date: NaiveDate) -> ModelPerformance {
        let day = date_segment(date);
        let read = |metric: String| {
            let key = self.keys.key(&["llm", "model", model, &day, &metric]);
            async move { self.store.get_i64_or_zero(&key).await.max(0) as u64 }
        };

        let requests = read("requests".to_string()).await;
        let successes = read("success".to_string()).await;
        let latency_sum = read("latency_ms_sum".to_string()).await;

        let mut errors_by_kind = BTreeMap::new();
        for kind in ErrorKind::ALL {
            let count = read(format!("error:{kind}")).await;
            if count > 0 {
                errors_by_kind.insert(kind, count);
            }
        }

        ModelPerformance {
            model: model.to_string(),
            date,
            requests,
            successes,
            errors: read("errors".to_string()).await,
            success_rate: if requests > 0 {
                successes as f64 / requests as f64 * 100.0
            } else {
                0.0
            },
            avg_latency_ms: if requests > 0 {
                latency_sum as f64 / requests as f64
            } else {
                0.0
            },
            request_tokens: read("request_tokens".to_string()).await,
            response_tokens: read("response_tokens".to_string()).await,
            retries: read("retries".to_string()).await,
            estimated_cost: self
                .store
                .get_f64_or_zero(&self.keys.key(&["llm", "model", model, &day, "cost"]))
                .await,
            errors_by_kind,
        }
    }

    /// Most recent retained alerts, newest first.
    pub async fn recent_alerts(&self, limit: usize) -> Vec<AnomalyAlert> {
        match self.alert_window().values().await {
            Ok(alerts) => alerts.into_iter().rev().take(limit).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read recent alerts");
                Vec::new()
            }
        }
    }

    fn latency_window(&self, model: &str, operation_type: &str) -> RollingWindow<u64> {
        RollingWindow::new(
            Arc::clone(&self.store),
            self.keys.key(&["llm", "latency", model, operation_type]),
            self.config.window_size,
        )
        .with_ttl(self.counter_ttl())
    }

    fn cost_window(&self, operation_type: &str) -> RollingWindow<f64> {
        RollingWindow::new(
            Arc::clone(&self.store),
            self.keys.key(&["llm", "cost", operation_type]),
            self.config.window_size,
        )
        .with_ttl(self.counter_ttl())
    }

    fn alert_window(&self) -> RollingWindow<AnomalyAlert> {
        RollingWindow::new(
            Arc::clone(&self.store),
            self.keys.key(&["llm", "alerts"]),
            self.config.alert_capacity,
        )
        .with_ttl(Duration::from_secs(self.config.alert_retention_hours * 3600))
    }

    fn counter_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.config.counter_retention_days) * SECONDS_PER_DAY)
    }
}
