//! # Usage Analytics
//!
//! Records cost, latency, token, and success metrics for every metered AI
//! call and exposes rolled-up aggregates.
//!
//! Aggregates live in the shared `MetricsStore` as TTL'd counters:
//!
//! - Daily and monthly cost per user, per operation type, per model, and
//!   platform-wide
//! - Daily success/total request counters and token totals per operation
//! - Platform-wide daily requests, errors, latency sum, per-hour and
//!   per-minute request counts, and the running per-minute peak
//! - A bounded latency window per operation type
//!
//! Every read degrades to zero when the data is missing or the store is
//! unreachable.

use crate::telemetry::ResilienceTelemetry;
use ai_core::keys::{date_of, date_segment, month_segment};
use ai_core::types::sanitize_cost;
use ai_core::{KeySpace, MetricsStore, UsageRecord};
use chrono::{Duration as ChronoDuration, NaiveDate, Timelike};
use config::AnalyticsConfig;
use errors::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use storage::{MetricsStoreExt, RollingWindow};

const SECONDS_PER_DAY: u64 = 86_400;
const MINUTE_COUNTER_TTL: Duration = Duration::from_secs(2 * 3600);

/// Whose spend a cost counter tracks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum CostScope {
    Platform,
    User(String),
    Operation(String),
    Model(String),
}

impl CostScope {
    fn segments(&self) -> Vec<&str> {
        match self {
            CostScope::Platform => vec!["platform"],
            CostScope::User(id) => vec!["user", id],
            CostScope::Operation(op) => vec!["operation", op],
            CostScope::Model(model) => vec!["model", model],
        }
    }
}

impl fmt::Display for CostScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join(":"))
    }
}

impl FromStr for CostScope {
    type Err = String;

    /// Accepts `platform`, `user:<id>`, `operation:<type>`, `model:<name>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "platform" => Ok(CostScope::Platform),
            Some(("user", id)) if !id.is_empty() => Ok(CostScope::User(id.to_string())),
            Some(("operation", op)) if !op.is_empty() => {
                Ok(CostScope::Operation(op.to_string()))
            }
            Some(("model", model)) if !model.is_empty() => Ok(CostScope::Model(model.to_string())),
            _ => Err(format!("invalid cost scope: {s}"))
        }
    }
}

/// Platform-wide aggregates for one daily window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub request_count: f64,
    pub cost: f64,
    pub error_count: f64,
    pub avg_latency_ms: f64,
    pub peak_per_minute: f64,
}

impl WindowMetrics {
    /// Error percentage, zero for an empty window.
    pub fn error_rate_percent(&self) -> f64 {
        if self.request_count <= 0.0 {
            0.0
        } else {
            self.error_count / self.request_count * 100.0
        }
    }
}

pub struct UsageAnalytics {
    store: Arc<dyn MetricsStore>,
    keys: KeySpace,
    config: AnalyticsConfig,
    telemetry: ResilienceTelemetry,
}

impl UsageAnalytics {
    pub fn new(store: Arc<dyn MetricsStore>, keys: KeySpace, config: AnalyticsConfig) -> Self {
        Self {
            store,
            keys,
            config,
            telemetry: ResilienceTelemetry::new(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: ResilienceTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Record one metered call. Store failures are logged and swallowed.
    ///
    /// Records built as struct literals bypass `UsageRecord::new`, so the
    /// cost is clamped again before it reaches any counter.
    pub async fn record(&self, usage: &UsageRecord) {
        let usage = &UsageRecord {
            cost: sanitize_cost(usage.cost),
            ..usage.clone()
        };
        self.telemetry.record_usage(
            &usage.operation_type,
            &usage.model,
            usage.cost,
            usage.latency_ms,
        );

        if let Err(e) = self.try_record(usage).await {
            tracing::warn!(
                operation = %usage.operation_type,
                model = %usage.model,
                error = %e,
                "Failed to record usage"
            );
        }
    }

    async fn try_record(&self, usage: &UsageRecord) -> Result<(), StorageError> {
        let ttl = Some(self.aggregate_ttl());
        let date = date_of(usage.timestamp);
        let day = date_segment(date);
        let month = month_segment(date);
        let op = usage.operation_type.as_str();

        let mut scopes = vec![
            CostScope::Platform,
            CostScope::Operation(usage.operation_type.clone()),
            CostScope::Model(usage.model.clone()),
        ];
        if let Some(user) = &usage.user_id {
            scopes.push(CostScope::User(user.clone()));
        }
        if usage.cost > 0.0 {
            for scope in &scopes {
                self.store
                    .increment_float(&self.daily_cost_key(scope, &day), usage.cost, ttl)
                    .await?;
                self.store
                    .increment_float(&self.monthly_cost_key(scope, &month), usage.cost, ttl)
                    .await?;
            }
        }

        self.store
            .increment(&self.keys.key(&["usage", op, &day, "total"]), 1, ttl)
            .await?;
        if usage.success {
            self.store
                .increment(&self.keys.key(&["usage", op, &day, "success"]), 1, ttl)
                .await?;
        }
        if usage.tokens > 0 {
            self.store
                .increment(
                    &self.keys.key(&["usage", op, &day, "tokens"]),
                    usage.tokens as i64,
                    ttl,
                )
                .await?;
        }

        self.latency_window(op).push(usage.latency_ms).await?;
        self.record_platform(usage, &day).await?;

        let record_key = self.keys.key(&["usage", "record", &uuid::Uuid::new_v4().to_string()]);
        self.store
            .set_json(&record_key, usage, Some(self.record_ttl()))
            .await?;

        tracing::debug!(
            operation = %op,
            model = %usage.model,
            cost = usage.cost,
            tokens = usage.tokens,
            latency_ms = usage.latency_ms,
            success = usage.success,
            "Usage recorded"
        );
        Ok(())
    }

    async fn record_platform(&self, usage: &UsageRecord, day: &str) -> Result<(), StorageError> {
        let ttl = Some(self.aggregate_ttl());
        self.store
            .increment(&self.platform_key(day, "requests"), 1, ttl)
            .await?;
        if !usage.success {
            self.store
                .increment(&self.platform_key(day, "errors"), 1, ttl)
                .await?;
        }
        self.store
            .increment(
                &self.platform_key(day, "latency_ms_sum"),
                usage.latency_ms as i64,
                ttl,
            )
            .await?;

        let hour = format!("{:02}", usage.timestamp.hour());
        self.store
            .increment(&self.keys.key(&["platform", day, "hour", &hour]), 1, ttl)
            .await?;

        let minute = usage.timestamp.format("%H%M").to_string();
        let in_minute = self
            .store
            .increment(
                &self.keys.key(&["platform", day, "minute", &minute]),
                1,
                Some(MINUTE_COUNTER_TTL),
            )
            .await?;

        // Read-then-write: a concurrent writer may under-report the peak.
        let peak_key = self.platform_key(day, "peak_per_minute");
        if in_minute > self.store.get_i64_or_zero(&peak_key).await {
            self.store
                .set(&peak_key, &in_minute.to_string(), ttl)
                .await?;
        }
        Ok(())
    }

    /// Percentage of successful requests, `0.0` when nothing was recorded.
    pub async fn success_rate(&self, operation_type: &str, date: NaiveDate) -> f64 {
        let day = date_segment(date);
        let total = self
            .store
            .get_i64_or_zero(&self.keys.key(&["usage", operation_type, &day, "total"]))
            .await;
        if total <= 0 {
            return 0.0;
        }
        let success = self
            .store
            .get_i64_or_zero(&self.keys.key(&["usage", operation_type, &day, "success"]))
            .await;
        success as f64 / total as f64 * 100.0
    }

    /// Mean latency over the operation's rolling window, in milliseconds.
    pub async fn average_latency(&self, operation_type: &str) -> f64 {
        match self.latency_window(operation_type).values().await {
            Ok(values) => {
                let values: Vec<f64> = values.into_iter().map(|v| v as f64).collect();
                storage::mean(&values)
            }
            Err(e) => {
                tracing::warn!(operation = %operation_type, error = %e, "Latency window unreadable");
                0.0
            }
        }
    }

    pub async fn daily_cost(&self, scope: &CostScope, date: NaiveDate) -> f64 {
        self.store
            .get_f64_or_zero(&self.daily_cost_key(scope, &date_segment(date)))
            .await
    }

    /// Cost for the calendar month containing `date`.
    pub async fn monthly_cost(&self, scope: &CostScope, date: NaiveDate) -> f64 {
        self.store
            .get_f64_or_zero(&self.monthly_cost_key(scope, &month_segment(date)))
            .await
    }

    pub async fn daily_tokens(&self, operation_type: &str, date: NaiveDate) -> u64 {
        let key = self
            .keys
            .key(&["usage", operation_type, &date_segment(date), "tokens"]);
        self.store.get_i64_or_zero(&key).await.max(0) as u64
    }

    /// Platform request counts per UTC hour.
    pub async fn hourly_usage_pattern(&self, date: NaiveDate) -> [u64; 24] {
        let day = date_segment(date);
        let mut pattern = [0u64; 24];
        for (hour, slot) in pattern.iter_mut().enumerate() {
            let key = self
                .keys
                .key(&["platform", &day, "hour", &format!("{hour:02}")]);
            *slot = self.store.get_i64_or_zero(&key).await.max(0) as u64;
        }
        pattern
    }

    pub async fn window_metrics(&self, date: NaiveDate) -> WindowMetrics {
        let day = date_segment(date);
        let requests = self
            .store
            .get_i64_or_zero(&self.platform_key(&day, "requests"))
            .await
            .max(0) as f64;
        let latency_sum = self
            .store
            .get_i64_or_zero(&self.platform_key(&day, "latency_ms_sum"))
            .await
            .max(0) as f64;

        WindowMetrics {
            request_count: requests,
            cost: self.daily_cost(&CostScope::Platform, date).await,
            error_count: self
                .store
                .get_i64_or_zero(&self.platform_key(&day, "errors"))
                .await
                .max(0) as f64,
            avg_latency_ms: if requests > 0.0 {
                latency_sum / requests
            } else {
                0.0
            },
            peak_per_minute: self
                .store
                .get_i64_or_zero(&self.platform_key(&day, "peak_per_minute"))
                .await
                .max(0) as f64,
        }
    }

    /// Mean of the `periods` daily windows immediately preceding `date`.
    pub async fn baseline_metrics(&self, date: NaiveDate, periods: u32) -> WindowMetrics {
        if periods == 0 {
            return WindowMetrics::default();
        }
        let mut total = WindowMetrics::default();
        for offset in 1..=i64::from(periods) {
            let Some(day) = date.checked_sub_signed(ChronoDuration::days(offset)) else {
                continue;
            };
            let window = self.window_metrics(day).await;
            total.request_count += window.request_count;
            total.cost += window.cost;
            total.error_count += window.error_count;
            total.avg_latency_ms += window.avg_latency_ms;
            total.peak_per_minute += window.peak_per_minute;
        }
        let n = f64::from(periods);
        WindowMetrics {
            request_count: total.request_count / n,
            cost: total.cost / n,
            error_count: total.error_count / n,
            avg_latency_ms: total.avg_latency_ms / n,
            peak_per_minute: total.peak_per_minute / n,
        }
    }

    fn latency_window(&self, operation_type: &str) -> RollingWindow<u64> {
        RollingWindow::new(
            Arc::clone(&self.store),
            self.keys.key(&["usage", operation_type, "latency"]),
            self.config.latency_window_size,
        )
        .with_ttl(self.aggregate_ttl())
    }

    fn daily_cost_key(&self, scope: &CostScope, day: &str) -> String {
        let mut segments = vec!["cost", "daily", day];
        segments.extend(scope.segments());
        self.keys.key(&segments)
    }

    fn monthly_cost_key(&self, scope: &CostScope, month: &str) -> String {
        let mut segments = vec!["cost", "monthly", month];
        segments.extend(scope.segments());
        self.keys.key(&segments)
    }

    fn platform_key(&self, day: &str, metric: &str) -> String {
        self.keys.key(&["platform", day, metric])
    }

    fn aggregate_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.config.aggregate_retention_days) * SECONDS_PER_DAY)
    }

    fn record_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.config.record_retention_days) * SECONDS_PER_DAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use storage::InMemoryStore;

    fn analytics() -> (UsageAnalytics, InMemoryStore) {
        let store = InMemoryStore::new();
        let analytics = UsageAnalytics::new(
            Arc::new(store.clone()),
            KeySpace::default(),
            AnalyticsConfig::default(),
        )
        .with_telemetry(ResilienceTelemetry::disabled());
        (analytics, store)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn at(hour: u32, minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_cost_scope_parsing() {
        assert_eq!("platform".parse::<CostScope>().unwrap(), CostScope::Platform);
        assert_eq!(
            "user:42".parse::<CostScope>().unwrap(),
            CostScope::User("42".to_string())
        );
        assert_eq!(
            "model:gpt-4o".parse::<CostScope>().unwrap(),
            CostScope::Model("gpt-4o".to_string())
        );
        assert!("user:".parse::<CostScope>().is_err());
        assert!("tenant:1".parse::<CostScope>().is_err());
    }

    #[tokio::test]
    async fn test_success_rate_is_zero_without_requests() {
        let (analytics, _) = analytics();
        assert_eq!(analytics.success_rate("form_generation", day()).await, 0.0);
    }

    #[tokio::test]
    async fn test_success_rate_is_hundred_when_all_succeed() {
        let (analytics, _) = analytics();
        for _ in 0..3 {
            let usage = UsageRecord::new("form_generation", "gpt-4o", 0.01, 100, 800, true)
                .at(at(10, 0));
            analytics.record(&usage).await;
        }
        assert_eq!(analytics.success_rate("form_generation", day()).await, 100.0);
    }

    #[tokio::test]
    async fn test_success_rate_mixed() {
        let (analytics, _) = analytics();
        for success in [true, true, true, false] {
            let usage = UsageRecord::new("content_analysis", "gpt-4o", 0.0, 0, 100, success)
                .at(at(9, 0));
            analytics.record(&usage).await;
        }
        assert_eq!(analytics.success_rate("content_analysis", day()).await, 75.0);
    }

    #[tokio::test]
    async fn test_costs_roll_up_by_scope() {
        let (analytics, _) = analytics();
        let a = UsageRecord::new("form_generation", "gpt-4o", 0.25, 10, 100, true)
            .with_user("u1")
            .at(at(8, 0));
        let b = UsageRecord::new("content_analysis", "gpt-4o-mini", 0.5, 10, 100, true)
            .with_user("u1")
            .at(at(8, 5));
        analytics.record(&a).await;
        analytics.record(&b).await;

        let platform = analytics.daily_cost(&CostScope::Platform, day()).await;
        assert!((platform - 0.75).abs() < 1e-9);
        let user = analytics
            .daily_cost(&CostScope::User("u1".to_string()), day())
            .await;
        assert!((user - 0.75).abs() < 1e-9);
        let model = analytics
            .daily_cost(&CostScope::Model("gpt-4o".to_string()), day())
            .await;
        assert!((model - 0.25).abs() < 1e-9);
        let monthly = analytics.monthly_cost(&CostScope::Platform, day()).await;
        assert!((monthly - 0.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_aggregates_read_as_zero() {
        let (analytics, _) = analytics();
        assert_eq!(analytics.average_latency("nothing").await, 0.0);
        assert_eq!(analytics.daily_cost(&CostScope::Platform, day()).await, 0.0);
        assert_eq!(analytics.daily_tokens("nothing", day()).await, 0);
        assert_eq!(analytics.hourly_usage_pattern(day()).await, [0; 24]);
        assert_eq!(analytics.window_metrics(day()).await, WindowMetrics::default());
    }

    #[tokio::test]
    async fn test_average_latency_and_tokens() {
        let (analytics, _) = analytics();
        for latency in [100, 200, 300] {
            let usage =
                UsageRecord::new("document_processing", "gpt-4o", 0.0, 50, latency, true)
                    .at(at(12, 0));
            analytics.record(&usage).await;
        }
        assert_eq!(analytics.average_latency("document_processing").await, 200.0);
        assert_eq!(analytics.daily_tokens("document_processing", day()).await, 150);
    }

    #[tokio::test]
    async fn test_hourly_pattern_and_window_metrics() {
        let (analytics, _) = analytics();
        for (hour, minute, success) in [(9, 0, true), (9, 0, false), (9, 1, true), (17, 30, true)]
        {
            let usage = UsageRecord::new("form_generation", "gpt-4o", 0.1, 0, 1000, success)
                .at(at(hour, minute));
            analytics.record(&usage).await;
        }

        let pattern = analytics.hourly_usage_pattern(day()).await;
        assert_eq!(pattern[9], 3);
        assert_eq!(pattern[17], 1);
        assert_eq!(pattern.iter().sum::<u64>(), 4);

        let window = analytics.window_metrics(day()).await;
        assert_eq!(window.request_count, 4.0);
        assert_eq!(window.error_count, 1.0);
        assert_eq!(window.avg_latency_ms, 1000.0);
        assert_eq!(window.peak_per_minute, 2.0);
        assert!((window.cost - 0.4).abs() < 1e-9);
        assert_eq!(window.error_rate_percent(), 25.0);
    }

    #[tokio::test]
    async fn test_baseline_averages_previous_days() {
        let (analytics, _) = analytics();
        let yesterday = Utc.with_ymd_and_hms(2026, 3, 13, 10, 0, 0).unwrap();
        for _ in 0..14 {
            let usage = UsageRecord::new("op", "m", 0.0, 0, 0, true).at(yesterday);
            analytics.record(&usage).await;
        }
        let baseline = analytics.baseline_metrics(day(), 7).await;
        assert_eq!(baseline.request_count, 2.0);
        assert_eq!(analytics.baseline_metrics(day(), 0).await, WindowMetrics::default());
    }

    #[tokio::test]
    async fn test_non_finite_cost_does_not_poison_counters() {
        let (analytics, _) = analytics();
        let mut usage = UsageRecord::new("form_generation", "gpt-4o", 0.0, 10, 200, true)
            .at(at(11, 0));
        usage.cost = f64::INFINITY;
        analytics.record(&usage).await;
        usage.cost = f64::NAN;
        analytics.record(&usage).await;
        usage.cost = -3.0;
        analytics.record(&usage).await;
        usage.cost = 0.5;
        analytics.record(&usage).await;

        assert_eq!(analytics.daily_cost(&CostScope::Platform, day()).await, 0.5);
        assert_eq!(
            analytics
                .monthly_cost(&CostScope::Model("gpt-4o".to_string()), day())
                .await,
            0.5
        );
        assert_eq!(analytics.daily_tokens("form_generation", day()).await, 40);
        assert_eq!(analytics.window_metrics(day()).await.cost, 0.5);
    }

    #[tokio::test]
    async fn test_baseline_near_minimum_date_skips_missing_days() {
        let (analytics, _) = analytics();
        let baseline = analytics.baseline_metrics(NaiveDate::MIN, 7).await;
        assert_eq!(baseline, WindowMetrics::default());
    }
}
