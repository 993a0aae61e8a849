//! Wires every component onto one shared store, and meters LLM calls so
//! each attempt reaches both usage analytics and the reliability monitor.

use crate::cache::ContentCache;
use crate::classifier::classify;
use crate::executor::RetryExecutor;
use ai_core::{KeySpace, MetricsStore, MonitoringSink, UsageRecord};
use chrono::NaiveDate;
use config::Config;
use observability::{
    Assessment, ErrorTracker, LlmObservation, LlmReliabilityMonitor, ResilienceTelemetry,
    UsageAnalytics, UsageAnomalyDetector, WindowMetrics,
};
use serde::Serialize;
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Identifies a metered LLM call.
#[derive(Debug, Clone, Copy)]
pub struct LlmCall<'a> {
    pub operation_type: &'a str,
    pub model: &'a str,
    pub user_id: Option<&'a str>,
    pub max_retries: u32,
}

/// A successful LLM response and its token counts.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse<T> {
    pub value: T,
    pub request_tokens: u64,
    pub response_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRiskReport {
    pub date: NaiveDate,
    pub current: WindowMetrics,
    pub baseline: WindowMetrics,
    pub assessment: Assessment,
}

pub struct ResilienceLayer {
    pub cache: ContentCache,
    pub executor: RetryExecutor,
    pub analytics: UsageAnalytics,
    pub monitor: LlmReliabilityMonitor,
    pub detector: UsageAnomalyDetector,
    pub tracker: Arc<ErrorTracker>,
}

impl ResilienceLayer {
    pub fn new(
        store: Arc<dyn MetricsStore>,
        config: &Config,
        sink: Arc<dyn MonitoringSink>,
    ) -> Self {
        let keys = KeySpace::new(config.redis.namespace.clone());
        let telemetry = ResilienceTelemetry::with_enabled(config.observability.metrics_enabled);

        let tracker = Arc::new(
            ErrorTracker::new(Arc::clone(&store), keys.clone(), config.tracking.clone())
                .with_sink(Arc::clone(&sink))
                .with_telemetry(telemetry),
        );

        Self {
            cache: ContentCache::new(Arc::clone(&store), keys.clone(), config.cache.clone())
                .with_telemetry(telemetry),
            executor: RetryExecutor::new(Arc::clone(&store), keys.clone(), config.retry.clone())
                .with_tracker(Arc::clone(&tracker))
                .with_telemetry(telemetry),
            analytics: UsageAnalytics::new(
                Arc::clone(&store),
                keys.clone(),
                config.analytics.clone(),
            )
            .with_telemetry(telemetry),
            monitor: LlmReliabilityMonitor::new(store, keys, config.monitor.clone())
                .with_sink(sink)
                .with_tracker(Arc::clone(&tracker))
                .with_telemetry(telemetry),
            detector: UsageAnomalyDetector::new(config.anomaly.clone()).with_telemetry(telemetry),
            tracker,
        }
    }

    /// Run an LLM operation with retries, reporting every attempt.
    pub async fn execute_llm<T, E, F, Fut>(
        &self,
        call: &LlmCall<'_>,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<LlmResponse<T>, E>>,
        E: Error + 'static
    {
        self.executor
            .execute_with_retry(call.operation_type, call.max_retries, |attempt| {
                let started = Instant::now();
                let pending = operation(attempt);
                async move {
                    let outcome = pending.await;
                    let latency_ms = started.elapsed().as_millis() as u64;
                    match &outcome {
                        Ok(response) => {
                            self.report(
                                call,
                                LlmObservation::success(
                                    call.model,
                                    call.operation_type,
                                    response.request_tokens,
                                    response.response_tokens,
                                    latency_ms,
                                )
                                .with_retry_count(attempt),
                            )
                            .await;
                        }
                        Err(error) => {
                            self.report(
                                call,
                                LlmObservation::failure(
                                    call.model,
                                    call.operation_type,
                                    classify(error),
                                    latency_ms,
                                )
                                .with_retry_count(attempt),
                            )
                            .await;
                        }
                    }
                    outcome.map(|response| response.value)
                }
            })
            .await
    }

    async fn report(&self, call: &LlmCall<'_>, observation: LlmObservation) {
        let cost = self.monitor.prices().cost(
            &observation.model,
            observation.request_tokens,
            observation.response_tokens,
        );
        let mut usage = UsageRecord::new(
            call.operation_type,
            call.model,
            cost,
            observation.request_tokens + observation.response_tokens,
            observation.latency_ms,
            observation.success,
        );
        if let Some(user) = call.user_id {
            usage = usage.with_user(user);
        }
        self.analytics.record(&usage).await;
        self.monitor.observe(&observation).await;
    }

    /// Assess `date` against the configured number of preceding days.
    pub async fn assess_day(&self, date: NaiveDate) -> DailyRiskReport {
        let current = self.analytics.window_metrics(date).await;
        let baseline = self
            .analytics
            .baseline_metrics(date, self.detector.baseline_periods())
            .await;
        let assessment = self.detector.assess(&current, &baseline);
        DailyRiskReport {
            date,
            current,
            baseline,
            assessment,
        }
    }
}
