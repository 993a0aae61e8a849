//! End-to-end retry scenarios through the fully wired layer.

use ai_core::keys::today;
use ai_core::{AiFault, ErrorKind, MetricsStore, Severity};
use config::Config;
use observability::{CostScope, LlmObservation};
use resilience::{LlmCall, LlmResponse, ResilienceLayer, RetryOutcome};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use storage::InMemoryStore;
use testing::{RecordingSink, UnavailableStore};

fn config() -> Config {
    let mut config = Config::default();
    config.retry.skip_delays = true;
    config.observability.metrics_enabled = false;
    config
}

fn layer_on(store: Arc<dyn MetricsStore>) -> (ResilienceLayer, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    (ResilienceLayer::new(store, &config(), sink.clone()), sink)
}

#[tokio::test]
async fn test_form_generation_recovers_after_three_json_failures() {
    let (layer, _) = layer_on(Arc::new(InMemoryStore::new()));
    let calls = &AtomicU32::new(0);

    let result: Result<String, AiFault> = layer
        .executor
        .execute_with_retry("form_generation", 3, |attempt| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            if attempt < 3 {
                Err(AiFault::new(ErrorKind::JsonParseError, "unexpected token"))
            } else {
                Ok("form".to_string())
            }
        })
        .await;

    assert_eq!(result.unwrap(), "form");
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    let events = layer.executor.recent_retry_events("form_generation").await;
    let success = events
        .iter()
        .find(|e| e.outcome == RetryOutcome::Succeeded)
        .unwrap();
    assert_eq!(success.retry_count, 3);
    assert_eq!(events[0].outcome, RetryOutcome::Succeeded);

    let stats = layer.executor.retry_stats("form_generation", today()).await;
    assert_eq!(stats.attempted, 3);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.exhausted, 0);
}

#[tokio::test]
async fn test_exhaustion_is_tracked_with_error_severity() {
    let (layer, sink) = layer_on(Arc::new(InMemoryStore::new()));

    let result: Result<(), AiFault> = layer
        .executor
        .execute_with_retry("document_processing", 5, |_| async {
            Err(AiFault::new(ErrorKind::DatabaseError, "deadlock"))
        })
        .await;
    assert_eq!(result.unwrap_err().kind, ErrorKind::DatabaseError);

    let counts = layer.tracker.daily_error_counts(today()).await;
    assert_eq!(counts.total, 4);
    assert_eq!(counts.by_kind.get(&ErrorKind::DatabaseError), Some(&4));

    let recent = layer.tracker.recent_errors(1).await;
    assert_eq!(recent[0].severity, Severity::Error);
    assert_eq!(recent[0].retry_count, 3);
    assert_eq!(sink.count_with_severity(Severity::Error), 1);
    assert_eq!(sink.count_with_severity(Severity::Warn), 0);
}

#[tokio::test]
async fn test_unavailable_store_never_masks_the_operation() {
    let (layer, _) = layer_on(Arc::new(UnavailableStore));

    let ok: Result<u8, AiFault> = layer
        .executor
        .execute_with_retry("op", 3, |attempt| async move {
            if attempt == 0 {
                Err(AiFault::new(ErrorKind::NetworkError, "reset"))
            } else {
                Ok(1)
            }
        })
        .await;
    assert_eq!(ok.unwrap(), 1);

    let failed: Result<u8, AiFault> = layer
        .executor
        .execute_with_retry("op", 3, |_| async {
            Err(AiFault::new(ErrorKind::BusinessRulesError, "limit"))
        })
        .await;
    assert_eq!(failed.unwrap_err().kind, ErrorKind::BusinessRulesError);
}

#[tokio::test]
async fn test_metered_llm_call_reports_every_attempt() {
    let (layer, _) = layer_on(Arc::new(InMemoryStore::new()));
    let call = LlmCall {
        operation_type: "form_generation",
        model: "gpt-4",
        user_id: Some("user-7"),
        max_retries: 3,
    };

    let result: Result<&str, AiFault> = layer
        .execute_llm(&call, |attempt| async move {
            if attempt == 0 {
                Err(AiFault::new(ErrorKind::LlmError, "overloaded"))
            } else {
                Ok(LlmResponse {
                    value: "ok",
                    request_tokens: 1000,
                    response_tokens: 500,
                })
            }
        })
        .await;
    assert_eq!(result.unwrap(), "ok");

    assert_eq!(layer.analytics.success_rate("form_generation", today()).await, 50.0);
    let user_cost = layer
        .analytics
        .daily_cost(&CostScope::User("user-7".to_string()), today())
        .await;
    assert!((user_cost - 0.06).abs() < 1e-9);

    let perf = layer.monitor.model_performance("gpt-4", today()).await;
    assert_eq!(perf.requests, 2);
    assert_eq!(perf.errors_by_kind.get(&ErrorKind::LlmError), Some(&1));
    assert_eq!(perf.retries, 1);
}

#[tokio::test]
async fn test_assess_day_with_empty_history_is_low_risk() {
    let (layer, _) = layer_on(Arc::new(InMemoryStore::new()));
    let report = layer.assess_day(today()).await;
    assert!(report.assessment.anomalies.is_empty());
    assert_eq!(report.assessment.risk.score, 0);
}

#[tokio::test]
async fn test_reliability_alerts_reach_tracker_once_in_sink() {
    let (layer, sink) = layer_on(Arc::new(InMemoryStore::new()));
    for _ in 0..10 {
        layer
            .monitor
            .observe(&LlmObservation::success("gpt-4o", "content_analysis", 0, 0, 800))
            .await;
    }
    let alerts = layer
        .monitor
        .observe(&LlmObservation::success("gpt-4o", "content_analysis", 0, 0, 9000))
        .await;
    assert_eq!(alerts.len(), 1);

    let recent = layer.tracker.recent_errors(5).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].error_kind, ErrorKind::LlmError);
    assert_eq!(recent[0].message, alerts[0].description);
    assert_eq!(sink.count_with_severity(Severity::Warn), 1);
}
