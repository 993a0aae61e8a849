use metrics::{counter, histogram};

/// Process-level metrics for the resilience layer, emitted through the
/// `metrics` facade. Whatever recorder the binary installs receives them.
#[derive(Debug, Clone, Copy)]
pub struct ResilienceTelemetry {
    enabled: bool,
}

impl Default for ResilienceTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResilienceTelemetry {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn with_enabled(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record_retry_attempt(&self, operation: &str, error_kind: &str) {
        if !self.enabled {
            return;
        }
        let labels = [
            ("operation", operation.to_string()),
            ("error_kind", error_kind.to_string())
        ];
        counter!("ai_retry_attempts_total", &labels).increment(1);
    }

    pub fn record_retry_success(&self, operation: &str, retry_count: u32) {
        if !self.enabled {
            return;
        }
        let labels = [("operation", operation.to_string())];
        counter!("ai_retry_success_total", &labels).increment(1);
        histogram!("ai_retry_count", &labels).record(f64::from(retry_count));
    }

    pub fn record_retry_exhausted(&self, operation: &str, error_kind: &str) {
        if !self.enabled {
            return;
        }
        let labels = [
            ("operation", operation.to_string()),
            ("error_kind", error_kind.to_string())
        ];
        counter!("ai_retry_exhausted_total", &labels).increment(1);
    }

    pub fn record_cache_hit(&self, operation_kind: &str) {
        if !self.enabled {
            return;
        }
        counter!("ai_cache_hits_total", "operation_kind" => operation_kind.to_string())
            .increment(1);
    }

    pub fn record_cache_miss(&self, operation_kind: &str) {
        if !self.enabled {
            return;
        }
        counter!("ai_cache_misses_total", "operation_kind" => operation_kind.to_string())
            .increment(1);
    }

    pub fn record_usage(&self, operation: &str, model: &str, cost: f64, latency_ms: u64) {
        if !self.enabled {
            return;
        }
        // Counters are integral; cost is tracked in micro-units.
        let labels = [
            ("operation", operation.to_string()),
            ("model", model.to_string())
        ];
        counter!("ai_usage_cost_total", &labels).increment((cost * 1_000_000.0).round() as u64);
        histogram!("ai_operation_latency_seconds", "operation" => operation.to_string())
            .record(latency_ms as f64 / 1000.0);
    }

    pub fn record_llm_anomaly(&self, anomaly_type: &str, model: &str) {
        if !self.enabled {
            return;
        }
        let labels = [
            ("anomaly_type", anomaly_type.to_string()),
            ("model", model.to_string())
        ];
        counter!("ai_llm_anomalies_total", &labels).increment(1);
    }

    pub fn record_usage_anomaly(&self, anomaly_type: &str) {
        if !self.enabled {
            return;
        }
        counter!("ai_usage_anomalies_total", "anomaly_type" => anomaly_type.to_string())
            .increment(1);
    }

    pub fn record_error_tracked(&self, error_kind: &str, severity: &str) {
        if !self.enabled {
            return;
        }
        let labels = [
            ("error_kind", error_kind.to_string()),
            ("severity", severity.to_string())
        ];
        counter!("ai_errors_tracked_total", &labels).increment(1);
    }
}
