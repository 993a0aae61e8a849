//! # Usage Anomaly Detection
//!
//! Compares a current usage window against the mean of the preceding
//! windows and produces a weighted risk score with recommended actions.
//! The detector owns no storage: both snapshots are computed by
//! [`crate::UsageAnalytics`].

use crate::telemetry::ResilienceTelemetry;
use crate::usage_analytics::WindowMetrics;
use chrono::{DateTime, Utc};
use config::AnomalyConfig;
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UsageAnomalyType {
    HighRequestVolume,
    UnusualCost,
    HighErrorRate,
    SlowResponse,
    RequestBurst,
}

impl UsageAnomalyType {
    pub fn recommended_action(&self) -> &'static str {
        match self {
            UsageAnomalyType::HighRequestVolume => {
                "Review traffic sources and apply per-user rate limits"
            }
            UsageAnomalyType::UnusualCost => {
                "Audit expensive operations and consider cheaper models or caching"
            }
            UsageAnomalyType::HighErrorRate => {
                "Check AI provider status and recent deployments"
            }
            UsageAnomalyType::SlowResponse => {
                "Reduce prompt sizes or switch to a faster model"
            }
            UsageAnomalyType::RequestBurst => {
                "Investigate possible abuse and enable burst throttling"
            }
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskSeverity {
    pub fn points(&self) -> u32 {
        match self {
            RiskSeverity::Low => 1,
            RiskSeverity::Medium => 3,
            RiskSeverity::High => 7,
            RiskSeverity::Critical => 10,
        }
    }

    /// Bucket a summed score: 0-2 low, 3-6 medium, 7-15 high, 16+ critical.
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=2 => RiskSeverity::Low,
            3..=6 => RiskSeverity::Medium,
            7..=15 => RiskSeverity::High,
            _ => RiskSeverity::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageAnomaly {
    pub anomaly_type: UsageAnomalyType,
    pub severity: RiskSeverity,
    pub current_value: f64,
    pub threshold: f64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskSeverity,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub anomalies: Vec<UsageAnomaly>,
    pub risk: RiskAssessment,
    pub recommendations: Vec<String>,
}

impl Assessment {
    pub fn has(&self, anomaly_type: UsageAnomalyType) -> bool {
        self.anomalies.iter().any(|a| a.anomaly_type == anomaly_type)
    }
}

pub struct UsageAnomalyDetector {
    config: AnomalyConfig,
    telemetry: ResilienceTelemetry,
}

impl UsageAnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self {
            config,
            telemetry: ResilienceTelemetry::new(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: ResilienceTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn baseline_periods(&self) -> u32 {
        self.config.baseline_periods
    }

    pub fn assess(&self, current: &WindowMetrics, baseline: &WindowMetrics) -> Assessment {
        let now = Utc::now();
        let mut anomalies = Vec::new();
        let mut push = |anomaly_type, severity, current_value: f64, threshold: f64, description| {
            anomalies.push(UsageAnomaly {
                anomaly_type,
                severity,
                current_value,
                threshold,
                description,
                timestamp: now,
            });
        };

        if baseline.request_count > 0.0 {
            let threshold = baseline.request_count * self.config.request_multiplier;
            if current.request_count > threshold {
                push(
                    UsageAnomalyType::HighRequestVolume,
                    RiskSeverity::High,
                    current.request_count,
                    threshold,
                    format!(
                        "{:.0} requests vs historical average of {:.1}",
                        current.request_count, baseline.request_count
                    ),
                );
            }
        }

        if baseline.cost > 0.0 {
            let threshold = baseline.cost * self.config.cost_multiplier;
            if current.cost > threshold {
                push(
                    UsageAnomalyType::UnusualCost,
                    RiskSeverity::High,
                    current.cost,
                    threshold,
                    format!(
                        "Cost ${:.2} vs historical average of ${:.2}",
                        current.cost, baseline.cost
                    ),
                );
            }
        }

        let error_rate = current.error_rate_percent();
        if error_rate > self.config.error_rate_percent {
            push(
                UsageAnomalyType::HighErrorRate,
                RiskSeverity::Critical,
                error_rate,
                self.config.error_rate_percent,
                format!("Error rate {error_rate:.1}%"),
            );
        }

        let latency_limit_ms = self.config.latency_seconds * 1000.0;
        if current.avg_latency_ms > latency_limit_ms {
            push(
                UsageAnomalyType::SlowResponse,
                RiskSeverity::Medium,
                current.avg_latency_ms,
                latency_limit_ms,
                format!(
                    "Average response time {:.1}s",
                    current.avg_latency_ms / 1000.0
                ),
            );
        }

        let burst_limit = self.config.burst_per_minute as f64;
        if current.peak_per_minute > burst_limit {
            push(
                UsageAnomalyType::RequestBurst,
                RiskSeverity::Medium,
                current.peak_per_minute,
                burst_limit,
                format!("{:.0} requests in a single minute", current.peak_per_minute),
            );
        }

        let score = anomalies.iter().map(|a| a.severity.points()).sum();
        let mut recommendations: Vec<String> = Vec::new();
        for anomaly in &anomalies {
            let action = anomaly.anomaly_type.recommended_action().to_string();
            if !recommendations.contains(&action) {
                recommendations.push(action);
            }
        }

        for anomaly in &anomalies {
            tracing::warn!(
                anomaly_type = %anomaly.anomaly_type,
                severity = %anomaly.severity,
                "[USAGE_ANOMALY] {}",
                serde_json::to_string(anomaly).unwrap_or_default()
            );
            self.telemetry
                .record_usage_anomaly(&anomaly.anomaly_type.to_string());
        }

        Assessment {
            anomalies,
            risk: RiskAssessment {
                level: RiskSeverity::from_score(score),
                score,
            },
            recommendations,
        }
    }
}
