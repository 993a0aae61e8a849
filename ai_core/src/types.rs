use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Closed set of categories a fault is classified into.
///
/// Every retry budget, delay ladder, and strategy is an exhaustive `match`
/// over this enum, so adding a variant fails to compile until every policy
/// table covers it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    LlmError,
    JsonParseError,
    AnalysisValidationError,
    GenerationValidationError,
    DocumentProcessingError,
    NetworkError,
    TimeoutError,
    DatabaseError,
    StructureValidationError,
    BusinessRulesError,
    RateLimitError,
    UnknownError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 12] = [
        ErrorKind::LlmError,
        ErrorKind::JsonParseError,
        ErrorKind::AnalysisValidationError,
        ErrorKind::GenerationValidationError,
        ErrorKind::DocumentProcessingError,
        ErrorKind::NetworkError,
        ErrorKind::TimeoutError,
        ErrorKind::DatabaseError,
        ErrorKind::StructureValidationError,
        ErrorKind::BusinessRulesError,
        ErrorKind::RateLimitError,
        ErrorKind::UnknownError,
    ];

    /// Faults caused by infrastructure or model flakiness rather than by the
    /// user's input. Only these are ever retried without user involvement.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::LlmError
                | ErrorKind::JsonParseError
                | ErrorKind::NetworkError
                | ErrorKind::TimeoutError
                | ErrorKind::DatabaseError
                | ErrorKind::StructureValidationError
        )
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

/// Severity accepted by the error tracker.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Only `error` and `fatal` events leave the process.
    #[must_use]
    pub fn is_forwarded(&self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RetryStrategy {
    ExponentialBackoff,
    FixedDelay,
    Immediate,
    ImmediateWithModification,
    AlternativeApproach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Complexity {
    Full,
    Standard,
    Simple,
}

/// Kind-specific adjustments the caller should apply to the next attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputModifications {
    None,
    /// Lower sampling temperature and cap the response size.
    JsonParse { temperature: f32, max_tokens: u32 },
    /// Ask for fewer items using a simpler template.
    Generation {
        item_count_limit: u32,
        complexity: Complexity,
    },
    /// Re-run analysis with a reduced prompt.
    Analysis {
        simplified_prompt: bool,
        content_limit_chars: usize,
    },
    /// Skip layout/OCR extraction and keep plain text only.
    Document { text_only: bool },
}

impl InputModifications {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, InputModifications::None)
    }
}

/// Decision describing whether, when, and how to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPlan {
    pub can_retry: bool,
    pub next_attempt_number: u32,
    pub delay_seconds: f64,
    pub strategy: RetryStrategy,
    pub input_modifications: InputModifications,
    /// Percent, for user messaging only.
    pub estimated_success_rate: u8,
    pub automatic: bool,
}

/// One metered AI call. Cost is clamped to a finite, non-negative value on
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: Option<String>,
    pub operation_type: String,
    pub model: String,
    pub cost: f64,
    pub tokens: u64,
    pub latency_ms: u64,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(
        operation_type: impl Into<String>,
        model: impl Into<String>,
        cost: f64,
        tokens: u64,
        latency_ms: u64,
        success: bool,
    ) -> Self {
        Self {
            user_id: None,
            operation_type: operation_type.into(),
            model: model.into(),
            cost: sanitize_cost(cost),
            tokens,
            latency_ms,
            success,
            timestamp: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[must_use]
pub fn sanitize_cost(cost: f64) -> f64 {
    if cost.is_finite() && cost > 0.0 {
        cost
    } else {
        0.0
    }
}

/// Append-only audit entry written by the error tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: String,
    pub error_kind: ErrorKind,
    pub message: String,
    pub severity: Severity,
    pub context: serde_json::Value,
    pub retry_count: u32,
    pub timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(
        error_kind: ErrorKind,
        message: impl Into<String>,
        severity: Severity,
        context: serde_json::Value,
        retry_count: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            error_kind,
            message: message.into(),
            severity,
            context,
            retry_count,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnomalyType {
    ResponseTimeAnomaly,
    ErrorRateAnomaly,
    CostAnomaly,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Error,
    Critical,
}

impl AlertSeverity {
    #[must_use]
    pub fn as_tracking_severity(&self) -> Severity {
        match self {
            AlertSeverity::Warning => Severity::Warn,
            AlertSeverity::Error => Severity::Error,
            AlertSeverity::Critical => Severity::Fatal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRange {
    pub min: f64,
    pub max: f64,
}

/// A triggered reliability check. Retained briefly for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAlert {
    pub anomaly_type: AnomalyType,
    pub severity: AlertSeverity,
    pub model: String,
    pub operation_type: String,
    pub current_value: f64,
    pub expected_range: ExpectedRange,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Payload handed to an external monitoring sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringEvent {
    pub message: String,
    pub severity: Severity,
    pub tags: BTreeMap<String, String>,
    pub extra: serde_json::Value,
}

impl MonitoringEvent {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            tags: BTreeMap::new(),
            extra: serde_json::Value::Null,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = extra;
        self
    }
}
