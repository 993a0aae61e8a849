//! # Retry Planning
//!
//! Per-kind retry policy as exhaustive tables:
//!
//! | Kind                          | Budget | Delays (s)   | Strategy                    |
//! |-------------------------------|--------|--------------|-----------------------------|
//! | `llm_error`                   | 3      | 2, 5, 10     | exponential_backoff         |
//! | `json_parse_error`            | 3      | 1, 2, 3      | immediate_with_modification |
//! | `analysis_validation_error`   | 2      | 1, 3         | immediate_with_modification |
//! | `generation_validation_error` | 2      | 2, 4         | immediate_with_modification |
//! | `document_processing_error`   | 2      | 5, 15        | alternative_approach        |
//! | `network_error`               | 3      | 2, 5, 10     | exponential_backoff         |
//! | `timeout_error`               | 2      | 5, 15        | exponential_backoff         |
//! | `database_error`              | 3      | 1, 3, 5      | exponential_backoff         |
//! | `structure_validation_error`  | 2      | 0, 0         | immediate                   |
//! | `business_rules_error`        | 1      | 0            | fixed_delay                 |
//! | `rate_limit_error`            | 3      | 30, 60, 120  | fixed_delay                 |
//! | `unknown_error`               | 1      | 5            | fixed_delay                 |
//!
//! Exponential kinds recompute the delay as `base * 2^attempt` plus 10-30%
//! jitter, rounded to one decimal.

use ai_core::{Complexity, ErrorKind, InputModifications, RetryPlan, RetryStrategy};
use config::RetryConfig;
use rand::Rng;

const JSON_TEMPERATURES: [f32; 3] = [0.1, 0.0, 0.0];
const JSON_MAX_TOKENS: [u32; 3] = [4000, 3000, 2000];
const GENERATION_ITEM_LIMITS: [u32; 3] = [15, 10, 5];
const ANALYSIS_CONTENT_LIMITS: [usize; 2] = [8000, 4000];

#[derive(Debug, Clone)]
pub struct RetryPlanner {
    max_delay_seconds: f64,
}

impl Default for RetryPlanner {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPlanner {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_delay_seconds: config.max_delay_seconds,
        }
    }

    /// Retry budget: the number of retries after the initial attempt.
    pub fn max_retries(&self, kind: ErrorKind) -> u32 {
        match kind {
            ErrorKind::LlmError => 3,
            ErrorKind::JsonParseError => 3,
            ErrorKind::AnalysisValidationError => 2,
            ErrorKind::GenerationValidationError => 2,
            ErrorKind::DocumentProcessingError => 2,
            ErrorKind::NetworkError => 3,
            ErrorKind::TimeoutError => 2,
            ErrorKind::DatabaseError => 3,
            ErrorKind::StructureValidationError => 2,
            ErrorKind::BusinessRulesError => 1,
            ErrorKind::RateLimitError => 3,
            ErrorKind::UnknownError => 1,
        }
    }

    pub fn delay_ladder(&self, kind: ErrorKind) -> &'static [f64] {
        match kind {
            ErrorKind::LlmError => &[2.0, 5.0, 10.0],
            ErrorKind::JsonParseError => &[1.0, 2.0, 3.0],
            ErrorKind::AnalysisValidationError => &[1.0, 3.0],
            ErrorKind::GenerationValidationError => &[2.0, 4.0],
            ErrorKind::DocumentProcessingError => &[5.0, 15.0],
            ErrorKind::NetworkError => &[2.0, 5.0, 10.0],
            ErrorKind::TimeoutError => &[5.0, 15.0],
            ErrorKind::DatabaseError => &[1.0, 3.0, 5.0],
            ErrorKind::StructureValidationError => &[0.0, 0.0],
            ErrorKind::BusinessRulesError => &[0.0],
            ErrorKind::RateLimitError => &[30.0, 60.0, 120.0],
            ErrorKind::UnknownError => &[5.0],
        }
    }

    pub fn strategy(&self, kind: ErrorKind) -> RetryStrategy {
        match kind {
            ErrorKind::LlmError
            | ErrorKind::NetworkError
            | ErrorKind::TimeoutError
            | ErrorKind::DatabaseError => RetryStrategy::ExponentialBackoff,
            ErrorKind::JsonParseError
            | ErrorKind::AnalysisValidationError
            | ErrorKind::GenerationValidationError => RetryStrategy::ImmediateWithModification,
            ErrorKind::DocumentProcessingError => RetryStrategy::AlternativeApproach,
            ErrorKind::StructureValidationError => RetryStrategy::Immediate,
            ErrorKind::BusinessRulesError | ErrorKind::RateLimitError | ErrorKind::UnknownError => {
                RetryStrategy::FixedDelay
            }
        }
    }

    /// Percent chance the next attempt succeeds, for user messaging only.
    pub fn estimated_success_rate(&self, kind: ErrorKind, attempt_count: u32) -> u8 {
        let table: &[u8] = match kind {
            ErrorKind::LlmError => &[85, 70, 50],
            ErrorKind::JsonParseError => &[90, 80, 60],
            ErrorKind::AnalysisValidationError => &[75, 50],
            ErrorKind::GenerationValidationError => &[80, 60],
            ErrorKind::DocumentProcessingError => &[60, 40],
            ErrorKind::NetworkError => &[80, 65, 50],
            ErrorKind::TimeoutError => &[70, 50],
            ErrorKind::DatabaseError => &[85, 70, 55],
            ErrorKind::StructureValidationError => &[85, 70],
            ErrorKind::BusinessRulesError => &[20],
            ErrorKind::RateLimitError => &[90, 80, 70],
            ErrorKind::UnknownError => &[30],
        };
        at_or_last(table, attempt_count).copied().unwrap_or(0)
    }

    /// Decide how to retry after `attempt_count` failed attempts.
    ///
    /// Returns `None` once the kind's budget is spent.
    pub fn plan(&self, kind: ErrorKind, attempt_count: u32, operation_type: &str) -> Option<RetryPlan> {
        if attempt_count >= self.max_retries(kind) {
            tracing::debug!(
                operation = %operation_type,
                error_kind = %kind,
                attempt_count,
                "Retry budget exhausted"
            );
            return None;
        }

        let strategy = self.strategy(kind);
        let plan = RetryPlan {
            can_retry: true,
            next_attempt_number: attempt_count + 1,
            delay_seconds: self.delay_seconds(kind, strategy, attempt_count),
            strategy,
            input_modifications: self.input_modifications(kind, attempt_count),
            estimated_success_rate: self.estimated_success_rate(kind, attempt_count),
            automatic: kind.is_transient() && attempt_count < 2,
        };
        tracing::debug!(
            operation = %operation_type,
            error_kind = %kind,
            attempt_count,
            delay_seconds = plan.delay_seconds,
            strategy = %plan.strategy,
            "Retry planned"
        );
        Some(plan)
    }

    fn delay_seconds(&self, kind: ErrorKind, strategy: RetryStrategy, attempt_count: u32) -> f64 {
        let ladder = self.delay_ladder(kind);
        let delay = match strategy {
            RetryStrategy::ExponentialBackoff => {
                let base = ladder.first().copied().unwrap_or(1.0);
                let jitter = rand::thread_rng().gen_range(0.1..=0.3);
                backoff_with_jitter(base, attempt_count, jitter)
            }
            _ => at_or_last(ladder, attempt_count).copied().unwrap_or(0.0),
        };
        delay.min(self.max_delay_seconds).max(0.0)
    }

    pub fn input_modifications(&self, kind: ErrorKind, attempt_count: u32) -> InputModifications {
        match kind {
            ErrorKind::JsonParseError => InputModifications::JsonParse {
                temperature: at_or_last(&JSON_TEMPERATURES, attempt_count)
                    .copied()
                    .unwrap_or(0.0),
                max_tokens: at_or_last(&JSON_MAX_TOKENS, attempt_count)
                    .copied()
                    .unwrap_or(2000),
            },
            ErrorKind::GenerationValidationError => InputModifications::Generation {
                item_count_limit: at_or_last(&GENERATION_ITEM_LIMITS, attempt_count)
                    .copied()
                    .unwrap_or(5),
                complexity: Complexity::Simple,
            },
            ErrorKind::AnalysisValidationError => InputModifications::Analysis {
                simplified_prompt: true,
                content_limit_chars: at_or_last(&ANALYSIS_CONTENT_LIMITS, attempt_count)
                    .copied()
                    .unwrap_or(4000),
            },
            ErrorKind::DocumentProcessingError => InputModifications::Document { text_only: true },
            ErrorKind::LlmError
            | ErrorKind::NetworkError
            | ErrorKind::TimeoutError
            | ErrorKind::DatabaseError
            | ErrorKind::StructureValidationError
            | ErrorKind::BusinessRulesError
            | ErrorKind::RateLimitError
            | ErrorKind::UnknownError => InputModifications::None,
        }
    }
}

/// `base * 2^attempt`, plus `jitter` (a fraction, clamped to 0.1-0.3) of
/// that, rounded to one decimal.
pub fn backoff_with_jitter(base: f64, attempt_count: u32, jitter: f64) -> f64 {
    let raw = base * 2f64.powi(attempt_count.min(16) as i32);
    let jittered = raw * (1.0 + jitter.clamp(0.1, 0.3));
    (jittered * 10.0).round() / 10.0
}

fn at_or_last<T>(table: &[T], index: u32) -> Option<&T> {
    table.get(index as usize).or_else(|| table.last())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> RetryPlanner {
        RetryPlanner::default()
    }

    #[test]
    fn test_plan_absent_exactly_at_budget() {
        let planner = planner();
        for kind in ErrorKind::ALL {
            let budget = planner.max_retries(kind);
            for attempt in 0..budget {
                let plan = planner.plan(kind, attempt, "op").unwrap();
                assert!(plan.can_retry);
                assert_eq!(plan.next_attempt_number, attempt + 1);
            }
            assert!(planner.plan(kind, budget, "op").is_none(), "{kind} at budget");
            assert!(planner.plan(kind, budget + 5, "op").is_none());
        }
    }

    #[test]
    fn test_budgets() {
        let planner = planner();
        assert_eq!(planner.max_retries(ErrorKind::LlmError), 3);
        assert_eq!(planner.max_retries(ErrorKind::JsonParseError), 3);
        assert_eq!(planner.max_retries(ErrorKind::BusinessRulesError), 1);
        assert_eq!(planner.max_retries(ErrorKind::DatabaseError), 3);
    }

    #[test]
    fn test_backoff_strictly_increasing_without_jitter() {
        let mut previous = 0.0;
        for attempt in 0..6 {
            let delay = backoff_with_jitter(2.0, attempt, 0.0);
            assert!(delay > previous);
            previous = delay;
        }
    }

    #[test]
    fn test_jitter_never_drops_below_base() {
        let planner = planner();
        for attempt in 0..3 {
            for _ in 0..50 {
                let plan = planner.plan(ErrorKind::LlmError, attempt, "op").unwrap();
                let raw = 2.0 * 2f64.powi(attempt as i32);
                assert!(plan.delay_seconds >= raw, "{} < {}", plan.delay_seconds, raw);
                assert!(plan.delay_seconds <= (raw * 1.3 * 10.0).round() / 10.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_delay_is_rounded_to_one_decimal() {
        let delay = backoff_with_jitter(1.0, 0, 0.237);
        assert_eq!(delay, 1.2);
        let planner = planner();
        let plan = planner.plan(ErrorKind::NetworkError, 1, "op").unwrap();
        let scaled = plan.delay_seconds * 10.0;
        assert!((scaled - scaled.round()).abs() < 1e-9);
    }

    #[test]
    fn test_delay_is_capped() {
        let planner = RetryPlanner::from_config(&RetryConfig {
            max_delay_seconds: 3.0,
            ..RetryConfig::default()
        });
        let plan = planner.plan(ErrorKind::LlmError, 2, "op").unwrap();
        assert_eq!(plan.delay_seconds, 3.0);
    }

    #[test]
    fn test_ladder_delay_for_fixed_strategies() {
        let planner = planner();
        let plan = planner.plan(ErrorKind::RateLimitError, 1, "op").unwrap();
        assert_eq!(plan.strategy, RetryStrategy::FixedDelay);
        assert_eq!(plan.delay_seconds, 60.0);

        let plan = planner.plan(ErrorKind::JsonParseError, 2, "op").unwrap();
        assert_eq!(plan.delay_seconds, 3.0);
    }

    #[test]
    fn test_automatic_only_for_transient_early_attempts() {
        let planner = planner();
        assert!(planner.plan(ErrorKind::LlmError, 0, "op").unwrap().automatic);
        assert!(planner.plan(ErrorKind::LlmError, 1, "op").unwrap().automatic);
        assert!(!planner.plan(ErrorKind::LlmError, 2, "op").unwrap().automatic);
        assert!(!planner.plan(ErrorKind::BusinessRulesError, 0, "op").unwrap().automatic);
        assert!(!planner
            .plan(ErrorKind::GenerationValidationError, 0, "op")
            .unwrap()
            .automatic);
    }

    #[test]
    fn test_json_parse_lowers_temperature() {
        let planner = planner();
        let temps: Vec<f32> = (0..3)
            .map(|a| match planner.plan(ErrorKind::JsonParseError, a, "op").unwrap().input_modifications {
                InputModifications::JsonParse { temperature, .. } => temperature,
                other => panic!("unexpected {other:?}")
            })
            .collect();
        assert_eq!(temps, vec![0.1, 0.0, 0.0]);
    }

    #[test]
    fn test_generation_shrinks_item_count() {
        let planner = planner();
        let limits: Vec<u32> = (0..3)
            .map(|a| match planner.input_modifications(ErrorKind::GenerationValidationError, a) {
                InputModifications::Generation {
                    item_count_limit,
                    complexity,
                } => {
                    assert_eq!(complexity, Complexity::Simple);
                    item_count_limit
                }
                other => panic!("unexpected {other:?}")
            })
            .collect();
        assert_eq!(limits, vec![15, 10, 5]);
    }

    #[test]
    fn test_document_falls_back_to_text_only() {
        let plan = planner()
            .plan(ErrorKind::DocumentProcessingError, 0, "op")
            .unwrap();
        assert_eq!(plan.strategy, RetryStrategy::AlternativeApproach);
        assert_eq!(
            plan.input_modifications,
            InputModifications::Document { text_only: true }
        );
    }

    #[test]
    fn test_success_rate_lookup() {
        let planner = planner();
        assert_eq!(planner.estimated_success_rate(ErrorKind::LlmError, 0), 85);
        assert_eq!(planner.estimated_success_rate(ErrorKind::LlmError, 9), 50);
    }
}
