//! User-facing guidance derived from an error kind and retry history.
//!
//! The UI layer renders this; the core only decides what is retryable and
//! what the user should do next.

use crate::planner::RetryPlanner;
use ai_core::ErrorKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorGuidance {
    pub kind: ErrorKind,
    pub retryable: bool,
    pub automatic: bool,
    pub suggested_action: String,
    pub estimated_success_rate: u8,
    pub user_message: String,
}

impl ErrorGuidance {
    pub fn for_error(planner: &RetryPlanner, kind: ErrorKind, attempt_count: u32) -> Self {
        let plan = planner.plan(kind, attempt_count, "guidance");
        let retryable = plan.is_some();
        let suggested_action = if retryable {
            retry_action(kind)
        } else {
            give_up_action(kind)
        };

        Self {
            kind,
            retryable,
            automatic: plan.as_ref().is_some_and(|p| p.automatic),
            suggested_action: suggested_action.to_string(),
            estimated_success_rate: plan.map_or(0, |p| p.estimated_success_rate),
            user_message: user_message(kind).to_string(),
        }
    }
}

fn user_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::LlmError => "The AI service had a temporary problem.",
        ErrorKind::JsonParseError => "The AI returned a response we could not read.",
        ErrorKind::AnalysisValidationError => "We could not fully analyze your content.",
        ErrorKind::GenerationValidationError => "The generated form did not pass our checks.",
        ErrorKind::DocumentProcessingError => "We had trouble reading your document.",
        ErrorKind::NetworkError => "We could not reach the AI service.",
        ErrorKind::TimeoutError => "The AI service took too long to respond.",
        ErrorKind::DatabaseError => "We could not save your progress.",
        ErrorKind::StructureValidationError => "The generated structure was incomplete.",
        ErrorKind::BusinessRulesError => "This request is not allowed on your current plan.",
        ErrorKind::RateLimitError => "Too many requests right now.",
        ErrorKind::UnknownError => "Something went wrong.",
    }
}

fn retry_action(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::LlmError
        | ErrorKind::NetworkError
        | ErrorKind::TimeoutError
        | ErrorKind::DatabaseError => "retry_automatically",
        ErrorKind::JsonParseError | ErrorKind::StructureValidationError => {
            "retry_with_simplified_request"
        }
        ErrorKind::AnalysisValidationError => "retry_with_shorter_content",
        ErrorKind::GenerationValidationError => "retry_with_fewer_fields",
        ErrorKind::DocumentProcessingError => "retry_with_text_only_extraction",
        ErrorKind::RateLimitError => "wait_and_retry",
        ErrorKind::BusinessRulesError => "review_plan_limits",
        ErrorKind::UnknownError => "retry_once",
    }
}

fn give_up_action(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::DocumentProcessingError => "upload_different_format",
        ErrorKind::AnalysisValidationError | ErrorKind::GenerationValidationError => {
            "edit_input_and_retry"
        }
        ErrorKind::BusinessRulesError => "upgrade_plan",
        ErrorKind::RateLimitError => "try_again_later",
        ErrorKind::LlmError
        | ErrorKind::JsonParseError
        | ErrorKind::NetworkError
        | ErrorKind::TimeoutError
        | ErrorKind::DatabaseError
        | ErrorKind::StructureValidationError
        | ErrorKind::UnknownError => "contact_support",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_error_guidance() {
        let guidance = ErrorGuidance::for_error(&RetryPlanner::default(), ErrorKind::LlmError, 0);
        assert!(guidance.retryable);
        assert!(guidance.automatic);
        assert_eq!(guidance.suggested_action, "retry_automatically");
        assert_eq!(guidance.estimated_success_rate, 85);
    }

    #[test]
    fn test_exhausted_guidance() {
        let planner = RetryPlanner::default();
        let guidance = ErrorGuidance::for_error(&planner, ErrorKind::DocumentProcessingError, 2);
        assert!(!guidance.retryable);
        assert!(!guidance.automatic);
        assert_eq!(guidance.suggested_action, "upload_different_format");
        assert_eq!(guidance.estimated_success_rate, 0);
    }

    #[test]
    fn test_user_input_errors_are_never_automatic() {
        let planner = RetryPlanner::default();
        for kind in [
            ErrorKind::BusinessRulesError,
            ErrorKind::GenerationValidationError,
            ErrorKind::AnalysisValidationError
        ] {
            assert!(!ErrorGuidance::for_error(&planner, kind, 0).automatic);
        }
    }

    #[test]
    fn test_every_kind_has_a_message() {
        let planner = RetryPlanner::default();
        for kind in ErrorKind::ALL {
            assert!(!ErrorGuidance::for_error(&planner, kind, 0).user_message.is_empty());
        }
    }
}
