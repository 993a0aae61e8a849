//! Typed fault raised by AI operations that already know their category.

use crate::types::ErrorKind;
use thiserror::Error;

/// A fault carrying an explicit `ErrorKind`.
///
/// The classifier trusts the kind of an `AiFault` found anywhere in an error
/// source chain over any message heuristic.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind}: {message}")]
pub struct AiFault {
    pub kind: ErrorKind,
    pub message: String,
}

impl AiFault {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_display_includes_kind() {
        let fault = AiFault::new(ErrorKind::RateLimitError, "429 from provider");
        assert_eq!(fault.to_string(), "rate_limit_error: 429 from provider");
    }
}
