//! Maps an arbitrary error into the closed `ErrorKind` taxonomy.
//!
//! Classification is total and never panics. Precedence:
//!
//! 1. An [`AiFault`] anywhere in the source chain decides by itself.
//! 2. Typed faults in the chain, in order: JSON parse, timeout, transport,
//!    persistence.
//! 3. Message heuristics over the whole chain, in the same order, then
//!    document, rate limit, LLM, and validation keywords.
//! 4. Everything else is `unknown_error`.

use ai_core::{AiFault, ErrorKind};
use errors::StorageError;
use std::error::Error;
use std::io;

const JSON_MARKERS: &[&str] = &[
    "json",
    "unexpected token",
    "unexpected character",
    "expected value",
    "trailing characters",
    "eof while parsing",
    "malformed response",
];
const TIMEOUT_MARKERS: &[&str] = &["timeout", "timed out", "deadline exceeded", "elapsed"];
const NETWORK_MARKERS: &[&str] = &[
    "connection refused",
    "connection reset",
    "connection closed",
    "broken pipe",
    "network",
    "socket",
    "dns",
    "host unreachable",
    "ssl",
    "tls handshake",
];
const DATABASE_MARKERS: &[&str] = &[
    "database",
    "sql",
    "deadlock",
    "constraint violation",
    "record not found",
    "connection pool",
    "redis",
];
const DOCUMENT_MARKERS: &[&str] = &[
    "document",
    "pdf",
    "docx",
    "extraction",
    "ocr",
    "unsupported file",
    "corrupt file",
];
const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "too many requests", "429", "quota exceeded"];

/// Classify an error and its source chain.
pub fn classify(error: &(dyn Error + 'static)) -> ErrorKind {
    let chain: Vec<&(dyn Error + 'static)> = std::iter::successors(Some(error), |e: &&(dyn Error + 'static)| (*e).source())
        .take(32)
        .collect();

    if let Some(fault) = chain.iter().find_map(|e| e.downcast_ref::<AiFault>()) {
        return fault.kind;
    }
    if let Some(kind) = classify_typed(&chain) {
        return kind;
    }

    let message = chain
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(": ");
    classify_message(&message)
}

/// Keyword classification of a bare message.
pub fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    let mentions = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if mentions(JSON_MARKERS) {
        ErrorKind::JsonParseError
    } else if mentions(TIMEOUT_MARKERS) {
        ErrorKind::TimeoutError
    } else if mentions(NETWORK_MARKERS) {
        ErrorKind::NetworkError
    } else if mentions(DATABASE_MARKERS) {
        ErrorKind::DatabaseError
    } else if mentions(DOCUMENT_MARKERS) {
        ErrorKind::DocumentProcessingError
    } else if mentions(RATE_LIMIT_MARKERS) {
        ErrorKind::RateLimitError
    } else if lower.contains("llm") {
        ErrorKind::LlmError
    } else if lower.contains("validation") {
        ErrorKind::StructureValidationError
    } else {
        ErrorKind::UnknownError
    }
}

fn classify_typed(chain: &[&(dyn Error + 'static)]) -> Option<ErrorKind> {
    if chain.iter().any(|e| e.is::<serde_json::Error>()) {
        return Some(ErrorKind::JsonParseError);
    }
    let io_kinds: Vec<io::ErrorKind> = chain
        .iter()
        .filter_map(|e| e.downcast_ref::<io::Error>())
        .map(io::Error::kind)
        .collect();

    if chain.iter().any(|e| e.is::<tokio::time::error::Elapsed>())
        || io_kinds.contains(&io::ErrorKind::TimedOut)
    {
        return Some(ErrorKind::TimeoutError);
    }
    if io_kinds.iter().any(is_transport_kind) {
        return Some(ErrorKind::NetworkError);
    }
    if chain.iter().any(|e| e.is::<StorageError>()) {
        return Some(ErrorKind::DatabaseError);
    }
    None
}

fn is_transport_kind(kind: &io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrInUse
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::NetworkDown
    )
}
