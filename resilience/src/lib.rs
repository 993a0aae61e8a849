//! # Resilience
//!
//! Turns flaky, metered AI calls into bounded, observable operations:
//!
//! - [`classify`]: maps any error into the closed `ErrorKind` taxonomy
//! - [`RetryPlanner`]: per-kind budgets, delay ladders, strategies, and
//!   input modifications
//! - [`RetryExecutor`]: sequential retry loop with per-day counters
//! - [`ContentCache`]: content-addressed result cache
//! - [`ErrorGuidance`]: what the user should do next
//! - [`ResilienceLayer`]: all of the above on one shared store

pub mod cache;
pub mod classifier;
pub mod executor;
pub mod guidance;
pub mod layer;
pub mod planner;

pub use cache::{CacheEntry, CacheSource, ContentCache, ContentInput, OperationKind};
pub use classifier::{classify, classify_message};
pub use executor::{RetryEvent, RetryExecutor, RetryOutcome, RetryStats};
pub use guidance::ErrorGuidance;
pub use layer::{DailyRiskReport, LlmCall, LlmResponse, ResilienceLayer};
pub use planner::{RetryPlanner, backoff_with_jitter};
