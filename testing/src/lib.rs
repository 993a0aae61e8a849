//! Shared test fixtures for the resilience workspace.
//!
//! - A single Redis testcontainer per test process, lazily started and
//!   skipped (`None`) when Docker is not available
//! - `UnavailableStore`, a `MetricsStore` that always fails
//! - `RecordingSink`, a `MonitoringSink` that keeps what it receives

mod doubles;
mod fixtures;

pub use doubles::*;
pub use fixtures::*;
