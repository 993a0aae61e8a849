//! Core traits for the resilience layer

use crate::types::MonitoringEvent;
use async_trait::async_trait;
use errors::StorageError;
use std::time::Duration;

/// Shared, namespaced, TTL-capable key-value store.
///
/// Opened once at process start and shared by reference
/// (`Arc<dyn MetricsStore>`) with every component. Counters go through the
/// atomic `increment*` primitives; anything else is plain get/set.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Short backend label used in logs and errors.
    fn backend_name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>)
    -> Result<(), StorageError>;

    /// Atomically adds `by` and returns the new value. The TTL is (re)applied
    /// on every call.
    async fn increment(
        &self,
        key: &str,
        by: i64,
        ttl: Option<Duration>,
    ) -> Result<i64, StorageError>;

    async fn increment_float(
        &self,
        key: &str,
        by: f64,
        ttl: Option<Duration>,
    ) -> Result<f64, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Optional external monitoring collaborator (error reporting service,
/// pager, etc.). Capture is fire-and-forget.
pub trait MonitoringSink: Send + Sync {
    fn capture(&self, event: &MonitoringEvent);
}
