//! Test doubles for the `MetricsStore` and `MonitoringSink` seams.

use ai_core::{MetricsStore, MonitoringEvent, MonitoringSink, Severity};
use async_trait::async_trait;
use errors::StorageError;
use std::sync::Mutex;
use std::time::Duration;

/// A store whose every operation fails, standing in for an unreachable
/// backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn error() -> StorageError {
        StorageError::Unavailable {
            backend: "Unavailable".to_string(),
            reason: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl MetricsStore for UnavailableStore {
    fn backend_name(&self) -> &'static str {
        "Unavailable"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(Self::error())
    }

    async fn set(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        Err(Self::error())
    }

    async fn increment(
        &self,
        _key: &str,
        _by: i64,
        _ttl: Option<Duration>,
    ) -> Result<i64, StorageError> {
        Err(Self::error())
    }

    async fn increment_float(
        &self,
        _key: &str,
        _by: f64,
        _ttl: Option<Duration>,
    ) -> Result<f64, StorageError> {
        Err(Self::error())
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(Self::error())
    }
}

/// Captures every forwarded monitoring event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MonitoringEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MonitoringEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count_with_severity(&self, severity: Severity) -> usize {
        self.events()
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }
}

impl MonitoringSink for RecordingSink {
    fn capture(&self, event: &MonitoringEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
