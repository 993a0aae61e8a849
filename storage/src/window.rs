//! Fixed-capacity FIFO window persisted as a JSON array under one key.
//!
//! Updates are read-modify-write and NOT atomic: concurrent writers can lose
//! each other's samples. Windows back anomaly detection only, never billing,
//! so a lost sample is acceptable.

use crate::ext::MetricsStoreExt;
use ai_core::MetricsStore;
use errors::StorageError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

pub struct RollingWindow<T> {
    store: Arc<dyn MetricsStore>,
    key: String,
    capacity: usize,
    ttl: Option<Duration>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RollingWindow<T>
where
    T: Serialize + DeserializeOwned + Send + Sync
{
    pub fn new(store: Arc<dyn MetricsStore>, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            store,
            key: key.into(),
            capacity: capacity.max(1),
            ttl: None,
            _marker: PhantomData,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub async fn values(&self) -> Result<Vec<T>, StorageError> {
        Ok(self.store.get_json(&self.key).await?.unwrap_or_default())
    }

    /// Appends `value`, evicting the oldest entries beyond capacity, and
    /// returns the window contents as they were *before* the append.
    pub async fn push(&self, value: T) -> Result<Vec<T>, StorageError>
    where
        T: Clone
    {
        let history = self.values().await?;
        let next = bounded_append(history.clone(), value, self.capacity);
        self.store.set_json(&self.key, &next, self.ttl).await?;
        Ok(history)
    }

    pub async fn len(&self) -> Result<usize, StorageError> {
        Ok(self.values().await?.len())
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.delete(&self.key).await
    }
}

#[must_use]
pub fn bounded_append<T>(mut items: Vec<T>, value: T, capacity: usize) -> Vec<T> {
    items.push(value);
    if items.len() > capacity {
        let overflow = items.len() - capacity;
        items.drain(..overflow);
    }
    items
}

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
