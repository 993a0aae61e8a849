//! Process-local `MetricsStore` backed by a sharded concurrent map.
//!
//! Used by tests, the CLI fallback, and single-process deployments. Expired
//! entries are dropped lazily on access.

use ai_core::MetricsStore;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use errors::StorageError;
use std::sync::Arc;
use std::time::{Duration, Instant};

const BACKEND: &str = "Memory";

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<DashMap<String, StoredValue>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) keys.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.is_expired() && e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        keys
    }

    fn update<F>(&self, key: &str, ttl: Option<Duration>, f: F) -> Result<String, StorageError>
    where
        F: FnOnce(Option<&str>) -> Result<String, StorageError>
    {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let current = if occupied.get().is_expired() {
                    None
                } else {
                    Some(occupied.get().value.as_str())
                };
                let next = f(current)?;
                occupied.insert(StoredValue::new(next.clone(), ttl));
                Ok(next)
            }
            Entry::Vacant(vacant) => {
                let next = f(None)?;
                vacant.insert(StoredValue::new(next.clone(), ttl));
                Ok(next)
            }
        }
    }
}

#[async_trait]
impl MetricsStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, v| v.is_expired());
        }
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        self.entries
            .insert(key.to_string(), StoredValue::new(value.to_string(), ttl));
        Ok(())
    }

    async fn increment(
        &self,
        key: &str,
        by: i64,
        ttl: Option<Duration>,
    ) -> Result<i64, StorageError> {
        let next = self.update(key, ttl, |current| {
            let current = match current {
                Some(raw) => raw.parse::<i64>().map_err(|e| StorageError::query(BACKEND, e))?,
                None => 0,
            };
            Ok((current + by).to_string())
        })?;
        next.parse::<i64>().map_err(|e| StorageError::query(BACKEND, e))
    }

    async fn increment_float(
        &self,
        key: &str,
        by: f64,
        ttl: Option<Duration>,
    ) -> Result<f64, StorageError> {
        let next = self.update(key, ttl, |current| {
            let current = match current {
                Some(raw) => raw.parse::<f64>().map_err(|e| StorageError::query(BACKEND, e))?,
                None => 0.0,
            };
            Ok((current + by).to_string())
        })?;
        next.parse::<f64>().map_err(|e| StorageError::query(BACKEND, e))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}
