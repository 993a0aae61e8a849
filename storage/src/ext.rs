//! Convenience reads and JSON values on top of any `MetricsStore`.
//!
//! The `*_or_zero` readers implement the degrade-to-zero contract: a missing
//! key, an unparsable value, and an unavailable backend all read as zero,
//! with the latter two logged.

use ai_core::MetricsStore;
use async_trait::async_trait;
use errors::StorageError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[async_trait]
pub trait MetricsStoreExt: MetricsStore {
    async fn get_i64_or_zero(&self, key: &str) -> i64 {
        match self.get(key).await {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(key, error = %e, "Non-integer counter value, reading as zero");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(key, error = %e, "Metrics store read failed, reading as zero");
                0
            }
        }
    }

    async fn get_f64_or_zero(&self, key: &str) -> f64 {
        match self.get(key).await {
            Ok(Some(raw)) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or_else(|| {
                    tracing::warn!(key, "Non-numeric gauge value, reading as zero");
                    0.0
                }),
            Ok(None) => 0.0,
            Err(e) => {
                tracing::warn!(key, error = %e, "Metrics store read failed, reading as zero");
                0.0
            }
        }
    }

    async fn get_json<T>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        T: DeserializeOwned + Send
    {
        match self.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(StorageError::json),
            None => Ok(None),
        }
    }

    async fn set_json<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError>
    where
        T: Serialize + Sync
    {
        let raw = serde_json::to_string(value).map_err(StorageError::json)?;
        self.set(key, &raw, ttl).await
    }
}

impl<S: MetricsStore + ?Sized> MetricsStoreExt for S {}
