//! # Content Cache
//!
//! Content-addressed cache for expensive deterministic operations
//! (document extraction, content analysis), checked before the retry
//! executor is ever invoked.
//!
//! ## Key derivation
//!
//! The key is a SHA-256 over the input's size, declared content type, and
//! name, plus the full bytes when the input is at or under
//! `small_content_threshold_bytes`. Larger inputs are keyed by metadata
//! alone, so two large files with identical size, type, and name share a
//! key even when their bytes differ.
//!
//! ## Consistency
//!
//! Writes are last-write-wins. There is no single-flight: concurrent misses
//! for the same input all compute. Cache failures never fail the caller.

use ai_core::{KeySpace, MetricsStore};
use chrono::{DateTime, Utc};
use config::CacheConfig;
use observability::ResilienceTelemetry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use storage::MetricsStoreExt;
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationKind {
    ContentAnalysis,
    DocumentProcessing,
}

/// The bytes and declared attributes of a cacheable input.
#[derive(Debug, Clone, Copy)]
pub struct ContentInput<'a> {
    pub name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> ContentInput<'a> {
    pub fn new(name: &'a str, content_type: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            name,
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSource {
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

impl From<&ContentInput<'_>> for CacheSource {
    fn from(input: &ContentInput<'_>) -> Self {
        Self {
            name: input.name.to_string(),
            content_type: input.content_type.to_string(),
            size: input.size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub result: T,
    pub created_at: DateTime<Utc>,
    pub source: CacheSource,
}

pub struct ContentCache {
    store: Arc<dyn MetricsStore>,
    keys: KeySpace,
    config: CacheConfig,
    telemetry: ResilienceTelemetry,
}

impl ContentCache {
    pub fn new(store: Arc<dyn MetricsStore>, keys: KeySpace, config: CacheConfig) -> Self {
        Self {
            store,
            keys,
            config,
            telemetry: ResilienceTelemetry::new(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: ResilienceTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn is_small(&self, input: &ContentInput<'_>) -> bool {
        input.size() <= self.config.small_content_threshold_bytes
    }

    pub fn content_hash(&self, input: &ContentInput<'_>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.size().to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(input.content_type.as_bytes());
        hasher.update([0u8]);
        hasher.update(input.name.as_bytes());
        hasher.update([0u8]);
        if self.is_small(input) {
            hasher.update(b"content");
            hasher.update([0u8]);
            hasher.update(input.bytes);
        } else {
            hasher.update(b"metadata-only");
        }
        hex::encode(hasher.finalize())
    }

    pub fn ttl(&self, kind: OperationKind) -> Duration {
        let hours = match kind {
            OperationKind::ContentAnalysis => self.config.analysis_ttl_hours,
            OperationKind::DocumentProcessing => self.config.document_ttl_hours,
        };
        Duration::from_secs(hours * 3600)
    }

    /// Cached entry for `content_hash`, or `None` on a miss, a disabled
    /// cache, an unreadable entry, or an unreachable store.
    pub async fn get<T>(&self, content_hash: &str, kind: OperationKind) -> Option<CacheEntry<T>>
    where
        T: DeserializeOwned + Send
    {
        if !self.config.enabled {
            return None;
        }
        let key = self.entry_key(content_hash, kind);
        match self.store.get_json::<CacheEntry<T>>(&key).await {
            Ok(Some(entry)) => {
                tracing::debug!(operation_kind = %kind, hash = %content_hash, "[CACHE_HIT]");
                self.telemetry.record_cache_hit(kind.as_ref());
                Some(entry)
            }
            Ok(None) => {
                tracing::debug!(operation_kind = %kind, hash = %content_hash, "[CACHE_MISS]");
                self.telemetry.record_cache_miss(kind.as_ref());
                None
            }
            Err(e) => {
                tracing::warn!(operation_kind = %kind, error = %e, "[CACHE_MISS] cache read failed");
                self.telemetry.record_cache_miss(kind.as_ref());
                None
            }
        }
    }

    /// Store `result` under `content_hash` with the kind's TTL. Returns
    /// whether the write landed; failures are only logged.
    pub async fn put<T>(
        &self,
        content_hash: &str,
        kind: OperationKind,
        result: &T,
        source: CacheSource,
    ) -> bool
    where
        T: Serialize + Clone + Sync
    {
        if !self.config.enabled {
            return false;
        }
        let entry = CacheEntry {
            result: result.clone(),
            created_at: Utc::now(),
            source,
        };
        let key = self.entry_key(content_hash, kind);
        match self.store.set_json(&key, &entry, Some(self.ttl(kind))).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(operation_kind = %kind, error = %e, "Cache write failed");
                false
            }
        }
    }

    /// Return the cached result for `input`, or compute, cache, and return
    /// it. Errors from `compute` pass through and are never cached.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        input: &ContentInput<'_>,
        kind: OperationKind,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>
    {
        let hash = self.content_hash(input);
        if let Some(entry) = self.get::<T>(&hash, kind).await {
            return Ok(entry.result);
        }
        let result = compute().await?;
        self.put(&hash, kind, &result, CacheSource::from(input)).await;
        Ok(result)
    }

    pub async fn invalidate(&self, content_hash: &str, kind: OperationKind) {
        if let Err(e) = self.store.delete(&self.entry_key(content_hash, kind)).await {
            tracing::warn!(operation_kind = %kind, error = %e, "Cache invalidation failed");
        }
    }

    fn entry_key(&self, content_hash: &str, kind: OperationKind) -> String {
        self.keys.key(&["cache", kind.as_ref(), content_hash])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use storage::InMemoryStore;

    fn cache() -> ContentCache {
        cache_with(CacheConfig::default())
    }

    fn cache_with(config: CacheConfig) -> ContentCache {
        ContentCache::new(Arc::new(InMemoryStore::new()), KeySpace::default(), config)
            .with_telemetry(ResilienceTelemetry::disabled())
    }

    #[test]
    fn test_small_inputs_hash_full_content() {
        let cache = cache();
        let a = ContentInput::new("form.pdf", "application/pdf", b"hello");
        let b = ContentInput::new("form.pdf", "application/pdf", b"jello");
        assert_ne!(cache.content_hash(&a), cache.content_hash(&b));
        assert_eq!(cache.content_hash(&a), cache.content_hash(&a));
        assert_eq!(cache.content_hash(&a).len(), 64);
    }

    #[test]
    fn test_type_and_name_are_part_of_the_key() {
        let cache = cache();
        let a = ContentInput::new("a.txt", "text/plain", b"same");
        let b = ContentInput::new("b.txt", "text/plain", b"same");
        let c = ContentInput::new("a.txt", "text/csv", b"same");
        assert_ne!(cache.content_hash(&a), cache.content_hash(&b));
        assert_ne!(cache.content_hash(&a), cache.content_hash(&c));
    }

    /// Known approximation: above the threshold only size, type, and name
    /// are hashed, so these two different files share a key.
    #[test]
    fn test_large_inputs_with_same_metadata_share_a_key() {
        let cache = cache_with(CacheConfig {
            small_content_threshold_bytes: 8,
            ..CacheConfig::default()
        });
        let a = ContentInput::new("scan.pdf", "application/pdf", b"0123456789abcdef");
        let b = ContentInput::new("scan.pdf", "application/pdf", b"fedcba9876543210");
        assert!(!cache.is_small(&a));
        assert_eq!(cache.content_hash(&a), cache.content_hash(&b));

        let c = ContentInput::new("scan.pdf", "application/pdf", b"0123456789abcdefX");
        assert_ne!(cache.content_hash(&a), cache.content_hash(&c));
    }

    #[test]
    fn test_ttl_by_operation_kind() {
        let cache = cache();
        assert_eq!(cache.ttl(OperationKind::ContentAnalysis), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(cache.ttl(OperationKind::DocumentProcessing), Duration::from_secs(24 * 3600));
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = cache();
        let input = ContentInput::new("doc.txt", "text/plain", b"abc");
        let hash = cache.content_hash(&input);

        assert!(cache
            .put(&hash, OperationKind::DocumentProcessing, &"extracted".to_string(), CacheSource::from(&input))
            .await);
        let entry: CacheEntry<String> = cache
            .get(&hash, OperationKind::DocumentProcessing)
            .await
            .unwrap();
        assert_eq!(entry.result, "extracted");
        assert_eq!(entry.source.size, 3);

        let other: Option<CacheEntry<String>> =
            cache.get(&hash, OperationKind::ContentAnalysis).await;
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_get_or_compute_runs_once() {
        let cache = cache();
        let input = ContentInput::new("doc.txt", "text/plain", b"abc");
        let calls = &AtomicU32::new(0);

        for _ in 0..3 {
            let result: Result<Vec<String>, std::io::Error> = cache
                .get_or_compute(&input, OperationKind::ContentAnalysis, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["field".to_string()])
                })
                .await;
            assert_eq!(result.unwrap(), vec!["field".to_string()]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = cache();
        let input = ContentInput::new("doc.txt", "text/plain", b"abc");

        let first: Result<String, std::io::Error> = cache
            .get_or_compute(&input, OperationKind::DocumentProcessing, || async {
                Err(std::io::Error::other("ocr crashed"))
            })
            .await;
        assert!(first.is_err());

        let second: Result<String, std::io::Error> = cache
            .get_or_compute(&input, OperationKind::DocumentProcessing, || async {
                Ok("text".to_string())
            })
            .await;
        assert_eq!(second.unwrap(), "text");
    }

    #[tokio::test]
    async fn test_disabled_cache_always_computes() {
        let cache = cache_with(CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        });
        let input = ContentInput::new("doc.txt", "text/plain", b"abc");
        let calls = &AtomicU32::new(0);
        for _ in 0..2 {
            let _: Result<u8, std::io::Error> = cache
                .get_or_compute(&input, OperationKind::ContentAnalysis, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = cache();
        let input = ContentInput::new("doc.txt", "text/plain", b"abc");
        let hash = cache.content_hash(&input);
        cache
            .put(&hash, OperationKind::ContentAnalysis, &1u32, CacheSource::from(&input))
            .await;
        cache.invalidate(&hash, OperationKind::ContentAnalysis).await;
        assert!(cache.get::<u32>(&hash, OperationKind::ContentAnalysis).await.is_none());
    }
}
