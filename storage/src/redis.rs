use ai_core::MetricsStore;
use async_trait::async_trait;
use errors::StorageError;
use redis::AsyncCommands;
use std::time::Duration;

const BACKEND: &str = "Redis";

/// `MetricsStore` on a shared Redis instance.
///
/// Counters use `INCRBY`/`INCRBYFLOAT` followed by `EXPIRE` in one
/// `MULTI` pipeline so the TTL is refreshed with every write.
pub struct RedisStore {
    connection_manager: redis::aio::ConnectionManager,
}

impl RedisStore {
    pub async fn new(connection_string: &str) -> Result<Self, StorageError> {
        let client =
            redis::Client::open(connection_string).map_err(|e| StorageError::ConnectionError {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            })?;

        let connection_manager =
            client
                .get_connection_manager()
                .await
                .map_err(|e| StorageError::ConnectionError {
                    backend: BACKEND.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(Self { connection_manager })
    }
}

/// Redis TTLs are whole seconds; round up so sub-second TTLs still expire.
fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 { secs + 1 } else { secs.max(1) }
}

#[async_trait]
impl MetricsStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.connection_manager.clone();
        conn.get(key)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        let mut conn = self.connection_manager.clone();
        if let Some(ttl) = ttl {
            conn.set_ex(key, value, ttl_seconds(ttl))
                .await
                .map_err(|e| StorageError::query(BACKEND, e))
        } else {
            conn.set(key, value)
                .await
                .map_err(|e| StorageError::query(BACKEND, e))
        }
    }

    async fn increment(
        &self,
        key: &str,
        by: i64,
        ttl: Option<Duration>,
    ) -> Result<i64, StorageError> {
        let mut conn = self.connection_manager.clone();
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("INCRBY").arg(key).arg(by);
        if let Some(ttl) = ttl {
            pipe.cmd("EXPIRE").arg(key).arg(ttl_seconds(ttl)).ignore();
        }
        let (value,): (i64,) = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?;
        Ok(value)
    }

    async fn increment_float(
        &self,
        key: &str,
        by: f64,
        ttl: Option<Duration>,
    ) -> Result<f64, StorageError> {
        let mut conn = self.connection_manager.clone();
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("INCRBYFLOAT").arg(key).arg(by);
        if let Some(ttl) = ttl {
            pipe.cmd("EXPIRE").arg(key).arg(ttl_seconds(ttl)).ignore();
        }
        let (value,): (f64,) = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.connection_manager.clone();
        conn.del(key)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_seconds_rounds_up() {
        assert_eq!(ttl_seconds(Duration::from_secs(60)), 60);
        assert_eq!(ttl_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_seconds(Duration::from_millis(10)), 1);
        assert_eq!(ttl_seconds(Duration::ZERO), 1);
    }

    #[tokio::test]
    async fn test_redis_store_error_handling() {
        let result = RedisStore::new("not-a-valid-url").await;
        assert!(result.is_err());

        if let Err(StorageError::ConnectionError { backend, .. }) = result {
            assert_eq!(backend, "Redis");
        } else {
            panic!("Expected ConnectionError for invalid URL");
        }
    }

    #[test]
    fn test_metrics_store_trait_bounds() {
        fn assert_metrics_store<T: MetricsStore>() {}

        assert_metrics_store::<RedisStore>();
    }
}
