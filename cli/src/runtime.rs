//! Store selection for commands that read recorded metrics.

use crate::output;
use ai_core::MetricsStore;
use config::Config;
use observability::TracingSink;
use resilience::ResilienceLayer;
use std::sync::Arc;
use std::time::Duration;
use storage::{InMemoryStore, RedisStore};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Connect to the configured Redis. An unreachable server degrades to an
/// empty in-memory store so every report still renders.
pub async fn connect(config: &Config) -> Arc<dyn MetricsStore> {
    let url = config.redis.connection_url();
    match tokio::time::timeout(CONNECT_TIMEOUT, RedisStore::new(&url)).await {
        Ok(Ok(store)) => {
            tracing::debug!(host = %config.redis.host, port = config.redis.port, "Connected to Redis");
            Arc::new(store)
        }
        Ok(Err(e)) => {
            output::warn(&format!("{e}; reporting from an empty in-memory store"));
            Arc::new(InMemoryStore::new())
        }
        Err(_) => {
            output::warn(&format!(
                "Redis at {}:{} did not answer within {}s; reporting from an empty in-memory store",
                config.redis.host,
                config.redis.port,
                CONNECT_TIMEOUT.as_secs()
            ));
            Arc::new(InMemoryStore::new())
        }
    }
}

pub async fn layer(config: &Config) -> ResilienceLayer {
    ResilienceLayer::new(connect(config).await, config, Arc::new(TracingSink))
}
