//! Redis-backed volatile cache.

use crate::domain::entities::{CacheKey, CachedResponse, ResponseEnvelope};
use crate::domain::repositories::VolatileCache;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info};

/// Redis volatile tier.
///
/// Entries are stored as JSON envelopes under the cache key itself (which
/// already carries the `api_cache:` namespace) with a native `EX` expiry, so
/// Redis handles TTL and eviction. Uses connection pooling via
/// `ConnectionManager` for efficient connection reuse.
pub struct RedisCache {
    client: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the connection
    /// cannot be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {}", e)))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self { client: manager })
    }
}

#[async_trait]
impl VolatileCache for RedisCache {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CachedResponse>> {
        let mut conn = self.client.clone();

        let payload = conn
            .get::<_, Option<String>>(key.as_str())
            .await
            .map_err(|e| CacheError::Connection(format!("Redis GET failed: {}", e)))?;

        let Some(payload) = payload else {
            debug!("Redis MISS: {}", key);
            return Ok(None);
        };

        let envelope: ResponseEnvelope =
            serde_json::from_str(&payload).map_err(|e| CacheError::CacheCorrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Redis HIT: {}", key);
        Ok(Some(envelope.into_response(key.clone())))
    }

    async fn put(
        &self,
        key: &CacheKey,
        response: &CachedResponse,
        ttl: Duration,
    ) -> CacheResult<()> {
        let Some(envelope) = ResponseEnvelope::from_response(response) else {
            debug!("Skipping Redis write for non-UTF-8 body: {}", key);
            return Ok(());
        };

        let payload = serde_json::to_string(&envelope)?;
        let ttl_seconds = ttl.as_secs().max(1);
        let mut conn = self.client.clone();

        conn.set_ex::<_, _, ()>(key.as_str(), payload, ttl_seconds)
            .await
            .map_err(|e| CacheError::Connection(format!("Redis SET failed: {}", e)))?;

        debug!("Redis SET: {} (TTL: {}s)", key, ttl_seconds);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
