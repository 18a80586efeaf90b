//! Two-tier response cache store.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::domain::entities::{CacheKey, CachedResponse};
use crate::domain::repositories::{DurableCache, VolatileCache};
use crate::error::{CacheError, CacheResult};

/// Tier a cached response was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Volatile,
    Durable,
}

impl CacheTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Volatile => "volatile",
            Self::Durable => "durable",
        }
    }
}

/// Facade over the volatile and durable tiers.
///
/// All reads are fail-open: backend errors and corrupt entries are logged and
/// reported as misses, never propagated. Writes go to both tiers and a failure
/// in one does not prevent the other.
pub struct ResponseCacheStore {
    volatile: Arc<dyn VolatileCache>,
    durable: Arc<dyn DurableCache>,
    default_ttl: Duration,
}

impl ResponseCacheStore {
    pub fn new(
        volatile: Arc<dyn VolatileCache>,
        durable: Arc<dyn DurableCache>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            volatile,
            durable,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Looks up the volatile tier, then the durable tier.
    pub async fn get(&self, key: &CacheKey) -> Option<(CachedResponse, CacheTier)> {
        if let Some(response) = self.get_volatile(key).await {
            return Some((response, CacheTier::Volatile));
        }
        self.get_durable(key)
            .await
            .map(|response| (response, CacheTier::Durable))
    }

    /// Looks up a non-expired volatile entry.
    pub async fn get_volatile(&self, key: &CacheKey) -> Option<CachedResponse> {
        let hit = demote_to_miss(key, CacheTier::Volatile, self.volatile.get(key).await);
        record_lookup(CacheTier::Volatile, hit.is_some());
        hit
    }

    /// Looks up the durable entry. Durable entries never expire.
    pub async fn get_durable(&self, key: &CacheKey) -> Option<CachedResponse> {
        let hit = demote_to_miss(key, CacheTier::Durable, self.durable.get(key).await);
        record_lookup(CacheTier::Durable, hit.is_some());
        hit
    }

    /// Looks up the durable tier, reporting a miss as [`CacheError::CacheMiss`].
    pub async fn require_durable(&self, key: &CacheKey) -> CacheResult<CachedResponse> {
        self.get_durable(key)
            .await
            .ok_or_else(|| CacheError::CacheMiss(key.to_string()))
    }

    /// Writes a response to both tiers using the default TTL.
    pub async fn put(&self, key: &CacheKey, response: &CachedResponse) {
        self.put_with_ttl(key, response, self.default_ttl).await;
    }

    /// Writes a response to both tiers, overwriting any previous entries.
    pub async fn put_with_ttl(&self, key: &CacheKey, response: &CachedResponse, ttl: Duration) {
        self.put_volatile(key, response, ttl).await;
        self.put_durable(key, response).await;
    }

    pub async fn put_volatile(&self, key: &CacheKey, response: &CachedResponse, ttl: Duration) {
        if let Err(e) = self.volatile.put(key, response, ttl).await {
            error!("Volatile cache write failed for {}: {}", key, e);
        }
    }

    pub async fn put_durable(&self, key: &CacheKey, response: &CachedResponse) {
        if let Err(e) = self.durable.put(key, response).await {
            error!("Durable cache write failed for {}: {}", key, e);
        }
    }

    /// Returns `(volatile_ok, durable_ok)`.
    pub async fn health_check(&self) -> (bool, bool) {
        (
            self.volatile.health_check().await,
            self.durable.health_check().await,
        )
    }
}

fn demote_to_miss(
    key: &CacheKey,
    tier: CacheTier,
    result: CacheResult<Option<CachedResponse>>,
) -> Option<CachedResponse> {
    match result {
        Ok(hit) => hit,
        Err(CacheError::CacheCorrupt { reason, .. }) => {
            warn!("Corrupt {} entry for {} treated as miss: {}", tier.as_str(), key, reason);
            None
        }
        Err(e) => {
            error!("{} cache read failed for {}: {}", tier.as_str(), key, e);
            None
        }
    }
}

fn record_lookup(tier: CacheTier, hit: bool) {
    if hit {
        debug!("Cache HIT ({})", tier.as_str());
        metrics::counter!("cache_hits_total", "tier" => tier.as_str()).increment(1);
    } else {
        metrics::counter!("cache_misses_total", "tier" => tier.as_str()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockDurableCache, MockVolatileCache};

    fn key() -> CacheKey {
        CacheKey::from_raw("api_cache:GET/api/bugs")
    }

    fn store(volatile: MockVolatileCache, durable: MockDurableCache) -> ResponseCacheStore {
        ResponseCacheStore::new(
            Arc::new(volatile),
            Arc::new(durable),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_get_prefers_volatile() {
        let mut volatile = MockVolatileCache::new();
        let mut durable = MockDurableCache::new();

        volatile
            .expect_get()
            .times(1)
            .returning(|k| Ok(Some(CachedResponse::ok_json(k.clone(), "volatile"))));
        durable.expect_get().times(0);

        let (response, tier) = store(volatile, durable).get(&key()).await.unwrap();
        assert_eq!(tier, CacheTier::Volatile);
        assert_eq!(response.body, "volatile");
    }

    #[tokio::test]
    async fn test_get_falls_back_to_durable() {
        let mut volatile = MockVolatileCache::new();
        let mut durable = MockDurableCache::new();

        volatile.expect_get().times(1).returning(|_| Ok(None));
        durable
            .expect_get()
            .times(1)
            .returning(|k| Ok(Some(CachedResponse::ok_json(k.clone(), "durable"))));

        let (response, tier) = store(volatile, durable).get(&key()).await.unwrap();
        assert_eq!(tier, CacheTier::Durable);
        assert_eq!(response.body, "durable");
    }

    #[tokio::test]
    async fn test_corrupt_volatile_entry_is_a_miss() {
        let mut volatile = MockVolatileCache::new();
        let mut durable = MockDurableCache::new();

        volatile.expect_get().times(1).returning(|k| {
            Err(CacheError::CacheCorrupt {
                key: k.to_string(),
                reason: "expected value at line 1".into(),
            })
        });
        durable
            .expect_get()
            .times(1)
            .returning(|k| Ok(Some(CachedResponse::ok_json(k.clone(), "durable"))));

        let (_, tier) = store(volatile, durable).get(&key()).await.unwrap();
        assert_eq!(tier, CacheTier::Durable);
    }

    #[tokio::test]
    async fn test_backend_errors_are_misses() {
        let mut volatile = MockVolatileCache::new();
        let mut durable = MockDurableCache::new();

        volatile
            .expect_get()
            .returning(|_| Err(CacheError::Connection("refused".into())));
        durable
            .expect_get()
            .returning(|_| Err(CacheError::Io(std::io::Error::other("disk gone"))));

        let store = store(volatile, durable);
        assert!(store.get(&key()).await.is_none());
        assert!(matches!(
            store.require_durable(&key()).await,
            Err(CacheError::CacheMiss(_))
        ));
    }

    #[tokio::test]
    async fn test_put_writes_both_tiers_even_if_one_fails() {
        let mut volatile = MockVolatileCache::new();
        let mut durable = MockDurableCache::new();

        volatile
            .expect_put()
            .withf(|_, _, ttl| *ttl == Duration::from_secs(60))
            .times(1)
            .returning(|_, _, _| Err(CacheError::Connection("refused".into())));
        durable.expect_put().times(1).returning(|_, _| Ok(()));

        let response = CachedResponse::ok_json(key(), r#"{"a":1}"#);
        store(volatile, durable).put(&key(), &response).await;
    }
}
