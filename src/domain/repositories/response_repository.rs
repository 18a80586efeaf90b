//! Repository traits for the two response cache tiers.

use crate::domain::entities::{CacheKey, CachedResponse};
use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// TTL-bound response tier, possibly lost on restart.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process map
/// - [`crate::infrastructure::cache::RedisCache`] - Redis with native expiry
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VolatileCache: Send + Sync {
    /// Looks up a non-expired entry.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(response))` on hit
    /// - `Ok(None)` on miss or expiry
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CacheError::CacheCorrupt`] if the stored envelope
    /// cannot be decoded. Callers demote this to a miss.
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CachedResponse>>;

    /// Stores an entry, replacing any previous one for the key.
    async fn put(&self, key: &CacheKey, response: &CachedResponse, ttl: Duration)
    -> CacheResult<()>;

    /// Checks if the backend is usable.
    async fn health_check(&self) -> bool;
}

/// TTL-less response tier that survives restarts.
///
/// Entries are never removed by the cache itself, only overwritten by the next
/// successful write for the same key.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::FileCache`] - One file per key
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CachedResponse>>;

    async fn put(&self, key: &CacheKey, response: &CachedResponse) -> CacheResult<()>;

    /// Checks if the backing store accepts writes.
    async fn health_check(&self) -> bool;
}
