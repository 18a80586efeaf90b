//! In-process volatile cache.

use crate::domain::entities::{CacheKey, CachedResponse, ResponseEnvelope};
use crate::domain::repositories::VolatileCache;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default entry limit when none is configured.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// How often a write sweeps out expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

struct Entry {
    payload: String,
    expires_at: Instant,
}

/// Volatile tier backed by a concurrent in-process map.
///
/// Used when Redis is not configured. Entries hold the same serialized
/// envelope the Redis tier stores, so both backends decode identically.
///
/// # Eviction
///
/// - An expired entry read by `get` is dropped immediately
/// - Writes sweep all expired entries at most once per sweep interval, and
///   always when the map is full
/// - A write to a full map of live entries evicts the entries closest to
///   expiry (the oldest, since every entry shares the configured TTL)
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    max_entries: usize,
    next_sweep: Mutex<Instant>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Creates a cache holding at most `max_entries` responses.
    pub fn with_capacity(max_entries: usize) -> Self {
        debug!("Using in-memory volatile cache ({} entries max)", max_entries);
        let max_entries = max_entries.max(1);
        Self {
            entries: DashMap::with_capacity(max_entries.min(DEFAULT_MAX_ENTRIES)),
            max_entries,
            next_sweep: Mutex::new(Instant::now() + SWEEP_INTERVAL),
        }
    }

    /// Number of entries currently held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Swept {} expired volatile entries", removed);
            metrics::counter!("cache_evictions_total", "tier" => "memory", "reason" => "expired")
                .increment(removed as u64);
        }
        removed
    }

    fn sweep_due(&self) -> bool {
        let now = Instant::now();
        let mut next = self
            .next_sweep
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if now >= *next {
            *next = now + SWEEP_INTERVAL;
            true
        } else {
            false
        }
    }

    /// Makes room for one new entry.
    fn reserve_slot(&self, key: &str) {
        if self.sweep_due() || self.entries.len() >= self.max_entries {
            self.sweep_expired();
        }
        if self.entries.len() < self.max_entries || self.entries.contains_key(key) {
            return;
        }

        // Evict down to 90% so a full map is not rescanned on every write.
        let target = self.max_entries - self.max_entries / 10 - 1;
        let excess = self.entries.len().saturating_sub(target);
        let mut by_expiry: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().expires_at))
            .collect();
        by_expiry.sort_by_key(|(_, expires_at)| *expires_at);

        for (key, _) in by_expiry.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        debug!("Evicted {} volatile entries at capacity", excess);
        metrics::counter!("cache_evictions_total", "tier" => "memory", "reason" => "capacity")
            .increment(excess as u64);
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VolatileCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CachedResponse>> {
        let payload = {
            let Some(entry) = self.entries.get(key.as_str()) else {
                return Ok(None);
            };
            if Instant::now() >= entry.expires_at {
                None
            } else {
                Some(entry.payload.clone())
            }
        };

        let Some(payload) = payload else {
            self.entries
                .remove_if(key.as_str(), |_, entry| Instant::now() >= entry.expires_at);
            return Ok(None);
        };

        let envelope: ResponseEnvelope =
            serde_json::from_str(&payload).map_err(|e| CacheError::CacheCorrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Some(envelope.into_response(key.clone())))
    }

    async fn put(
        &self,
        key: &CacheKey,
        response: &CachedResponse,
        ttl: Duration,
    ) -> CacheResult<()> {
        let Some(envelope) = ResponseEnvelope::from_response(response) else {
            debug!("Skipping volatile write for non-UTF-8 body: {}", key);
            return Ok(());
        };

        let payload = serde_json::to_string(&envelope)?;
        self.reserve_slot(key.as_str());
        self.entries.insert(
            key.as_str().to_string(),
            Entry {
                payload,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
