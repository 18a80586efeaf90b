//! Cached response entity and its volatile-tier envelope.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cache_key::CacheKey;

/// Content type assumed for durable entries, which store raw bytes only.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// A response snapshot stored in one of the cache tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub key: CacheKey,
    pub body: Bytes,
    pub status: u16,
    pub content_type: String,
    pub cached_at: DateTime<Utc>,
}

impl CachedResponse {
    pub fn new(
        key: CacheKey,
        body: impl Into<Bytes>,
        status: u16,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            key,
            body: body.into(),
            status,
            content_type: content_type.into(),
            cached_at: Utc::now(),
        }
    }

    /// A `200 application/json` snapshot.
    pub fn ok_json(key: CacheKey, body: impl Into<Bytes>) -> Self {
        Self::new(key, body, 200, DEFAULT_CONTENT_TYPE)
    }

    /// Returns true for 2xx statuses, the only ones written to the cache.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns a copy with the status replaced.
    ///
    /// Stale fallbacks are always served as `200`.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Age of the snapshot relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.cached_at
    }
}

/// Structured envelope stored by the volatile tier.
///
/// The durable tier deliberately stores raw body bytes instead, so this type
/// only crosses the volatile backends.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub content: String,
    pub status_code: u16,
    pub content_type: String,
    pub cached_at: DateTime<Utc>,
}

impl ResponseEnvelope {
    /// Builds an envelope from a snapshot.
    ///
    /// Returns `None` if the body is not UTF-8; such responses are not cached.
    pub fn from_response(response: &CachedResponse) -> Option<Self> {
        let content = std::str::from_utf8(&response.body).ok()?.to_string();
        Some(Self {
            content,
            status_code: response.status,
            content_type: response.content_type.clone(),
            cached_at: response.cached_at,
        })
    }

    pub fn into_response(self, key: CacheKey) -> CachedResponse {
        CachedResponse {
            key,
            body: Bytes::from(self.content),
            status: self.status_code,
            content_type: self.content_type,
            cached_at: self.cached_at,
        }
    }
}
