//! Application layer services implementing the cache policy.
//!
//! Services consume the domain traits and are composed into the request
//! pipeline by the API layer.
//!
//! # Available Services
//!
//! - [`services::NetworkMonitor`] - Shared online/offline state with cooldown probing
//! - [`services::ResponseCacheStore`] - Volatile + durable response tiers
//! - [`services::CacheAsideService`] - Cache-first, cache-aside and stale-on-error policy
//! - [`services::ImageCacheService`] - Local copies of remote images
//! - [`services::ImagePayloadRewriter`] - Image URL rewriting in response payloads

pub mod services;
