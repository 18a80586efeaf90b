//! Core domain entities of the response cache.
//!
//! Entities are plain data structures: cache keys and the request identity
//! they derive from, response and image snapshots, and the network state flag.
//!
//! # Entity Types
//!
//! - [`RequestIdentity`] / [`CacheKey`] - What a cached response is addressed by
//! - [`CachedResponse`] - A response snapshot held by the volatile and durable tiers
//! - [`CachedImage`] - A remote image persisted locally
//! - [`NetworkState`] - Online/offline flag driving cache-first behaviour

pub mod cache_key;
pub mod cached_image;
pub mod cached_response;
pub mod network_state;

pub use cache_key::{CacheKey, RequestIdentity};
pub use cached_image::CachedImage;
pub use cached_response::{CachedResponse, DEFAULT_CONTENT_TYPE, ResponseEnvelope};
pub use network_state::NetworkState;
