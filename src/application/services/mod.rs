//! Services of the cache subsystem.

pub mod cache_aside;
pub mod image_cache;
pub mod network_monitor;
pub mod payload_rewriter;
pub mod response_cache;

pub use cache_aside::{CacheAsideService, CacheReason, CacheableResponse, Served};
pub use image_cache::ImageCacheService;
pub use network_monitor::NetworkMonitor;
pub use payload_rewriter::ImagePayloadRewriter;
pub use response_cache::{CacheTier, ResponseCacheStore};
