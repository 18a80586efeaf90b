//! Shared application state injected into handlers and middleware.

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::{
    CacheAsideService, ImageCacheService, ImagePayloadRewriter, NetworkMonitor, ResponseCacheStore,
};
use crate::config::Config;
use crate::domain::gateways::UpstreamApi;

/// Request pipeline knobs that are not owned by any single service.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Route prefixes whose failures are answered by the fallback barrier.
    pub fallback_prefixes: Vec<String>,
    /// Largest response body the cache wrapper and the rewriter will buffer.
    pub max_body_bytes: usize,
    pub image_dir: PathBuf,
    pub image_public_path: String,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            fallback_prefixes: config.fallback_prefixes.clone(),
            max_body_bytes: config.max_body_bytes,
            image_dir: config.image_cache_dir.clone(),
            image_public_path: config.image_public_path.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub network: Arc<NetworkMonitor>,
    pub cache: Arc<ResponseCacheStore>,
    pub cache_aside: Arc<CacheAsideService>,
    pub rewriter: Arc<ImagePayloadRewriter>,
    pub upstream: Arc<dyn UpstreamApi>,
    pub settings: Arc<PipelineSettings>,
}

impl AppState {
    /// Wires the cache-aside service and the payload rewriter on top of the
    /// given monitor, stores and upstream.
    pub fn new(
        network: Arc<NetworkMonitor>,
        cache: Arc<ResponseCacheStore>,
        images: Arc<ImageCacheService>,
        upstream: Arc<dyn UpstreamApi>,
        settings: PipelineSettings,
    ) -> Self {
        let cache_aside = Arc::new(CacheAsideService::new(cache.clone(), network.clone()));
        let rewriter = Arc::new(ImagePayloadRewriter::new(images));

        Self {
            network,
            cache,
            cache_aside,
            rewriter,
            upstream,
            settings: Arc::new(settings),
        }
    }
}
