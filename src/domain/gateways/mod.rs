//! Outbound network gateways.
//!
//! Every call the cache subsystem makes to the outside world goes through one
//! of these traits, so reachability logic can be tested without a network.
//!
//! - [`ConnectivityProbe`] - Reachability check behind the network monitor
//! - [`ImageFetcher`] - Downloads remote images for the image store
//! - [`UpstreamApi`] - The upstream API whose read responses are cached

use crate::error::CacheResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Short-timeout reachability check against a fixed endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// # Errors
    ///
    /// Returns [`crate::error::CacheError::NetworkUnavailable`] if the endpoint
    /// cannot be reached within the probe timeout.
    async fn check(&self) -> CacheResult<()>;
}

/// Downloads image payloads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// # Errors
    ///
    /// Returns [`crate::error::CacheError::NetworkUnavailable`] on timeouts,
    /// transport errors and non-success statuses.
    async fn fetch(&self, url: &str) -> CacheResult<Bytes>;
}

/// Raw answer from the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Request forwarded to the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: String,
    pub path_and_query: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// The upstream API fronted by the cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// # Errors
    ///
    /// Returns [`crate::error::CacheError::UpstreamHandlerFailure`] if the
    /// upstream could not be reached. Non-2xx answers are not errors.
    async fn forward(&self, request: UpstreamRequest) -> CacheResult<UpstreamResponse>;
}
