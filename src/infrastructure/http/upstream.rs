//! Reverse-proxy gateway to the upstream API.

use super::client::build_client;
use crate::domain::gateways::{UpstreamApi, UpstreamRequest, UpstreamResponse};
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, Method, Response, header::CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, warn};

/// Body limit applied unless [`HttpUpstream::with_max_body_bytes`] sets one.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Forwards requests to a fixed upstream base URL.
///
/// Transport failures and bodies larger than the configured limit become
/// [`CacheError::UpstreamHandlerFailure`]; any HTTP answer, including 4xx
/// and 5xx, is passed back as-is.
pub struct HttpUpstream {
    client: Client,
    base_url: String,
    max_body_bytes: usize,
}

impl HttpUpstream {
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CacheResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    /// Caps how much of an upstream body is read into memory.
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl UpstreamApi for HttpUpstream {
    async fn forward(&self, request: UpstreamRequest) -> CacheResult<UpstreamResponse> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            CacheError::UpstreamHandlerFailure(format!("invalid method {}: {}", request.method, e))
        })?;
        let url = format!("{}{}", self.base_url, request.path_and_query);

        let mut builder = self.client.request(method, &url);
        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                CacheError::UpstreamHandlerFailure(format!("timed out waiting for {}", url))
            } else {
                CacheError::UpstreamHandlerFailure(format!("{}: {}", url, e))
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = read_limited(response, self.max_body_bytes, &url).await?;

        debug!("Upstream {} {} -> {}", request.method, request.path_and_query, status);
        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Reads the whole body, refusing to hold more than `limit` bytes.
async fn read_limited(mut response: Response, limit: usize, url: &str) -> CacheResult<Bytes> {
    let too_large = || {
        warn!("Upstream body from {} exceeds {} bytes", url, limit);
        CacheError::UpstreamHandlerFailure(format!(
            "{}: response body exceeds {} bytes",
            url, limit
        ))
    };

    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(too_large());
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| CacheError::UpstreamHandlerFailure(format!("{}: {}", url, e)))?
    {
        if body.len() + chunk.len() > limit {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body.freeze())
}
