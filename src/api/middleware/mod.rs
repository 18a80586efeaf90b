//! HTTP middleware forming the resilient request pipeline.
//!
//! Outermost first:
//!
//! 1. [`tracing`] - Request spans and latency logging
//! 2. [`network_status`] - Re-probes when due and sets `X-Network-Status`
//! 3. [`fallback_barrier`] - Durable-cache fallback or `503` for failed requests
//! 4. [`response_cache`] - Cache-aside wrapper around read handlers
//! 5. [`image_rewrite`] - Swaps remote image URLs in JSON bodies for local copies

use axum::{
    body::{Body, Bytes},
    http::{HeaderName, HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::Response,
};
use bytes::BytesMut;
use futures::{StreamExt, stream};

use crate::application::services::CacheReason;
use crate::domain::entities::CachedResponse;

pub mod fallback_barrier;
pub mod image_rewrite;
pub mod network_status;
pub mod response_cache;
pub mod tracing;

mod failure;

pub const SERVED_FROM_CACHE: HeaderName = HeaderName::from_static("x-served-from-cache");
pub const CACHE_REASON: HeaderName = HeaderName::from_static("x-cache-reason");
pub const NETWORK_STATUS: HeaderName = HeaderName::from_static("x-network-status");

/// Renders a cache hit as an HTTP response tagged with the cache headers.
pub(crate) fn cached_response(cached: CachedResponse, reason: CacheReason) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    let content_type = HeaderValue::from_str(&cached.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/json"));

    let mut response = Response::new(Body::from(cached.body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(SERVED_FROM_CACHE, HeaderValue::from_static("true"));
    headers.insert(CACHE_REASON, HeaderValue::from_static(reason.as_str()));

    response
}

/// Outcome of reading a response body under a size limit.
pub(crate) enum LimitedBody {
    /// The whole body fit within the limit.
    Complete(Bytes),
    /// The body outgrew the limit; this replays what was read, then the rest.
    Overflow(Body),
}

/// Buffers `body` while it stays within `limit` bytes.
///
/// A body that turns out larger is handed back intact as a stream, so the
/// caller can pass it on unbuffered.
///
/// # Errors
///
/// Returns the body's own error if reading a frame fails.
pub(crate) async fn buffer_within(body: Body, limit: usize) -> Result<LimitedBody, axum::Error> {
    let mut frames = body.into_data_stream();
    let mut buffered = BytesMut::new();

    while let Some(chunk) = frames.next().await {
        let chunk = chunk?;
        if buffered.len() + chunk.len() > limit {
            let head = stream::iter([Ok::<_, axum::Error>(buffered.freeze()), Ok(chunk)]);
            return Ok(LimitedBody::Overflow(Body::from_stream(head.chain(frames))));
        }
        buffered.extend_from_slice(&chunk);
    }

    Ok(LimitedBody::Complete(buffered.freeze()))
}
