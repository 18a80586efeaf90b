//! Cache-aside middleware for read handlers.

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{Request, State},
    http::{header::CONTENT_TYPE, response::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{LimitedBody, buffer_within, cached_response};
use super::failure::{HandlerFailure, run_guarded};
use crate::application::services::{CacheableResponse, Served};
use crate::domain::entities::{CacheKey, CachedResponse, DEFAULT_CONTENT_TYPE, RequestIdentity};
use crate::state::AppState;

/// Wraps the downstream handler with [`crate::application::services::CacheAsideService`].
///
/// # Behavior
///
/// - Non-`GET` requests pass straight through
/// - Cache hits are answered without running the handler and carry
///   `X-Served-From-Cache: true` plus an `X-Cache-Reason` of `fresh`,
///   `offline` or `network_error`
/// - `2xx` handler responses are buffered, written to both tiers and
///   returned unchanged
/// - Failed handlers (tagged error responses, `5xx`, panics) fall back to a
///   stale entry with status `200`; without one, the original failure is
///   re-raised for the fallback barrier
///
/// Bodies larger than the configured limit are streamed through uncached.
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let identity = RequestIdentity::new(
        req.method().as_str(),
        req.uri().path(),
        req.uri().query().map(str::to_string),
    );

    if !identity.is_cacheable() {
        return next.run(req).await;
    }

    let limit = state.settings.max_body_bytes;
    let outcome = state
        .cache_aside
        .execute(&identity, || invoke(req, next, limit))
        .await;

    match outcome {
        Ok(Served::Live(output)) => output.into_response(),
        Ok(Served::Cached { response, reason }) => cached_response(response, reason),
        Err(failure) => failure.reraise(),
    }
}

/// Handler output as seen by the cache.
enum HandlerOutput {
    Buffered { parts: Parts, body: Bytes },
    Streaming(Response),
}

impl CacheableResponse for HandlerOutput {
    fn to_cached(&self, key: &CacheKey) -> Option<CachedResponse> {
        match self {
            Self::Buffered { parts, body } if parts.status.is_success() => {
                let content_type = parts
                    .headers
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or(DEFAULT_CONTENT_TYPE);
                Some(CachedResponse::new(
                    key.clone(),
                    body.clone(),
                    parts.status.as_u16(),
                    content_type,
                ))
            }
            _ => None,
        }
    }
}

impl IntoResponse for HandlerOutput {
    fn into_response(self) -> Response {
        match self {
            Self::Buffered { parts, body } => Response::from_parts(parts, Body::from(body)),
            Self::Streaming(response) => response,
        }
    }
}

async fn invoke(req: Request, next: Next, limit: usize) -> Result<HandlerOutput, HandlerFailure> {
    let response = run_guarded(req, next).await?;

    if response.body().size_hint().lower() > limit as u64 {
        debug!("Response body exceeds {} bytes, not caching", limit);
        return Ok(HandlerOutput::Streaming(response));
    }

    let (parts, body) = response.into_parts();
    match buffer_within(body, limit).await {
        Ok(LimitedBody::Complete(body)) => Ok(HandlerOutput::Buffered { parts, body }),
        Ok(LimitedBody::Overflow(body)) => {
            debug!("Streamed response body exceeds {} bytes, not caching", limit);
            Ok(HandlerOutput::Streaming(Response::from_parts(parts, body)))
        }
        Err(e) => Err(HandlerFailure::internal(format!(
            "failed to read response body: {}",
            e
        ))),
    }
}
