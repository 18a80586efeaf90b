//! Image URL rewriting for JSON responses.

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{LimitedBody, buffer_within};
use crate::error::AppError;
use crate::state::AppState;

/// Replaces remote image URLs in successful JSON responses with local copies.
///
/// Runs closest to the handler, so the cache stores the rewritten payload.
/// Passing `force_cache=true` (or `1`) in the query string restricts the
/// rewrite to images already on disk: no image is fetched.
///
/// Responses that are not `2xx`, not JSON, or larger than the buffering limit
/// are returned untouched.
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let force_cache = force_cache_requested(req.uri().query());
    let response = next.run(req).await;

    let limit = state.settings.max_body_bytes;
    if !response.status().is_success()
        || !is_json(&response)
        || response.body().size_hint().lower() > limit as u64
    {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match buffer_within(body, limit).await {
        Ok(LimitedBody::Complete(bytes)) => bytes,
        Ok(LimitedBody::Overflow(body)) => {
            debug!("Response body exceeds {} bytes, skipping image rewrite", limit);
            return Response::from_parts(parts, body);
        }
        Err(e) => {
            warn!("Failed to buffer response for image rewrite: {}", e);
            return AppError::internal("Failed to read response body", json!({})).into_response();
        }
    };

    let mut payload: Value = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(e) => {
            debug!("Skipping image rewrite for undecodable JSON: {}", e);
            return Response::from_parts(parts, Body::from(bytes));
        }
    };

    let replaced = state.rewriter.rewrite(&mut payload, force_cache).await;
    if replaced == 0 {
        return Response::from_parts(parts, Body::from(bytes));
    }

    match serde_json::to_vec(&payload) {
        Ok(rewritten) => {
            debug!("Rewrote {} image URL(s)", replaced);
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(rewritten))
        }
        Err(e) => {
            warn!("Failed to re-encode rewritten payload: {}", e);
            Response::from_parts(parts, Body::from(bytes))
        }
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            let mime = v.split(';').next().unwrap_or_default().trim();
            mime == "application/json" || mime.ends_with("+json")
        })
}

fn force_cache_requested(query: Option<&str>) -> bool {
    query.is_some_and(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .any(|(k, v)| k == "force_cache" && (v == "1" || v.eq_ignore_ascii_case("true")))
    })
}
