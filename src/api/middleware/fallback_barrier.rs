//! Last-resort fallback for failed API requests.

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header::ACCEPT},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use super::cached_response;
use super::failure::run_guarded;
use crate::api::dto::fallback::FallbackErrorBody;
use crate::application::services::CacheReason;
use crate::domain::entities::RequestIdentity;
use crate::state::AppState;

/// Catches failures escaping the handler chain on eligible requests.
///
/// A request is eligible when its path starts with one of the configured
/// fallback prefixes, its `Accept` header asks for `application/json`, or it
/// carries `format=json` in the query string.
///
/// # Behavior
///
/// - Eligible and failed: the durable tier is consulted (the volatile tier is
///   skipped). A hit is returned as `200` with `X-Served-From-Cache: true` and
///   `X-Cache-Reason: network_error`; a miss yields `503` with
///   `{"error": "Network Error", "message": ..., "status": 503}`
/// - Not eligible: the request runs unguarded and any failure propagates
///   unchanged
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !is_eligible(&req, &state.settings.fallback_prefixes) {
        return next.run(req).await;
    }

    let identity = RequestIdentity::new(
        req.method().as_str(),
        req.uri().path(),
        req.uri().query().map(str::to_string),
    );

    let failure = match run_guarded(req, next).await {
        Ok(response) => return response,
        Err(failure) => failure,
    };

    let key = identity.cache_key();
    match state.cache.require_durable(&key).await {
        Ok(cached) => {
            info!("Request {} failed ({}), serving durable copy", key, failure);
            metrics::counter!(
                "cache_fallbacks_total",
                "source" => "barrier",
                "reason" => CacheReason::NetworkError.as_str()
            )
            .increment(1);
            cached_response(cached.with_status(200), CacheReason::NetworkError)
        }
        Err(e) => {
            warn!("Request {} failed ({}): {}", key, failure, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(FallbackErrorBody::network_error(failure.message())),
            )
                .into_response()
        }
    }
}

fn is_eligible(req: &Request, prefixes: &[String]) -> bool {
    let path = req.uri().path();
    if prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())) {
        return true;
    }

    let accepts_json = req
        .headers()
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    accepts_json || requests_json_format(req.uri().query())
}

fn requests_json_format(query: Option<&str>) -> bool {
    query.is_some_and(|q| {
        url::form_urlencoded::parse(q.as_bytes()).any(|(k, v)| k == "format" && v == "json")
    })
}
