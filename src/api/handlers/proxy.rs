//! Handler forwarding API calls to the upstream service.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header::CONTENT_TYPE},
    response::Response,
};
use serde_json::json;

use crate::domain::gateways::UpstreamRequest;
use crate::error::AppError;
use crate::state::AppState;

/// Forwards the request to the upstream API and relays its answer.
///
/// # Endpoint
///
/// `ANY /api/{*path}`
///
/// Path, query string, method, `Content-Type` and body are forwarded as-is.
/// The upstream status and `Content-Type` are relayed; other upstream headers
/// are dropped.
///
/// # Errors
///
/// Returns `502 Bad Gateway` (a handler failure) if the upstream cannot be
/// reached or times out.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let request = UpstreamRequest {
        method: method.as_str().to_string(),
        path_and_query: path_and_query.clone(),
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    };

    let upstream = state
        .upstream
        .forward(request)
        .await
        .map_err(|e| AppError::upstream(e.to_string(), json!({ "path": path_and_query })))?;

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() =
        StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);

    if let Some(content_type) = upstream
        .content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
    {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }

    Ok(response)
}
