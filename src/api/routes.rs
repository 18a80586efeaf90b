//! API route configuration.

use crate::api::handlers::proxy_handler;
use crate::state::AppState;
use axum::{Router, routing::any};

/// Routes proxied to the upstream API.
///
/// # Endpoints
///
/// - `ANY /api/{*path}` - Forwarded to `UPSTREAM_URL` with path and query intact
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/api/{*path}", any(proxy_handler))
}
