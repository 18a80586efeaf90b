//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`              - Health check: network state, cache tiers
//! - `ANY  /api/{*path}`         - Upstream API proxy (cached reads)
//! - `GET  <IMAGE_PUBLIC_PATH>/*` - Locally cached images
//! - anything else               - `404` JSON error body
//!
//! # Middleware
//!
//! Outermost first:
//!
//! - **Tracing** - Structured request/response logging
//! - **Network status** - Probe refresh and `X-Network-Status` header
//! - **Fallback barrier** - Durable fallback or `503` for eligible requests
//! - **Response cache** - Cache-aside wrapper (API routes only)
//! - **Image rewrite** - Local image URLs in JSON bodies (API routes only)

use crate::api;
use crate::api::handlers::{health_handler, not_found_handler};
use crate::api::middleware::{
    fallback_barrier, image_rewrite, network_status, response_cache, tracing,
};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower_http::services::ServeDir;

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> Router {
    let api_router = api::routes::api_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            image_rewrite::layer,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            response_cache::layer,
        ));

    let images = ServeDir::new(&state.settings.image_dir);

    Router::new()
        .route("/health", get(health_handler))
        .merge(api_router)
        .nest_service(&state.settings.image_public_path, images)
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            fallback_barrier::layer,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            network_status::layer,
        ))
        .with_state(state)
        .layer(tracing::layer())
}
