//! Network status annotation middleware.

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

use super::NETWORK_STATUS;
use crate::state::AppState;

/// Refreshes the network state when the probe cooldown has elapsed.
///
/// The resolved [`crate::domain::entities::NetworkState`] is inserted into the
/// request extensions for downstream handlers. After the chain completes,
/// `X-Network-Status` is set from the state as it stands then, so a downgrade
/// caused by a failed handler is visible on the same response.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/health", get(health_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), network_status::layer));
/// ```
pub async fn layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let resolved = state.network.refresh_if_due().await;
    req.extensions_mut().insert(resolved);

    let mut response = next.run(req).await;

    let current = state.network.state();
    response
        .headers_mut()
        .insert(NETWORK_STATUS, HeaderValue::from_static(current.as_str()));

    response
}
