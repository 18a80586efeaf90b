//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse, NetworkStatus};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: Both cache tiers usable
/// - **503 Service Unavailable**: One or more cache tiers degraded
///
/// Being offline does not make the service unhealthy: serving from the cache
/// while offline is the service working as intended.
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "network": {
///     "state": "offline",
///     "last_probe_seconds_ago": 12,
///     "probe_cooldown_seconds": 60
///   },
///   "checks": {
///     "volatile_cache": { "status": "ok", "message": "Volatile tier reachable" },
///     "durable_cache": { "status": "ok", "message": "Durable tier writable" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (volatile_ok, durable_ok) = state.cache.health_check().await;

    let volatile_cache = if volatile_ok {
        CheckStatus::ok("Volatile tier reachable")
    } else {
        CheckStatus::error("Volatile tier unreachable")
    };

    let durable_cache = if durable_ok {
        CheckStatus::ok("Durable tier writable")
    } else {
        CheckStatus::error("Durable tier directory cannot be created")
    };

    let all_healthy = volatile_cache.is_ok() && durable_cache.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        network: NetworkStatus {
            state: state.network.state(),
            last_probe_seconds_ago: state.network.last_probe_age().map(|age| age.as_secs()),
            probe_cooldown_seconds: state.network.cooldown().as_secs(),
        },
        checks: HealthChecks {
            volatile_cache,
            durable_cache,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
