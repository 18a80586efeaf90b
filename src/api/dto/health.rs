//! DTOs for health check endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::entities::NetworkState;

/// Health check response with component status.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub network: NetworkStatus,
    pub checks: HealthChecks,
}

/// Reachability as currently believed by the network monitor.
#[derive(Debug, Serialize)]
pub struct NetworkStatus {
    pub state: NetworkState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_probe_seconds_ago: Option<u64>,

    pub probe_cooldown_seconds: u64,
}

/// Health status for each cache tier.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub volatile_cache: CheckStatus,
    pub durable_cache: CheckStatus,
}

/// Individual component health status.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckStatus {
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
