//! DTO for the fallback barrier's error payload.

use serde::{Deserialize, Serialize};

/// Body returned with `503` when a failed request has no durable copy.
///
/// ```json
/// {"error": "Network Error", "message": "connection refused", "status": 503}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackErrorBody {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl FallbackErrorBody {
    pub fn network_error(message: impl Into<String>) -> Self {
        Self {
            error: "Network Error".to_string(),
            message: message.into(),
            status: 503,
        }
    }
}
