use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

/// Errors raised inside the cache subsystem.
///
/// None of these reach a client directly. `CacheCorrupt` and most I/O
/// problems are demoted to misses by the stores; `UpstreamHandlerFailure`
/// is what the cache wrapper re-raises when it has nothing stale to serve.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Upstream handler failed: {0}")]
    UpstreamHandlerFailure(String),

    #[error("No cache entry for {0}")]
    CacheMiss(String),

    #[error("Corrupt cache entry for {key}: {reason}")]
    CacheCorrupt { key: String, reason: String },

    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Response extension marking a response as a failed handler invocation.
///
/// Inserted by [`AppError`] for server-side failures. The cache wrapper and
/// the fallback barrier look for it to tell "the handler failed" apart from
/// an ordinary non-2xx answer such as a 404.
#[derive(Debug, Clone)]
pub struct HandlerFailed(pub String);

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
    details: Value,
}

#[derive(Debug)]
pub enum AppError {
    NotFound { message: String, details: Value },
    Upstream { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn upstream(message: impl Into<String>, details: Value) -> Self {
        Self::Upstream {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Returns true for errors that count as a failed handler invocation.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Internal { .. })
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound { message, .. }
            | AppError::Upstream { message, .. }
            | AppError::Internal { message, .. } => f.write_str(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let failure = self.is_handler_failure().then(|| HandlerFailed(self.to_string()));

        let (status, code, message, details) = match self {
            AppError::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details)
            }
            AppError::Upstream { message, details } => {
                (StatusCode::BAD_GATEWAY, "upstream_error", message, details)
            }
            AppError::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                details,
            ),
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(failure) = failure {
            response.extensions_mut().insert(failure);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upstream_error_is_marked() {
        let response = AppError::upstream("connection refused", json!({})).into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let marker = response.extensions().get::<HandlerFailed>().unwrap();
        assert_eq!(marker.0, "connection refused");
    }

    #[test]
    fn test_not_found_is_not_marked() {
        let response = AppError::not_found("no such bug", json!({})).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<HandlerFailed>().is_none());
    }
}
