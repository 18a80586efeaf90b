//! Detection of failed handler invocations.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use serde_json::json;

use crate::error::{AppError, HandlerFailed};

/// A downstream invocation that failed.
///
/// A failure is either a response tagged with [`HandlerFailed`], any `5xx`
/// response, or a panic.
pub(crate) enum HandlerFailure {
    Response { response: Response, message: String },
    Panic {
        payload: Box<dyn Any + Send>,
        message: String,
    },
}

impl HandlerFailure {
    /// Wraps an error raised while post-processing a handler's response.
    pub(crate) fn internal(message: String) -> Self {
        Self::Response {
            response: AppError::internal(message.clone(), json!({})).into_response(),
            message,
        }
    }

    pub(crate) fn message(&self) -> &str {
        match self {
            Self::Response { message, .. } | Self::Panic { message, .. } => message,
        }
    }

    /// Re-raises the original failure: the failed response is returned as-is
    /// and a panic resumes unwinding.
    pub(crate) fn reraise(self) -> Response {
        match self {
            Self::Response { response, .. } => response,
            Self::Panic { payload, .. } => std::panic::resume_unwind(payload),
        }
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Returns the failure message if `response` stands for a failed handler.
pub(crate) fn failure_message(response: &Response) -> Option<String> {
    if let Some(HandlerFailed(message)) = response.extensions().get::<HandlerFailed>() {
        return Some(message.clone());
    }
    let status = response.status();
    status
        .is_server_error()
        .then(|| format!("handler responded with {}", status))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Runs the rest of the chain and classifies the outcome.
pub(crate) async fn run_guarded(req: Request, next: Next) -> Result<Response, HandlerFailure> {
    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => match failure_message(&response) {
            Some(message) => Err(HandlerFailure::Response { response, message }),
            None => Ok(response),
        },
        Err(payload) => {
            let message = panic_message(&*payload);
            Err(HandlerFailure::Panic { payload, message })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_marked_response_uses_marker_message() {
        let response = AppError::upstream("connection refused", json!({})).into_response();
        assert_eq!(
            failure_message(&response).as_deref(),
            Some("connection refused")
        );
    }

    #[test]
    fn test_unmarked_server_error_is_failure() {
        let response = StatusCode::SERVICE_UNAVAILABLE.into_response();
        assert!(failure_message(&response).unwrap().contains("503"));
    }

    #[test]
    fn test_client_error_is_not_failure() {
        let response = StatusCode::NOT_FOUND.into_response();
        assert!(failure_message(&response).is_none());
    }

    #[test]
    fn test_panic_message_from_payloads() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&"boom".to_string()), "boom");
        assert_eq!(panic_message(&42_u8), "handler panicked");
    }
}
