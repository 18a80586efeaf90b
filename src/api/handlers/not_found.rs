//! Fallback for unmatched routes.

use axum::http::Uri;
use serde_json::json;

use crate::error::AppError;

/// Answers any request no route matched.
///
/// Returns `404 Not Found` with the standard error body. A 404 is an ordinary
/// answer, not a failed handler: it is neither cached nor caught by the
/// fallback barrier.
pub async fn not_found_handler(uri: Uri) -> AppError {
    AppError::not_found(
        format!("No route for {}", uri.path()),
        json!({ "path": uri.path() }),
    )
}
