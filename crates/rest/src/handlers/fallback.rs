//! Fallback for unrouted requests.

use axum::http::Uri;

use crate::error::RestError;

/// Answers any unrouted request with a JSON `404 Not Found`.
pub async fn not_found_handler(uri: Uri) -> RestError {
    RestError::NotFound {
        message: format!("No resource at {}", uri.path()),
    }
}
