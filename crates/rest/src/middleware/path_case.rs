//! Path case normalization.
//!
//! Resource paths are case-insensitive, so every request path is lower-cased
//! before it reaches the router and routes are registered in lower case only.
//! Paths containing the reserved administrative segment keep their casing.
//! The query string is never touched.
//!
//! The middleware rewrites the URI, so it has to wrap the router rather than
//! be added with `Router::layer`, which runs after route matching.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// The path segment exempt from normalization, e.g. `dashboard`.
#[derive(Debug, Clone)]
pub struct ReservedSegment(pub Arc<str>);

impl ReservedSegment {
    /// Creates a reserved segment.
    pub fn new(segment: impl Into<Arc<str>>) -> Self {
        Self(segment.into())
    }
}

/// Returns the lower-cased path, or `None` if it must stay as is.
///
/// A path stays as is when it is already lower case or when any of its
/// segments equals `reserved`, ignoring case.
pub fn normalize_path(path: &str, reserved: &str) -> Option<String> {
    if path
        .split('/')
        .any(|segment| segment.eq_ignore_ascii_case(reserved))
    {
        return None;
    }

    let lowered = path.to_lowercase();
    (lowered != path).then_some(lowered)
}

/// Middleware that lower-cases request paths.
pub async fn normalize_path_case(
    State(reserved): State<ReservedSegment>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(path) = normalize_path(request.uri().path(), &reserved.0) {
        debug!(from = %request.uri().path(), to = %path, "Normalized request path");
        let uri = with_path(request.uri(), &path);
        *request.uri_mut() = uri;
    }

    next.run(request).await
}

/// Replaces the path of a URI, keeping its query.
fn with_path(original: &Uri, path: &str) -> Uri {
    let path_and_query = match original.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let mut parts = original.clone().into_parts();
    match path_and_query.parse() {
        Ok(parsed) => parts.path_and_query = Some(parsed),
        Err(_) => return original.clone(),
    }
    Uri::from_parts(parts).unwrap_or_else(|_| original.clone())
}
