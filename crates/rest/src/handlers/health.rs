//! Health check endpoint handler.
//!
//! Provides a simple health check endpoint for monitoring and load balancers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sensorthings_persistence::core::SensorThingsStorage;
use tracing::debug;

use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// # HTTP Request
///
/// `GET [base]/health`
///
/// # Response
///
/// - `200 OK` - Server is healthy
pub async fn health_handler<S>(State(state): State<AppState<S>>) -> Response
where
    S: SensorThingsStorage,
{
    debug!("Processing health check request");

    let health_response = serde_json::json!({
        "status": "healthy",
        "backend": state.storage().backend_name(),
        "notifications": state.api().notifier().is_enabled(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    (StatusCode::OK, Json(health_response)).into_response()
}
