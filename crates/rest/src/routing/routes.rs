//! SensorThings route configuration.
//!
//! Routes are registered in lower case. Paths reach the router already
//! lower-cased by [`crate::middleware::path_case`], so `/v1.0/Things(1)`
//! matches `/v1.0/{resource}`.

use axum::{
    Router,
    routing::get,
};
use sensorthings_persistence::core::SensorThingsStorage;

use crate::handlers;
use crate::state::AppState;

/// API version prefix.
pub const API_PREFIX: &str = "/v1.0";

/// Creates all SensorThings API routes.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `GET /v1.0` - Service root
/// - `GET /v1.0/{resource}` - Collection, or entity when `{resource}` is `Things(1)`
/// - `POST /v1.0/{resource}` - Create
/// - `PATCH /v1.0/{resource}` - Patch
/// - `DELETE /v1.0/{resource}` - Delete
/// - `GET /v1.0/{resource}/{navigation}` - Related collection or entity
/// - `POST /v1.0/{resource}/{navigation}` - Create under a parent
pub fn create_routes<S>(state: AppState<S>) -> Router
where
    S: SensorThingsStorage,
{
    Router::new()
        .route("/health", get(handlers::health_handler::<S>))
        .route(API_PREFIX, get(handlers::service_root_handler::<S>))
        .route(
            "/v1.0/{resource}",
            get(handlers::read_handler::<S>)
                .post(handlers::create_handler::<S>)
                .patch(handlers::patch_handler::<S>)
                .delete(handlers::delete_handler::<S>),
        )
        .route(
            "/v1.0/{resource}/{navigation}",
            get(handlers::navigation_handler::<S>).post(handlers::create_related_handler::<S>),
        )
        .fallback(handlers::not_found_handler)
        .with_state(state)
}
