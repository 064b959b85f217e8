//! Service root handler.
//!
//! `GET [base]/v1.0`

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use sensorthings_persistence::core::SensorThingsStorage;
use sensorthings_persistence::types::EntityType;
use serde_json::json;
use tracing::debug;

use crate::state::AppState;

/// Handler for the service root.
///
/// Lists every collection with its absolute address:
///
/// ```json
/// {"value": [{"name": "Things", "url": "http://localhost:8080/v1.0/Things"}, ...]}
/// ```
pub async fn service_root_handler<S>(State(state): State<AppState<S>>) -> Response
where
    S: SensorThingsStorage,
{
    debug!("Processing service root request");

    let value: Vec<_> = EntityType::ALL
        .iter()
        .map(|entity_type| {
            json!({
                "name": entity_type.collection_name(),
                "url": format!("{}/v1.0/{}", state.base_url(), entity_type.collection_name()),
            })
        })
        .collect();

    Json(json!({ "value": value })).into_response()
}
