//! Delete handler.
//!
//! `DELETE [base]/v1.0/{collection}({id})`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sensorthings_persistence::core::SensorThingsStorage;
use sensorthings_persistence::types::EntityType;
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::ResourcePath;
use crate::state::AppState;

/// Handler for deleting an entity.
///
/// Dependent entities are removed by storage (a Datastream takes its
/// Observations with it).
///
/// # Response
///
/// - `204 No Content` - deleted
/// - `404 Not Found` - the entity does not exist
pub async fn delete_handler<S>(
    State(state): State<AppState<S>>,
    Path(resource): Path<String>,
) -> RestResult<Response>
where
    S: SensorThingsStorage,
{
    let path = ResourcePath::parse(&resource)?;
    let id = path.require_id()?;
    debug!(entity_type = %path.entity_type, id = %id, "Processing delete request");

    let api = state.api();
    match path.entity_type {
        EntityType::Observation => api.delete_observation(id).await?,
        entity_type => with_entity!(entity_type, E => api.delete::<E>(id).await)?,
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}
