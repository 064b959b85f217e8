//! Patch handler.
//!
//! `PATCH [base]/v1.0/{collection}({id})`

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use sensorthings_persistence::core::SensorThingsStorage;
use sensorthings_persistence::types::{EntityType, Observation};
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::{EntityBody, ResourcePath};
use crate::responses::to_json;
use crate::state::AppState;

/// Handler for a partial update.
///
/// The body is merged into the stored entity. Bodies carrying related
/// entities (`Thing`, `Datastream`, `Locations`, ...) are rejected.
///
/// # Response
///
/// - `200 OK` - the updated entity
/// - `400 Bad Request` - the body carries related entities
/// - `404 Not Found` - the entity does not exist
pub async fn patch_handler<S>(
    State(state): State<AppState<S>>,
    Path(resource): Path<String>,
    body: EntityBody,
) -> RestResult<Response>
where
    S: SensorThingsStorage,
{
    let path = ResourcePath::parse(&resource)?;
    let id = path.require_id()?;
    debug!(entity_type = %path.entity_type, id = %id, "Processing patch request");

    let api = state.api();
    let patched = match path.entity_type {
        EntityType::Observation => {
            let patch: Observation = body.into_entity()?;
            to_json(&api.patch_observation(id, patch).await?)?
        }
        entity_type => with_entity!(entity_type, E => {
            let patch: E = body.into_entity()?;
            to_json(&api.patch::<E>(id, patch).await?)?
        }),
    };

    Ok(Json(patched).into_response())
}
