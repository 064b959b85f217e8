//! Create handlers.
//!
//! `POST [base]/v1.0/{collection}` and `POST [base]/v1.0/Datastreams({id})/Observations`

use axum::{
    extract::{Path, State},
    response::Response,
};
use sensorthings_persistence::core::SensorThingsStorage;
use sensorthings_persistence::types::{EntityType, Observation};
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::{EntityBody, Navigation, ResourcePath};
use crate::responses::{created_response, to_json};
use crate::state::AppState;

/// Handler for creating an entity in a collection.
///
/// Observations go through the ingestion path, which derives or creates the
/// FeatureOfInterest and queues notifications.
///
/// # HTTP Request
///
/// `POST [base]/v1.0/Observations`
///
/// ```json
/// {"result": 21.5, "Datastream": {"@iot.id": 7}}
/// ```
///
/// # Response
///
/// - `201 Created` - the entity, with a `Location` header
/// - `400 Bad Request` - missing mandatory fields or a missing parent
/// - `409 Conflict` - a nested entity could not be created
pub async fn create_handler<S>(
    State(state): State<AppState<S>>,
    Path(resource): Path<String>,
    body: EntityBody,
) -> RestResult<Response>
where
    S: SensorThingsStorage,
{
    let path = ResourcePath::parse(&resource)?;
    path.require_collection()?;
    debug!(entity_type = %path.entity_type, "Processing create request");

    let api = state.api();
    let created = match path.entity_type {
        EntityType::Observation => {
            let observation: Observation = body.into_entity()?;
            to_json(&api.create_observation(observation).await?)?
        }
        entity_type => with_entity!(entity_type, E => {
            let entity: E = body.into_entity()?;
            to_json(&api.create::<E>(entity).await?)?
        }),
    };

    Ok(created_response(created))
}

/// Handler for creating an entity through a navigation property.
///
/// Only Observations under a Datastream can be created this way.
///
/// # HTTP Request
///
/// `POST [base]/v1.0/Datastreams(7)/Observations`
pub async fn create_related_handler<S>(
    State(state): State<AppState<S>>,
    Path((resource, navigation)): Path<(String, String)>,
    body: EntityBody,
) -> RestResult<Response>
where
    S: SensorThingsStorage,
{
    let parent = ResourcePath::parse(&resource)?.as_parent()?;
    let navigation = Navigation::parse(&navigation)?;
    debug!(parent = %parent, navigation = ?navigation, "Processing related create request");

    match (parent.entity_type, navigation) {
        (EntityType::Datastream, Navigation::Collection(EntityType::Observation)) => {
            let observation: Observation = body.into_entity()?;
            let created = state
                .api()
                .create_observation_for_datastream(parent.id, observation)
                .await?;
            Ok(created_response(to_json(&created)?))
        }
        _ => Err(RestError::BadRequest {
            message: format!("Entities cannot be created under {}", parent),
        }),
    }
}
