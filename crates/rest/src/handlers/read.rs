//! Read handlers.
//!
//! `GET [base]/v1.0/{resource}` and `GET [base]/v1.0/{resource}/{navigation}`

use axum::{
    Json,
    extract::{Path, State},
    http::Uri,
    response::{IntoResponse, Response},
};
use sensorthings_persistence::core::SensorThingsStorage;
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::{Navigation, ODataQuery, ResourcePath};
use crate::state::AppState;

/// Handler for a collection or a single entity.
///
/// # HTTP Request
///
/// `GET [base]/v1.0/Things` or `GET [base]/v1.0/Things(1)`
///
/// # Response
///
/// - `200 OK` - the entity, or a collection page
/// - `400 Bad Request` - malformed or unsupported query option
/// - `404 Not Found` - unknown collection or entity
pub async fn read_handler<S>(
    State(state): State<AppState<S>>,
    Path(resource): Path<String>,
    uri: Uri,
    ODataQuery(options): ODataQuery,
) -> RestResult<Response>
where
    S: SensorThingsStorage,
{
    let path = ResourcePath::parse(&resource)?;
    debug!(
        entity_type = %path.entity_type,
        id = ?path.id,
        options = ?options.requested(),
        "Processing read request"
    );

    let api = state.api();
    match path.id {
        Some(id) => {
            let entity =
                with_entity!(path.entity_type, E => api.get_by_id::<E>(id, &options).await)?;
            Ok(Json(entity).into_response())
        }
        None => {
            let request_url = state.request_url(uri.path());
            let page = with_entity!(
                path.entity_type,
                E => api.get_collection::<E>(options, &request_url).await
            )?;
            Ok(Json(page).into_response())
        }
    }
}

/// Handler for a navigation property of an entity.
///
/// # HTTP Request
///
/// `GET [base]/v1.0/Datastreams(7)/Observations` or `GET [base]/v1.0/Datastreams(7)/Thing`
///
/// # Response
///
/// - `200 OK` - a collection page, or the related entity
/// - `400 Bad Request` - the relation is not navigable, or a bad query option
/// - `404 Not Found` - the parent or the related entity does not exist
pub async fn navigation_handler<S>(
    State(state): State<AppState<S>>,
    Path((resource, navigation)): Path<(String, String)>,
    uri: Uri,
    ODataQuery(options): ODataQuery,
) -> RestResult<Response>
where
    S: SensorThingsStorage,
{
    let parent = ResourcePath::parse(&resource)?.as_parent()?;
    let navigation = Navigation::parse(&navigation)?;
    debug!(parent = %parent, navigation = ?navigation, "Processing navigation request");

    let api = state.api();
    match navigation {
        Navigation::Collection(entity_type) => {
            let request_url = state.request_url(uri.path());
            let page = with_entity!(
                entity_type,
                E => api.get_collection_by_parent::<E>(parent, options, &request_url).await
            )?;
            Ok(Json(page).into_response())
        }
        Navigation::Entity(entity_type) => {
            let entity =
                with_entity!(entity_type, E => api.get_related::<E>(parent, &options).await)?;
            Ok(Json(entity).into_response())
        }
    }
}
