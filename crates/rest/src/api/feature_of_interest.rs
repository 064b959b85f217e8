//! FeatureOfInterest derivation.
//!
//! When an Observation arrives without a FeatureOfInterest, one is derived
//! from the Location of the Thing that owns the Observation's Datastream:
//!
//! ```text
//! Datastream -> Thing -> Locations[0] -> FeatureOfInterest(originLocation = Location)
//! ```
//!
//! At most one FeatureOfInterest exists per origin Location. The lookup and
//! the insert are two separate storage calls, so two concurrent derivations
//! for the same Location can both miss the lookup. Storage enforces the
//! uniqueness of the origin reference; the loser of that race gets
//! [`ResourceError::UniqueViolation`] and re-reads the winner's row instead
//! of failing.
//!
//! [`ResourceError::UniqueViolation`]: sensorthings_persistence::error::ResourceError::UniqueViolation

use sensorthings_persistence::StorageError;
use sensorthings_persistence::core::{EntityStorage, SensorThingsStorage};
use sensorthings_persistence::types::{Datastream, EntityId, FeatureOfInterest};
use thiserror::Error;
use tracing::debug;

/// Reasons a FeatureOfInterest cannot be derived.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The Datastream does not exist.
    #[error("Datastream {0} not found")]
    DatastreamNotFound(EntityId),

    /// The Datastream has no owning Thing.
    #[error("Thing of Datastream {0} not found")]
    ThingNotFound(EntityId),

    /// The Thing has no Location to derive from.
    #[error("Thing {thing_id} has no Location")]
    NoLocation {
        /// The Thing that was inspected.
        thing_id: EntityId,
    },

    /// Any other storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Returns the FeatureOfInterest for a Datastream, creating it if needed.
///
/// The first Location in storage order is used when a Thing has several.
pub async fn resolve<S>(storage: &S, datastream_id: EntityId) -> Result<FeatureOfInterest, ResolveError>
where
    S: SensorThingsStorage + ?Sized,
{
    if !EntityStorage::<Datastream>::exists(storage, datastream_id).await? {
        return Err(ResolveError::DatastreamNotFound(datastream_id));
    }

    let thing = storage
        .thing_by_datastream(datastream_id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                ResolveError::ThingNotFound(datastream_id)
            } else {
                e.into()
            }
        })?;
    let thing_id = thing.id.ok_or(ResolveError::ThingNotFound(datastream_id))?;

    let locations = storage.locations_by_thing(thing_id).await?;
    let Some((location, location_id)) = locations
        .first()
        .and_then(|location| location.id.map(|id| (location, id)))
    else {
        return Err(ResolveError::NoLocation { thing_id });
    };

    if let Some(existing) = storage.feature_of_interest_by_location(location_id).await? {
        debug!(
            datastream_id = %datastream_id,
            location_id = %location_id,
            feature_id = ?existing.id,
            "Reusing derived FeatureOfInterest"
        );
        return Ok(existing);
    }

    match EntityStorage::<FeatureOfInterest>::post(storage, FeatureOfInterest::derived_from(location))
        .await
    {
        Ok(created) => {
            debug!(
                datastream_id = %datastream_id,
                location_id = %location_id,
                feature_id = ?created.id,
                "Derived new FeatureOfInterest"
            );
            Ok(created)
        }
        Err(e) if e.is_unique_violation() => {
            debug!(
                location_id = %location_id,
                "Lost FeatureOfInterest derivation race, re-reading"
            );
            storage
                .feature_of_interest_by_location(location_id)
                .await?
                .ok_or(ResolveError::Storage(e))
        }
        Err(e) => Err(e.into()),
    }
}
