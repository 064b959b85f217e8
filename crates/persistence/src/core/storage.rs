//! Storage traits consumed by the orchestration layer.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::{
    Datastream, Entity, EntityId, FeatureOfInterest, Location, Observation, Page, ParentRef,
    QueryOptions, Thing,
};

/// CRUD operations for one entity type.
///
/// Options passed to the read methods have already been checked against the
/// entity type's capability table; a backend that cannot honour an option it
/// receives reports `BackendError::UnsupportedCapability`.
///
/// Every method that addresses a single entity reports a missing one as
/// `ResourceError::NotFound`, never as a generic backend failure.
#[async_trait]
pub trait EntityStorage<E: Entity>: Send + Sync {
    /// Reads one entity.
    async fn get(&self, id: EntityId, options: &QueryOptions) -> StorageResult<E>;

    /// Reads a window of the whole collection.
    async fn get_collection(&self, options: &QueryOptions) -> StorageResult<Page<E>>;

    /// Reads a window of the entities related to `parent`.
    ///
    /// Fails with `ResourceError::NotFound` if the parent does not exist and
    /// `ValidationError::UnsupportedRelation` if the relation is not navigable.
    async fn get_collection_by_parent(
        &self,
        parent: ParentRef,
        options: &QueryOptions,
    ) -> StorageResult<Page<E>>;

    /// Persists a new entity and returns it with its assigned id.
    async fn post(&self, entity: E) -> StorageResult<E>;

    /// Merges the set fields of `patch` into the stored entity.
    async fn patch(&self, id: EntityId, patch: E) -> StorageResult<E>;

    /// Deletes an entity.
    async fn delete(&self, id: EntityId) -> StorageResult<()>;

    /// Returns true if the entity exists.
    async fn exists(&self, id: EntityId) -> StorageResult<bool>;
}

/// Relationship lookups used to derive a FeatureOfInterest.
#[async_trait]
pub trait RelationStorage: Send + Sync {
    /// Returns the Thing that owns a Datastream.
    async fn thing_by_datastream(&self, datastream_id: EntityId) -> StorageResult<Thing>;

    /// Returns the Locations of a Thing in storage order.
    async fn locations_by_thing(&self, thing_id: EntityId) -> StorageResult<Vec<Location>>;

    /// Returns the FeatureOfInterest derived from a Location, if one exists.
    async fn feature_of_interest_by_location(
        &self,
        location_id: EntityId,
    ) -> StorageResult<Option<FeatureOfInterest>>;
}

/// A complete SensorThings storage backend.
pub trait SensorThingsStorage:
    EntityStorage<Thing>
    + EntityStorage<Location>
    + EntityStorage<Datastream>
    + EntityStorage<FeatureOfInterest>
    + EntityStorage<Observation>
    + RelationStorage
    + 'static
{
    /// Returns a human-readable name for this backend.
    fn backend_name(&self) -> &'static str;
}
