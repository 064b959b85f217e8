//! Storage trait implementations for the in-memory backend.

use async_trait::async_trait;

use crate::core::{EntityStorage, RelationStorage, SensorThingsStorage};
use crate::error::StorageResult;
use crate::types::{
    Datastream, EntityId, EntityType, FeatureOfInterest, Location, Observation, Page, ParentRef,
    QueryOptions, Thing,
};

use super::backend::{BACKEND_NAME, InMemoryBackend, not_found};

macro_rules! impl_entity_storage {
    ($($entity:ty),+ $(,)?) => {
        $(
            #[async_trait]
            impl EntityStorage<$entity> for InMemoryBackend {
                async fn get(&self, id: EntityId, options: &QueryOptions) -> StorageResult<$entity> {
                    self.read_one(id, options)
                }

                async fn get_collection(&self, options: &QueryOptions) -> StorageResult<Page<$entity>> {
                    self.read_all(options)
                }

                async fn get_collection_by_parent(
                    &self,
                    parent: ParentRef,
                    options: &QueryOptions,
                ) -> StorageResult<Page<$entity>> {
                    self.read_children(parent, options)
                }

                async fn post(&self, entity: $entity) -> StorageResult<$entity> {
                    self.insert(entity)
                }

                async fn patch(&self, id: EntityId, patch: $entity) -> StorageResult<$entity> {
                    self.merge(id, patch)
                }

                async fn delete(&self, id: EntityId) -> StorageResult<()> {
                    self.remove::<$entity>(id)
                }

                async fn exists(&self, id: EntityId) -> StorageResult<bool> {
                    Ok(self.contains::<$entity>(id))
                }
            }
        )+
    };
}

impl_entity_storage!(Thing, Location, Datastream, FeatureOfInterest, Observation);

#[async_trait]
impl RelationStorage for InMemoryBackend {
    async fn thing_by_datastream(&self, datastream_id: EntityId) -> StorageResult<Thing> {
        let tables = self.tables.read();
        let datastream = tables
            .datastreams
            .get(&datastream_id)
            .ok_or_else(|| not_found(EntityType::Datastream, datastream_id))?;
        let thing_id = datastream
            .thing
            .as_ref()
            .and_then(|thing| thing.id)
            .ok_or_else(|| not_found(EntityType::Thing, datastream_id))?;
        tables
            .things
            .get(&thing_id)
            .cloned()
            .ok_or_else(|| not_found(EntityType::Thing, thing_id))
    }

    async fn locations_by_thing(&self, thing_id: EntityId) -> StorageResult<Vec<Location>> {
        let tables = self.tables.read();
        if !tables.things.contains_key(&thing_id) {
            return Err(not_found(EntityType::Thing, thing_id));
        }
        Ok(tables
            .thing_locations
            .get(&thing_id)
            .into_iter()
            .flatten()
            .filter_map(|id| tables.locations.get(id).cloned())
            .collect())
    }

    async fn feature_of_interest_by_location(
        &self,
        location_id: EntityId,
    ) -> StorageResult<Option<FeatureOfInterest>> {
        let tables = self.tables.read();
        Ok(tables
            .features_by_location
            .get(&location_id)
            .and_then(|id| tables.features.get(id))
            .cloned())
    }
}

impl SensorThingsStorage for InMemoryBackend {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }
}
