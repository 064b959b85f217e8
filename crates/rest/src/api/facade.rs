//! Read, create, patch and delete for every entity type.
//!
//! Reads run the option check first, so a request with an option the entity
//! type does not support never reaches storage. Collections are windowed by
//! `$top`, which is defaulted and clamped from settings, and carry the total
//! count reported by storage plus a continuation link. Every returned item
//! gets its links and `$select` projection; the order storage returned is
//! kept.

use sensorthings_persistence::core::{EntityStorage, SensorThingsStorage};
use sensorthings_persistence::types::{
    Entity, EntityId, EntityType, Observation, Page, ParentRef, QueryOptions, ResultFormat,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::SensorThingsApi;
use super::links::build_next_link;
use super::options::check_supported;
use crate::error::{RestError, RestResult};
use crate::responses::{data_array, select, to_json};

/// One page of a collection, as sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionPage {
    /// Total number of matching entities; omitted when `$count=false`.
    #[serde(rename = "@iot.count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Link to the following page.
    #[serde(rename = "@iot.nextLink", skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    /// The entities on this page, or data array groups.
    pub value: Vec<Value>,
}

impl<S: SensorThingsStorage> SensorThingsApi<S> {
    /// Reads a single entity.
    pub async fn get_by_id<E>(&self, id: EntityId, options: &QueryOptions) -> RestResult<Value>
    where
        S: EntityStorage<E>,
        E: Entity,
    {
        check_supported(options, E::ENTITY_TYPE)?;
        debug!(entity_type = %E::ENTITY_TYPE, id = %id, "Reading entity");

        let entity = EntityStorage::<E>::get(self.storage(), id, options).await?;
        self.render(entity, options)
    }

    /// Reads one page of a collection.
    pub async fn get_collection<E>(
        &self,
        options: QueryOptions,
        request_url: &str,
    ) -> RestResult<CollectionPage>
    where
        S: EntityStorage<E>,
        E: Entity,
    {
        check_supported(&options, E::ENTITY_TYPE)?;
        let options = self.paginate(options);
        debug!(
            entity_type = %E::ENTITY_TYPE,
            top = ?options.top,
            skip = ?options.skip,
            "Reading collection"
        );

        let page = EntityStorage::<E>::get_collection(self.storage(), &options).await?;
        self.collection_page(page, &options, request_url)
    }

    /// Reads one page of the entities related to `parent`.
    pub async fn get_collection_by_parent<E>(
        &self,
        parent: ParentRef,
        options: QueryOptions,
        request_url: &str,
    ) -> RestResult<CollectionPage>
    where
        S: EntityStorage<E>,
        E: Entity,
    {
        check_supported(&options, E::ENTITY_TYPE)?;
        let options = self.paginate(options);
        debug!(
            entity_type = %E::ENTITY_TYPE,
            parent = %parent,
            top = ?options.top,
            skip = ?options.skip,
            "Reading related collection"
        );

        let page =
            EntityStorage::<E>::get_collection_by_parent(self.storage(), parent, &options).await?;
        self.collection_page(page, &options, request_url)
    }

    /// Reads the single entity a navigation property points to, e.g.
    /// `Datastreams(7)/Thing` or `Observations(1)/FeatureOfInterest`.
    pub async fn get_related<E>(&self, parent: ParentRef, options: &QueryOptions) -> RestResult<Value>
    where
        S: EntityStorage<E>,
        E: Entity,
    {
        check_supported(options, E::ENTITY_TYPE)?;

        let no_options = QueryOptions::new();
        let related = match (parent.entity_type, E::ENTITY_TYPE) {
            (EntityType::Datastream, EntityType::Thing) => {
                self.storage().thing_by_datastream(parent.id).await?.id
            }
            (EntityType::Observation, EntityType::Datastream) => {
                EntityStorage::<Observation>::get(self.storage(), parent.id, &no_options)
                    .await?
                    .datastream_id()
            }
            (EntityType::Observation, EntityType::FeatureOfInterest) => {
                EntityStorage::<Observation>::get(self.storage(), parent.id, &no_options)
                    .await?
                    .feature_of_interest_id()
            }
            (parent_type, target) => {
                return Err(RestError::NotFound {
                    message: format!("{} has no navigation property {}", parent_type, target),
                });
            }
        };

        let id = related.ok_or_else(|| RestError::NotFound {
            message: format!("{} has no related {}", parent, E::ENTITY_TYPE),
        })?;
        self.get_by_id::<E>(id, options).await
    }

    /// Creates an entity after checking its mandatory fields.
    ///
    /// Observations should go through [`SensorThingsApi::create_observation`],
    /// which also resolves the FeatureOfInterest.
    pub async fn create<E>(&self, entity: E) -> RestResult<E>
    where
        S: EntityStorage<E>,
        E: Entity,
    {
        require_mandatory(&entity)?;

        let mut created = EntityStorage::<E>::post(self.storage(), entity).await?;
        created.set_all_links(self.base_url());
        debug!(entity_type = %E::ENTITY_TYPE, id = ?created.id(), "Created entity");
        Ok(created)
    }

    /// Applies a partial update.
    ///
    /// A patch carrying any related entity is rejected before storage is
    /// touched; relations cannot be changed through a patch.
    pub async fn patch<E>(&self, id: EntityId, patch: E) -> RestResult<E>
    where
        S: EntityStorage<E>,
        E: Entity,
    {
        if patch.has_relations() {
            return Err(RestError::BadRequest {
                message: format!(
                    "Unable to deep patch {}: related entities cannot be changed in a patch",
                    E::ENTITY_TYPE
                ),
            });
        }

        let mut patched = EntityStorage::<E>::patch(self.storage(), id, patch).await?;
        patched.set_all_links(self.base_url());
        debug!(entity_type = %E::ENTITY_TYPE, id = %id, "Patched entity");
        Ok(patched)
    }

    /// Deletes an entity.
    pub async fn delete<E>(&self, id: EntityId) -> RestResult<()>
    where
        S: EntityStorage<E>,
        E: Entity,
    {
        EntityStorage::<E>::delete(self.storage(), id).await?;
        debug!(entity_type = %E::ENTITY_TYPE, id = %id, "Deleted entity");
        Ok(())
    }

    /// Defaults `$top` and clamps it to the maximum page size.
    fn paginate(&self, options: QueryOptions) -> QueryOptions {
        let settings = self.settings();
        let top = options
            .top
            .unwrap_or(settings.default_page_size)
            .min(settings.max_page_size);
        options.with_top(top)
    }

    fn collection_page<E: Entity>(
        &self,
        page: Page<E>,
        options: &QueryOptions,
        request_url: &str,
    ) -> RestResult<CollectionPage> {
        let next_link = build_next_link(page.total_count, request_url, options);
        let count = options.include_count().then_some(page.total_count);

        let value = match options.result_format {
            Some(ResultFormat::DataArray) => {
                let items = page
                    .items
                    .into_iter()
                    .map(|item| to_json(&item))
                    .collect::<RestResult<Vec<_>>>()?;
                data_array::group(items, options.select.as_deref(), self.base_url())
            }
            None => page
                .items
                .into_iter()
                .map(|item| self.render(item, options))
                .collect::<RestResult<Vec<_>>>()?,
        };

        Ok(CollectionPage {
            count,
            next_link,
            value,
        })
    }

    /// Per-item post-processing: links, then projection.
    fn render<E: Entity>(&self, mut entity: E, options: &QueryOptions) -> RestResult<Value> {
        entity.set_all_links(self.base_url());
        let value = to_json(&entity)?;
        Ok(match options.select.as_deref() {
            Some(properties) => select::project(value, properties),
            None => value,
        })
    }
}

/// Fails with every missing mandatory field at once.
pub(crate) fn require_mandatory<E: Entity>(entity: &E) -> RestResult<()> {
    let mut fields: Vec<String> = entity
        .missing_mandatory_fields()
        .into_iter()
        .map(str::to_string)
        .collect();
    fields.extend(entity.missing_nested_fields());
    if fields.is_empty() {
        Ok(())
    } else {
        Err(RestError::MissingMandatoryParameters {
            entity_type: E::ENTITY_TYPE,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiSettings;
    use crate::notifications::Notifier;
    use sensorthings_persistence::backends::memory::InMemoryBackend;
    use sensorthings_persistence::types::{Location, Thing};
    use serde_json::json;
    use std::sync::Arc;

    fn api() -> SensorThingsApi<InMemoryBackend> {
        SensorThingsApi::new(
            Arc::new(InMemoryBackend::new()),
            ApiSettings {
                external_url: "http://localhost:8080".to_string(),
                default_page_size: 2,
                max_page_size: 3,
            },
            Notifier::disabled(),
        )
    }

    fn thing(name: &str) -> Thing {
        Thing {
            name: Some(name.to_string()),
            description: Some("a thing".to_string()),
            ..Default::default()
        }
    }

    const THINGS_URL: &str = "http://localhost:8080/v1.0/Things";

    #[tokio::test]
    async fn test_default_page_size_and_next_link() {
        let api = api();
        for n in 0..5 {
            api.create(thing(&format!("t{}", n))).await.unwrap();
        }

        let page = api
            .get_collection::<Thing>(QueryOptions::new(), THINGS_URL)
            .await
            .unwrap();
        assert_eq!(page.count, Some(5));
        assert_eq!(page.value.len(), 2);
        assert_eq!(
            page.next_link.as_deref(),
            Some("http://localhost:8080/v1.0/Things?$top=2&$skip=2")
        );
    }

    #[tokio::test]
    async fn test_top_clamped_to_max() {
        let api = api();
        for n in 0..5 {
            api.create(thing(&format!("t{}", n))).await.unwrap();
        }

        let options = QueryOptions::parse("$top=50").unwrap();
        let page = api.get_collection::<Thing>(options, THINGS_URL).await.unwrap();
        assert_eq!(page.value.len(), 3);
        assert_eq!(
            page.next_link.as_deref(),
            Some("http://localhost:8080/v1.0/Things?$top=3&$skip=3")
        );
    }

    #[tokio::test]
    async fn test_count_false_omits_count() {
        let api = api();
        api.create(thing("t")).await.unwrap();

        let options = QueryOptions::parse("$count=false").unwrap();
        let page = api.get_collection::<Thing>(options, THINGS_URL).await.unwrap();
        assert_eq!(page.count, None);
        assert_eq!(page.value.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_option_rejected_before_storage() {
        let api = api();
        let options = QueryOptions::parse("$resultFormat=dataArray").unwrap();
        let err = api
            .get_collection::<Thing>(options, THINGS_URL)
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::UnsupportedQueryOption { .. }));
    }

    #[tokio::test]
    async fn test_items_carry_links_and_projection() {
        let api = api();
        let created = api.create(thing("lamp")).await.unwrap();
        assert_eq!(
            created.self_link.as_deref(),
            Some("http://localhost:8080/v1.0/Things(1)")
        );

        let options = QueryOptions::parse("$select=name").unwrap();
        let value = api
            .get_by_id::<Thing>(EntityId::new(1), &options)
            .await
            .unwrap();
        assert_eq!(value, json!({"name": "lamp"}));
    }

    #[tokio::test]
    async fn test_create_reports_all_missing_fields() {
        let api = api();
        let err = api.create(Location::default()).await.unwrap_err();
        match err {
            RestError::MissingMandatoryParameters {
                entity_type,
                fields,
            } => {
                assert_eq!(entity_type, EntityType::Location);
                assert_eq!(
                    fields,
                    vec!["name", "description", "encodingType", "location"]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(api.storage().write_count(), 0);
    }

    #[tokio::test]
    async fn test_deep_patch_rejected() {
        let api = api();
        api.create(thing("t")).await.unwrap();
        let writes = api.storage().write_count();

        let patch = Thing {
            locations: Some(vec![Location::reference(EntityId::new(1))]),
            ..Default::default()
        };
        let err = api.patch(EntityId::new(1), patch).await.unwrap_err();
        assert!(matches!(err, RestError::BadRequest { .. }));
        assert_eq!(api.storage().write_count(), writes);
    }

    #[tokio::test]
    async fn test_patch_merges_fields() {
        let api = api();
        api.create(thing("before")).await.unwrap();

        let patch = Thing {
            name: Some("after".to_string()),
            ..Default::default()
        };
        let patched = api.patch(EntityId::new(1), patch).await.unwrap();
        assert_eq!(patched.name.as_deref(), Some("after"));
        assert_eq!(patched.description.as_deref(), Some("a thing"));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let api = api();
        let err = api.delete::<Thing>(EntityId::new(9)).await.unwrap_err();
        assert!(matches!(err, RestError::NotFound { .. }));
    }
}
