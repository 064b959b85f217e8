//! In-memory tables and the generic row operations behind them.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{
    BackendError, ResourceError, StorageError, StorageResult, ValidationError,
};
use crate::types::{
    Datastream, Entity, EntityId, EntityType, FeatureOfInterest, Location, Observation, Page,
    ParentRef, QueryOptions, SortDirection, Thing,
};

pub(super) const BACKEND_NAME: &str = "memory";

/// Name of the unique index on a FeatureOfInterest's origin Location.
pub(super) const ORIGIN_LOCATION_CONSTRAINT: &str = "origin_location";

/// In-memory SensorThings backend.
pub struct InMemoryBackend {
    pub(super) tables: RwLock<Tables>,
    writes: AtomicU64,
}

impl Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("InMemoryBackend")
            .field("things", &tables.things.len())
            .field("locations", &tables.locations.len())
            .field("datastreams", &tables.datastreams.len())
            .field("features_of_interest", &tables.features.len())
            .field("observations", &tables.observations.len())
            .field("writes", &self.write_count())
            .finish()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            writes: AtomicU64::new(0),
        }
    }

    /// Returns the number of successful writes (post, patch, delete).
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns the number of stored entities of a type.
    pub fn count(&self, entity_type: EntityType) -> usize {
        let tables = self.tables.read();
        match entity_type {
            EntityType::Thing => tables.things.len(),
            EntityType::Location => tables.locations.len(),
            EntityType::Datastream => tables.datastreams.len(),
            EntityType::FeatureOfInterest => tables.features.len(),
            EntityType::Observation => tables.observations.len(),
        }
    }

    pub(super) fn read_one<E: Table>(&self, id: EntityId, options: &QueryOptions) -> StorageResult<E> {
        if options.expand.is_some() {
            return Err(unsupported("$expand"));
        }
        let tables = self.tables.read();
        E::rows(&tables)
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(E::ENTITY_TYPE, id))
    }

    pub(super) fn read_all<E: Table>(&self, options: &QueryOptions) -> StorageResult<Page<E>> {
        check_collection_options(options)?;
        let items: Vec<E> = {
            let tables = self.tables.read();
            E::rows(&tables).values().cloned().collect()
        };
        window(items, options)
    }

    pub(super) fn read_children<E: Table>(
        &self,
        parent: ParentRef,
        options: &QueryOptions,
    ) -> StorageResult<Page<E>> {
        check_collection_options(options)?;
        let items: Vec<E> = {
            let tables = self.tables.read();
            if !tables.contains(parent.entity_type, parent.id) {
                return Err(not_found(parent.entity_type, parent.id));
            }
            let ids = E::children(&tables, parent).ok_or(ValidationError::UnsupportedRelation {
                entity_type: E::ENTITY_TYPE,
                parent: parent.entity_type,
            })?;
            let rows = E::rows(&tables);
            ids.iter().filter_map(|id| rows.get(id).cloned()).collect()
        };
        window(items, options)
    }

    pub(super) fn insert<E: Table>(&self, mut entity: E) -> StorageResult<E> {
        let mut tables = self.tables.write();
        E::check_references(&tables, &mut entity)?;
        let id = tables.next_id(E::ENTITY_TYPE);
        entity.set_id(id);
        E::index(&mut tables, id, &mut entity);
        E::rows_mut(&mut tables).insert(id, entity.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(entity_type = %E::ENTITY_TYPE, id = %id, "Inserted row");
        Ok(entity)
    }

    pub(super) fn merge<E: Table>(&self, id: EntityId, patch: E) -> StorageResult<E> {
        let mut tables = self.tables.write();
        let current = E::rows(&tables)
            .get(&id)
            .ok_or_else(|| not_found(E::ENTITY_TYPE, id))?;

        let mut document = serde_json::to_value(current).map_err(internal)?;
        let patch_document = serde_json::to_value(&patch).map_err(internal)?;
        json_patch::merge(&mut document, &patch_document);

        let mut merged: E = serde_json::from_value(document).map_err(internal)?;
        merged.set_id(id);
        E::check_references(&tables, &mut merged)?;
        E::index(&mut tables, id, &mut merged);
        E::rows_mut(&mut tables).insert(id, merged.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(entity_type = %E::ENTITY_TYPE, id = %id, "Patched row");
        Ok(merged)
    }

    pub(super) fn remove<E: Table>(&self, id: EntityId) -> StorageResult<()> {
        let mut tables = self.tables.write();
        if E::rows_mut(&mut tables).remove(&id).is_none() {
            return Err(not_found(E::ENTITY_TYPE, id));
        }
        E::on_delete(&mut tables, id);
        self.writes.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(entity_type = %E::ENTITY_TYPE, id = %id, "Deleted row");
        Ok(())
    }

    pub(super) fn contains<E: Table>(&self, id: EntityId) -> bool {
        E::rows(&self.tables.read()).contains_key(&id)
    }
}

#[derive(Debug, Default)]
pub(super) struct Tables {
    pub(super) things: BTreeMap<EntityId, Thing>,
    pub(super) locations: BTreeMap<EntityId, Location>,
    /// Thing id to its Location ids, ascending.
    pub(super) thing_locations: BTreeMap<EntityId, Vec<EntityId>>,
    pub(super) datastreams: BTreeMap<EntityId, Datastream>,
    pub(super) features: BTreeMap<EntityId, FeatureOfInterest>,
    /// Unique index: origin Location id to FeatureOfInterest id.
    pub(super) features_by_location: HashMap<EntityId, EntityId>,
    pub(super) observations: BTreeMap<EntityId, Observation>,
    sequences: HashMap<EntityType, u64>,
}

impl Tables {
    fn next_id(&mut self, entity_type: EntityType) -> EntityId {
        let sequence = self.sequences.entry(entity_type).or_insert(0);
        *sequence += 1;
        EntityId::new(*sequence)
    }

    fn contains(&self, entity_type: EntityType, id: EntityId) -> bool {
        match entity_type {
            EntityType::Thing => self.things.contains_key(&id),
            EntityType::Location => self.locations.contains_key(&id),
            EntityType::Datastream => self.datastreams.contains_key(&id),
            EntityType::FeatureOfInterest => self.features.contains_key(&id),
            EntityType::Observation => self.observations.contains_key(&id),
        }
    }

    fn delete_observations_where(&mut self, predicate: impl Fn(&Observation) -> bool) {
        self.observations.retain(|_, obs| !predicate(obs));
    }
}

/// Per-entity table access and write rules.
pub(super) trait Table: Entity {
    fn rows(tables: &Tables) -> &BTreeMap<EntityId, Self>;

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<EntityId, Self>;

    /// Validates and normalises references before a write. Must not mutate tables.
    fn check_references(_tables: &Tables, _entity: &mut Self) -> StorageResult<()> {
        Ok(())
    }

    /// Maintains secondary indexes and dependent rows for a validated write.
    fn index(_tables: &mut Tables, _id: EntityId, _entity: &mut Self) {}

    /// Returns the ids related to `parent`, or `None` if the relation is not navigable.
    fn children(tables: &Tables, parent: ParentRef) -> Option<Vec<EntityId>>;

    /// Removes dependent rows and index entries.
    fn on_delete(_tables: &mut Tables, _id: EntityId) {}
}

impl Table for Thing {
    fn rows(tables: &Tables) -> &BTreeMap<EntityId, Self> {
        &tables.things
    }

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<EntityId, Self> {
        &mut tables.things
    }

    fn check_references(tables: &Tables, thing: &mut Self) -> StorageResult<()> {
        for location in thing.locations.iter().flatten() {
            if let Some(id) = location.id
                && !tables.locations.contains_key(&id)
            {
                return Err(ValidationError::InvalidReference {
                    entity_type: EntityType::Thing,
                    target: EntityType::Location,
                    id,
                }
                .into());
            }
        }
        Ok(())
    }

    fn index(tables: &mut Tables, id: EntityId, thing: &mut Self) {
        let Some(locations) = thing.locations.take() else {
            return;
        };

        let mut location_ids = Vec::with_capacity(locations.len());
        for mut location in locations {
            let location_id = match location.id {
                Some(existing) => existing,
                None => {
                    let new_id = tables.next_id(EntityType::Location);
                    location.set_id(new_id);
                    tables.locations.insert(new_id, location);
                    new_id
                }
            };
            location_ids.push(location_id);
        }
        location_ids.sort();
        location_ids.dedup();
        tables.thing_locations.insert(id, location_ids);
    }

    fn children(tables: &Tables, parent: ParentRef) -> Option<Vec<EntityId>> {
        match parent.entity_type {
            EntityType::Location => Some(
                tables
                    .thing_locations
                    .iter()
                    .filter(|(_, locations)| locations.contains(&parent.id))
                    .map(|(thing_id, _)| *thing_id)
                    .collect(),
            ),
            _ => None,
        }
    }

    fn on_delete(tables: &mut Tables, id: EntityId) {
        tables.thing_locations.remove(&id);
        let datastream_ids: Vec<EntityId> = tables
            .datastreams
            .iter()
            .filter(|(_, ds)| ds.thing.as_ref().and_then(|t| t.id) == Some(id))
            .map(|(ds_id, _)| *ds_id)
            .collect();
        for datastream_id in datastream_ids {
            tables.datastreams.remove(&datastream_id);
            Datastream::on_delete(tables, datastream_id);
        }
    }
}

impl Table for Location {
    fn rows(tables: &Tables) -> &BTreeMap<EntityId, Self> {
        &tables.locations
    }

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<EntityId, Self> {
        &mut tables.locations
    }

    fn children(tables: &Tables, parent: ParentRef) -> Option<Vec<EntityId>> {
        match parent.entity_type {
            EntityType::Thing => Some(
                tables
                    .thing_locations
                    .get(&parent.id)
                    .cloned()
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }

    fn on_delete(tables: &mut Tables, id: EntityId) {
        for locations in tables.thing_locations.values_mut() {
            locations.retain(|location_id| *location_id != id);
        }
    }
}

impl Table for Datastream {
    fn rows(tables: &Tables) -> &BTreeMap<EntityId, Self> {
        &tables.datastreams
    }

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<EntityId, Self> {
        &mut tables.datastreams
    }

    fn check_references(tables: &Tables, datastream: &mut Self) -> StorageResult<()> {
        let thing_id = required_reference(
            EntityType::Datastream,
            EntityType::Thing,
            datastream.thing.as_ref().map(|t| t.id),
        )?;
        if !tables.things.contains_key(&thing_id) {
            return Err(ValidationError::InvalidReference {
                entity_type: EntityType::Datastream,
                target: EntityType::Thing,
                id: thing_id,
            }
            .into());
        }
        datastream.thing = Some(Thing::reference(thing_id));
        Ok(())
    }

    fn children(tables: &Tables, parent: ParentRef) -> Option<Vec<EntityId>> {
        match parent.entity_type {
            EntityType::Thing => Some(
                tables
                    .datastreams
                    .iter()
                    .filter(|(_, ds)| ds.thing.as_ref().and_then(|t| t.id) == Some(parent.id))
                    .map(|(id, _)| *id)
                    .collect(),
            ),
            _ => None,
        }
    }

    fn on_delete(tables: &mut Tables, id: EntityId) {
        tables.delete_observations_where(|obs| obs.datastream_id() == Some(id));
    }
}

impl Table for FeatureOfInterest {
    fn rows(tables: &Tables) -> &BTreeMap<EntityId, Self> {
        &tables.features
    }

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<EntityId, Self> {
        &mut tables.features
    }

    fn check_references(tables: &Tables, feature: &mut Self) -> StorageResult<()> {
        if let Some(location_id) = feature.origin_location_id
            && let Some(existing) = tables.features_by_location.get(&location_id)
            && Some(*existing) != feature.id
        {
            return Err(ResourceError::UniqueViolation {
                entity_type: EntityType::FeatureOfInterest,
                constraint: ORIGIN_LOCATION_CONSTRAINT.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn index(tables: &mut Tables, id: EntityId, feature: &mut Self) {
        tables.features_by_location.retain(|_, feature_id| *feature_id != id);
        if let Some(location_id) = feature.origin_location_id {
            tables.features_by_location.insert(location_id, id);
        }
    }

    fn children(_tables: &Tables, _parent: ParentRef) -> Option<Vec<EntityId>> {
        None
    }

    fn on_delete(tables: &mut Tables, id: EntityId) {
        tables.features_by_location.retain(|_, feature_id| *feature_id != id);
        tables.delete_observations_where(|obs| obs.feature_of_interest_id() == Some(id));
    }
}

impl Table for Observation {
    fn rows(tables: &Tables) -> &BTreeMap<EntityId, Self> {
        &tables.observations
    }

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<EntityId, Self> {
        &mut tables.observations
    }

    fn check_references(tables: &Tables, obs: &mut Self) -> StorageResult<()> {
        let datastream_id = required_reference(
            EntityType::Observation,
            EntityType::Datastream,
            obs.datastream.as_ref().map(|d| d.id),
        )?;
        if !tables.datastreams.contains_key(&datastream_id) {
            return Err(ValidationError::InvalidReference {
                entity_type: EntityType::Observation,
                target: EntityType::Datastream,
                id: datastream_id,
            }
            .into());
        }

        let feature_id = required_reference(
            EntityType::Observation,
            EntityType::FeatureOfInterest,
            obs.feature_of_interest.as_ref().map(|f| f.id),
        )?;
        if !tables.features.contains_key(&feature_id) {
            return Err(ValidationError::InvalidReference {
                entity_type: EntityType::Observation,
                target: EntityType::FeatureOfInterest,
                id: feature_id,
            }
            .into());
        }

        obs.datastream = Some(Datastream::reference(datastream_id));
        obs.feature_of_interest = Some(FeatureOfInterest::reference(feature_id));
        Ok(())
    }

    fn children(tables: &Tables, parent: ParentRef) -> Option<Vec<EntityId>> {
        let matches: fn(&Observation) -> Option<EntityId> = match parent.entity_type {
            EntityType::Datastream => Observation::datastream_id,
            EntityType::FeatureOfInterest => Observation::feature_of_interest_id,
            _ => return None,
        };
        Some(
            tables
                .observations
                .iter()
                .filter(|(_, obs)| matches(obs) == Some(parent.id))
                .map(|(id, _)| *id)
                .collect(),
        )
    }
}

/// `None` means the relation is absent, `Some(None)` that it lacks an id.
fn required_reference(
    entity_type: EntityType,
    target: EntityType,
    reference: Option<Option<EntityId>>,
) -> StorageResult<EntityId> {
    match reference {
        Some(Some(id)) => Ok(id),
        _ => Err(ValidationError::MissingReferenceId {
            entity_type,
            target,
        }
        .into()),
    }
}

fn check_collection_options(options: &QueryOptions) -> StorageResult<()> {
    if options.filter.is_some() {
        return Err(unsupported("$filter"));
    }
    if options.expand.is_some() {
        return Err(unsupported("$expand"));
    }
    Ok(())
}

/// Applies `$orderby`, then `$skip` and `$top`.
fn window<E: Entity>(items: Vec<E>, options: &QueryOptions) -> StorageResult<Page<E>> {
    let total_count = items.len() as u64;

    let items = match options.order_by.as_deref() {
        Some(terms) if !terms.is_empty() => {
            let mut keyed = items
                .into_iter()
                .map(|item| serde_json::to_value(&item).map(|doc| (doc, item)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(internal)?;
            keyed.sort_by(|(a, _), (b, _)| {
                terms
                    .iter()
                    .map(|term| {
                        let property = sort_property(&term.property);
                        let ordering = compare_values(a.get(property), b.get(property));
                        match term.direction {
                            SortDirection::Asc => ordering,
                            SortDirection::Desc => ordering.reverse(),
                        }
                    })
                    .find(|ordering| *ordering != CmpOrdering::Equal)
                    .unwrap_or(CmpOrdering::Equal)
            });
            keyed.into_iter().map(|(_, item)| item).collect()
        }
        _ => items,
    };

    let skip = options.skip_or_zero() as usize;
    let top = options.top.map(|top| top as usize).unwrap_or(usize::MAX);
    let items = items.into_iter().skip(skip).take(top).collect();

    Ok(Page::new(items, total_count))
}

fn sort_property(property: &str) -> &str {
    if property.eq_ignore_ascii_case("id") {
        "@iot.id"
    } else {
        property
    }
}

/// Absent values sort first; mixed types fall back to their JSON text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y))
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

pub(super) fn not_found(entity_type: EntityType, id: EntityId) -> StorageError {
    ResourceError::NotFound { entity_type, id }.into()
}

fn unsupported(capability: &str) -> StorageError {
    BackendError::UnsupportedCapability {
        backend_name: BACKEND_NAME.to_string(),
        capability: capability.to_string(),
    }
    .into()
}

fn internal(err: serde_json::Error) -> StorageError {
    BackendError::Internal {
        backend_name: BACKEND_NAME.to_string(),
        message: err.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obs(result: Value) -> Observation {
        Observation {
            result: Some(result),
            ..Default::default()
        }
    }

    #[test]
    fn test_window_applies_skip_and_top() {
        let items: Vec<Observation> = (0..5).map(|n| obs(json!(n))).collect();
        let options = QueryOptions::parse("$top=2&$skip=1").unwrap();
        let page = window(items, &options).unwrap();
        assert_eq!(page.total_count, 5);
        let results: Vec<_> = page.items.iter().map(|o| o.result.clone().unwrap()).collect();
        assert_eq!(results, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_window_orders_descending() {
        let items = vec![obs(json!(2)), obs(json!(9)), obs(json!(4))];
        let options = QueryOptions::parse("$orderby=result desc").unwrap();
        let page = window(items, &options).unwrap();
        let results: Vec<_> = page.items.iter().map(|o| o.result.clone().unwrap()).collect();
        assert_eq!(results, vec![json!(9), json!(4), json!(2)]);
    }

    #[test]
    fn test_compare_values_absent_first() {
        assert_eq!(
            compare_values(None, Some(&json!(1))),
            CmpOrdering::Less
        );
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!("a"))),
            CmpOrdering::Greater
        );
    }

    #[test]
    fn test_rejected_insert_keeps_sequence() {
        let backend = InMemoryBackend::new();
        let orphan = Datastream {
            thing: Some(Thing::reference(EntityId::new(9))),
            ..Default::default()
        };
        assert!(backend.insert(orphan).is_err());

        let thing = backend.insert(Thing::default()).unwrap();
        let datastream = backend
            .insert(Datastream {
                thing: Some(Thing::reference(thing.id.unwrap())),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(datastream.id, Some(EntityId::new(1)));
        assert_eq!(backend.write_count(), 2);
    }

    #[test]
    fn test_sequences_are_per_table() {
        let mut tables = Tables::default();
        assert_eq!(tables.next_id(EntityType::Thing), EntityId::new(1));
        assert_eq!(tables.next_id(EntityType::Thing), EntityId::new(2));
        assert_eq!(tables.next_id(EntityType::Location), EntityId::new(1));
    }
}
