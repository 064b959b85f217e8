//! Logical SensorThings entities.
//!
//! Every field is optional so that the same struct can carry a full entity,
//! a partial patch body, or a bare `{"@iot.id": n}` reference. Which fields are
//! mandatory on create is answered by [`Entity::missing_mandatory_fields`].

// Struct fields are documented by their serde wire names
#![allow(missing_docs)]

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EntityId, EntityType};

/// Behaviour shared by all entity structs.
pub trait Entity:
    Serialize + DeserializeOwned + Clone + Default + Send + Sync + Debug + 'static
{
    /// The type tag of this entity.
    const ENTITY_TYPE: EntityType;

    /// Returns the storage-assigned identifier, if any.
    fn id(&self) -> Option<EntityId>;

    /// Sets the identifier.
    fn set_id(&mut self, id: EntityId);

    /// Stamps `@iot.selfLink` and every navigation link, rooted at `base_url`.
    ///
    /// Does nothing when the entity has no identifier.
    fn set_all_links(&mut self, base_url: &str);

    /// Returns the wire names of mandatory fields that are absent.
    fn missing_mandatory_fields(&self) -> Vec<&'static str>;

    /// Returns the missing mandatory fields of related entities that would
    /// be created along with this one, as `Relation[index].field`.
    fn missing_nested_fields(&self) -> Vec<String> {
        Vec::new()
    }

    /// Returns true if the body carries any related entity.
    fn has_relations(&self) -> bool;

    /// Creates an id-only reference to an entity of this type.
    fn reference(id: EntityId) -> Self {
        let mut entity = Self::default();
        entity.set_id(id);
        entity
    }
}

/// Returns the absolute URL of an entity.
pub fn self_link(base_url: &str, entity_type: EntityType, id: EntityId) -> String {
    format!(
        "{}/v1.0/{}({})",
        base_url.trim_end_matches('/'),
        entity_type.collection_name(),
        id
    )
}

fn navigation_link(self_link: &str, navigation: &str) -> String {
    format!("{}/{}", self_link, navigation)
}

fn require<T>(missing: &mut Vec<&'static str>, field: &Option<T>, name: &'static str) {
    if field.is_none() {
        missing.push(name);
    }
}

/// An object of the physical or information world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(rename = "@iot.selfLink", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(rename = "Locations", default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    #[serde(
        rename = "Locations@iot.navigationLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub locations_link: Option<String>,
    #[serde(
        rename = "Datastreams@iot.navigationLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub datastreams_link: Option<String>,
}

impl Entity for Thing {
    const ENTITY_TYPE: EntityType = EntityType::Thing;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn set_all_links(&mut self, base_url: &str) {
        let Some(id) = self.id else { return };
        let link = self_link(base_url, Self::ENTITY_TYPE, id);
        self.locations_link = Some(navigation_link(&link, "Locations"));
        self.datastreams_link = Some(navigation_link(&link, "Datastreams"));
        self.self_link = Some(link);
    }

    fn missing_mandatory_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        require(&mut missing, &self.name, "name");
        require(&mut missing, &self.description, "description");
        missing
    }

    fn missing_nested_fields(&self) -> Vec<String> {
        // Locations with an id are links to existing rows.
        self.locations
            .iter()
            .flatten()
            .enumerate()
            .filter(|(_, location)| location.id.is_none())
            .flat_map(|(index, location)| {
                location
                    .missing_mandatory_fields()
                    .into_iter()
                    .map(move |field| format!("Locations[{}].{}", index, field))
            })
            .collect()
    }

    fn has_relations(&self) -> bool {
        self.locations.is_some()
    }
}

/// The last known location of a Thing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(rename = "@iot.selfLink", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "encodingType", default, skip_serializing_if = "Option::is_none")]
    pub encoding_type: Option<String>,
    /// Geometry, e.g. a GeoJSON point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(
        rename = "Things@iot.navigationLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub things_link: Option<String>,
}

impl Entity for Location {
    const ENTITY_TYPE: EntityType = EntityType::Location;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn set_all_links(&mut self, base_url: &str) {
        let Some(id) = self.id else { return };
        let link = self_link(base_url, Self::ENTITY_TYPE, id);
        self.things_link = Some(navigation_link(&link, "Things"));
        self.self_link = Some(link);
    }

    fn missing_mandatory_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        require(&mut missing, &self.name, "name");
        require(&mut missing, &self.description, "description");
        require(&mut missing, &self.encoding_type, "encodingType");
        require(&mut missing, &self.location, "location");
        missing
    }

    fn has_relations(&self) -> bool {
        false
    }
}

/// A grouping of Observations measuring one property of a Thing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Datastream {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(rename = "@iot.selfLink", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "unitOfMeasurement",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_of_measurement: Option<Value>,
    #[serde(
        rename = "observationType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub observation_type: Option<String>,
    #[serde(rename = "Thing", default, skip_serializing_if = "Option::is_none")]
    pub thing: Option<Thing>,
    #[serde(
        rename = "Thing@iot.navigationLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub thing_link: Option<String>,
    #[serde(
        rename = "Observations@iot.navigationLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub observations_link: Option<String>,
}

impl Entity for Datastream {
    const ENTITY_TYPE: EntityType = EntityType::Datastream;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn set_all_links(&mut self, base_url: &str) {
        let Some(id) = self.id else { return };
        let link = self_link(base_url, Self::ENTITY_TYPE, id);
        self.thing_link = Some(navigation_link(&link, "Thing"));
        self.observations_link = Some(navigation_link(&link, "Observations"));
        self.self_link = Some(link);
    }

    fn missing_mandatory_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        require(&mut missing, &self.name, "name");
        require(&mut missing, &self.description, "description");
        require(&mut missing, &self.unit_of_measurement, "unitOfMeasurement");
        require(&mut missing, &self.observation_type, "observationType");
        require(&mut missing, &self.thing, "Thing");
        missing
    }

    fn has_relations(&self) -> bool {
        self.thing.is_some()
    }
}

/// The subject an Observation's result describes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureOfInterest {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(rename = "@iot.selfLink", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "encodingType", default, skip_serializing_if = "Option::is_none")]
    pub encoding_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<Value>,
    /// The Location this feature was derived from, if any.
    #[serde(
        rename = "originLocation@iot.id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin_location_id: Option<EntityId>,
    #[serde(
        rename = "Observations@iot.navigationLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub observations_link: Option<String>,
}

impl FeatureOfInterest {
    /// Builds a feature copied from `location` and stamped with its id.
    pub fn derived_from(location: &Location) -> Self {
        Self {
            name: location.name.clone(),
            description: location.description.clone(),
            encoding_type: location.encoding_type.clone(),
            feature: location.location.clone(),
            origin_location_id: location.id,
            ..Self::default()
        }
    }
}

impl Entity for FeatureOfInterest {
    const ENTITY_TYPE: EntityType = EntityType::FeatureOfInterest;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn set_all_links(&mut self, base_url: &str) {
        let Some(id) = self.id else { return };
        let link = self_link(base_url, Self::ENTITY_TYPE, id);
        self.observations_link = Some(navigation_link(&link, "Observations"));
        self.self_link = Some(link);
    }

    fn missing_mandatory_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        require(&mut missing, &self.name, "name");
        require(&mut missing, &self.description, "description");
        require(&mut missing, &self.encoding_type, "encodingType");
        require(&mut missing, &self.feature, "feature");
        missing
    }

    fn has_relations(&self) -> bool {
        false
    }
}

/// A single measured value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "@iot.id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(rename = "@iot.selfLink", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(rename = "phenomenonTime", default, skip_serializing_if = "Option::is_none")]
    pub phenomenon_time: Option<String>,
    #[serde(rename = "resultTime", default, skip_serializing_if = "Option::is_none")]
    pub result_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(rename = "Datastream", default, skip_serializing_if = "Option::is_none")]
    pub datastream: Option<Datastream>,
    #[serde(
        rename = "FeatureOfInterest",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub feature_of_interest: Option<FeatureOfInterest>,
    #[serde(
        rename = "Datastream@iot.navigationLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub datastream_link: Option<String>,
    #[serde(
        rename = "FeatureOfInterest@iot.navigationLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub feature_of_interest_link: Option<String>,
}

impl Observation {
    /// Returns the id of the referenced Datastream.
    pub fn datastream_id(&self) -> Option<EntityId> {
        self.datastream.as_ref().and_then(|d| d.id)
    }

    /// Returns the id of the referenced FeatureOfInterest.
    pub fn feature_of_interest_id(&self) -> Option<EntityId> {
        self.feature_of_interest.as_ref().and_then(|f| f.id)
    }
}

impl Entity for Observation {
    const ENTITY_TYPE: EntityType = EntityType::Observation;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn set_all_links(&mut self, base_url: &str) {
        let Some(id) = self.id else { return };
        let link = self_link(base_url, Self::ENTITY_TYPE, id);
        self.datastream_link = Some(navigation_link(&link, "Datastream"));
        self.feature_of_interest_link = Some(navigation_link(&link, "FeatureOfInterest"));
        self.self_link = Some(link);

        if let Some(feature) = self.feature_of_interest.as_mut() {
            feature.set_all_links(base_url);
        }
    }

    fn missing_mandatory_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        require(&mut missing, &self.result, "result");
        require(&mut missing, &self.datastream, "Datastream");
        missing
    }

    fn has_relations(&self) -> bool {
        self.datastream.is_some() || self.feature_of_interest.is_some()
    }
}
