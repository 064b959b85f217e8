//! Entity type tags and their query capabilities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::query_options::QueryOptionKind;

/// Options every readable entity type accepts.
const COMMON_OPTIONS: &[QueryOptionKind] = &[
    QueryOptionKind::Filter,
    QueryOptionKind::Expand,
    QueryOptionKind::Select,
    QueryOptionKind::OrderBy,
    QueryOptionKind::Top,
    QueryOptionKind::Skip,
    QueryOptionKind::Count,
];

const OBSERVATION_OPTIONS: &[QueryOptionKind] = &[
    QueryOptionKind::Filter,
    QueryOptionKind::Expand,
    QueryOptionKind::Select,
    QueryOptionKind::OrderBy,
    QueryOptionKind::Top,
    QueryOptionKind::Skip,
    QueryOptionKind::Count,
    QueryOptionKind::ResultFormat,
];

/// The entity types exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// An object of the physical or information world.
    Thing,
    /// The last known location of a Thing.
    Location,
    /// A grouping of Observations measuring the same property.
    Datastream,
    /// The subject an Observation's result describes.
    FeatureOfInterest,
    /// A single measured value.
    Observation,
}

impl EntityType {
    /// All entity types, in service-root order.
    pub const ALL: [EntityType; 5] = [
        EntityType::Thing,
        EntityType::Location,
        EntityType::Datastream,
        EntityType::FeatureOfInterest,
        EntityType::Observation,
    ];

    /// Returns the entity type name (e.g. `FeatureOfInterest`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Thing => "Thing",
            EntityType::Location => "Location",
            EntityType::Datastream => "Datastream",
            EntityType::FeatureOfInterest => "FeatureOfInterest",
            EntityType::Observation => "Observation",
        }
    }

    /// Returns the canonical collection name used in URLs (e.g. `FeaturesOfInterest`).
    pub fn collection_name(&self) -> &'static str {
        match self {
            EntityType::Thing => "Things",
            EntityType::Location => "Locations",
            EntityType::Datastream => "Datastreams",
            EntityType::FeatureOfInterest => "FeaturesOfInterest",
            EntityType::Observation => "Observations",
        }
    }

    /// Looks up an entity type by collection name, ignoring case.
    pub fn from_collection(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.collection_name().eq_ignore_ascii_case(name))
    }

    /// Returns the query options this entity type accepts.
    pub fn supported_options(&self) -> &'static [QueryOptionKind] {
        match self {
            EntityType::Observation => OBSERVATION_OPTIONS,
            EntityType::Thing
            | EntityType::Location
            | EntityType::Datastream
            | EntityType::FeatureOfInterest => COMMON_OPTIONS,
        }
    }

    /// Returns true if `kind` is in this type's whitelist.
    pub fn supports(&self, kind: QueryOptionKind) -> bool {
        self.supported_options().contains(&kind)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .or_else(|| Self::from_collection(s))
            .ok_or_else(|| format!("unknown entity type '{}'", s))
    }
}
