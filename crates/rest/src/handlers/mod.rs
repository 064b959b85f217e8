//! HTTP request handlers for the SensorThings API.
//!
//! - [`root`] - service root document
//! - [`read`] - entities, collections and navigation
//! - [`create`] - create, including Observations under a Datastream
//! - [`patch`] - partial update
//! - [`delete`] - delete
//! - [`health`] - health check endpoint
//! - [`fallback`] - JSON 404 for unrouted paths

/// Runs `$body` with `$E` bound to the entity struct of `$entity_type`.
macro_rules! with_entity {
    ($entity_type:expr, $E:ident => $body:expr) => {{
        use sensorthings_persistence::types::{
            Datastream, EntityType, FeatureOfInterest, Location, Observation, Thing,
        };
        match $entity_type {
            EntityType::Thing => {
                type $E = Thing;
                $body
            }
            EntityType::Location => {
                type $E = Location;
                $body
            }
            EntityType::Datastream => {
                type $E = Datastream;
                $body
            }
            EntityType::FeatureOfInterest => {
                type $E = FeatureOfInterest;
                $body
            }
            EntityType::Observation => {
                type $E = Observation;
                $body
            }
        }
    }};
}

pub mod create;
pub mod delete;
pub mod fallback;
pub mod health;
pub mod patch;
pub mod read;
pub mod root;

pub use create::{create_handler, create_related_handler};
pub use delete::delete_handler;
pub use fallback::not_found_handler;
pub use health::health_handler;
pub use patch::patch_handler;
pub use read::{navigation_handler, read_handler};
pub use root::service_root_handler;
