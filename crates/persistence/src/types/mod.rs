//! Core types for the persistence layer.
//!
//! - [`Thing`], [`Location`], [`Datastream`], [`FeatureOfInterest`],
//!   [`Observation`] - The logical entities, unified by [`Entity`]
//! - [`EntityId`], [`EntityType`] - Identifiers and type tags
//! - [`QueryOptions`] - The structured system query option set
//! - [`Page`], [`ParentRef`] - Collection results and parent scoping
//!
//! # Examples
//!
//! ```
//! use sensorthings_persistence::types::{Entity, EntityId, Observation};
//! use serde_json::json;
//!
//! let mut obs: Observation = serde_json::from_value(json!({
//!     "result": 21.5,
//!     "Datastream": {"@iot.id": 7}
//! }))
//! .unwrap();
//! assert!(obs.missing_mandatory_fields().is_empty());
//!
//! obs.set_id(EntityId::new(1));
//! obs.set_all_links("http://localhost:8080");
//! assert_eq!(
//!     obs.self_link.as_deref(),
//!     Some("http://localhost:8080/v1.0/Observations(1)")
//! );
//! ```

mod entities;
mod entity_type;
mod id;
mod page;
mod query_options;

pub use entities::{
    Datastream, Entity, FeatureOfInterest, Location, Observation, Thing, self_link,
};
pub use entity_type::EntityType;
pub use id::{EntityId, ParseEntityIdError};
pub use page::{Page, ParentRef};
pub use query_options::{
    OrderBy, QueryOptionError, QueryOptionKind, QueryOptions, ResultFormat, SortDirection,
};
