//! SensorThings persistence layer.
//!
//! This crate defines everything the resource orchestration layer needs to
//! talk to a storage engine without knowing which one it is:
//!
//! - [`types`] - Logical entities (Thing, Location, Datastream,
//!   FeatureOfInterest, Observation), identifiers, and the structured query
//!   option set with each entity type's capability table
//! - [`core`] - The async storage traits a backend implements
//! - [`error`] - The storage error taxonomy
//! - [`backends`] - Backend implementations (feature gated)
//!
//! # Backend Features
//!
//! - `memory` (default) - An in-memory reference backend for development and
//!   tests. It enforces the same uniqueness and referential rules a relational
//!   backend would.
//!
//! # Quick Start
//!
//! ```
//! use sensorthings_persistence::types::{EntityType, QueryOptionKind, QueryOptions};
//!
//! let options = QueryOptions::parse("$top=10&$skip=20&$resultFormat=dataArray").unwrap();
//! assert_eq!(options.top, Some(10));
//!
//! // Only Observations accept $resultFormat.
//! assert!(EntityType::Observation.supports(QueryOptionKind::ResultFormat));
//! assert!(!EntityType::Thing.supports(QueryOptionKind::ResultFormat));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod types;

pub use error::{StorageError, StorageResult};
