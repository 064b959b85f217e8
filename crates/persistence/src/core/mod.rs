//! Core storage traits.
//!
//! - [`EntityStorage`] - CRUD and collection reads for one entity type
//! - [`RelationStorage`] - The relationship walks the orchestration layer needs
//! - [`SensorThingsStorage`] - Everything a backend must provide
//!
//! # Trait Hierarchy
//!
//! ```text
//! SensorThingsStorage
//!     ├── EntityStorage<Thing>
//!     ├── EntityStorage<Location>
//!     ├── EntityStorage<Datastream>
//!     ├── EntityStorage<FeatureOfInterest>
//!     ├── EntityStorage<Observation>
//!     └── RelationStorage
//! ```
//!
//! Because a backend implements [`EntityStorage`] once per entity type, call
//! sites name the entity explicitly:
//!
//! ```ignore
//! let obs = EntityStorage::<Observation>::get(&*storage, id, &options).await?;
//! ```

mod storage;

pub use storage::{EntityStorage, RelationStorage, SensorThingsStorage};
