//! In-memory backend implementation.
//!
//! Rows live in ordered maps behind a single `parking_lot` lock, so every
//! operation is atomic with respect to every other. The backend enforces the
//! same rules a relational schema would:
//!
//! - ids are assigned from a per-table sequence and never reused
//! - Datastreams must reference an existing Thing
//! - Observations must reference an existing Datastream and FeatureOfInterest
//! - at most one FeatureOfInterest per origin Location (`origin_location`)
//! - deleting a row deletes the rows that depend on it
//!
//! Collections come back in ascending id order unless `$orderby` is given.
//! `$filter` and `$expand` are not evaluated and are reported as
//! unsupported capabilities.

mod backend;
mod storage;

pub use backend::InMemoryBackend;
