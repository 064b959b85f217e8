//! HTTP middleware for the SensorThings API.
//!
//! - [`path_case`] - case-insensitive resource paths

pub mod path_case;

pub use path_case::{ReservedSegment, normalize_path, normalize_path_case};
