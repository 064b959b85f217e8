//! Axum extractors for SensorThings requests.
//!
//! - [`ODataQuery`] - structured query options from the query string
//! - [`EntityBody`] - a JSON entity body
//! - [`ResourcePath`] / [`Navigation`] - resource path segments such as `Things(1)`

mod entity_body;
mod query;
mod resource_path;

pub use entity_body::EntityBody;
pub use query::ODataQuery;
pub use resource_path::{Navigation, ResourcePath};
