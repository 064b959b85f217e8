//! Route configuration for the SensorThings API.

pub mod routes;

pub use routes::create_routes;
