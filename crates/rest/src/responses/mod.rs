//! Response shaping for the SensorThings API.
//!
//! - [`select`] - `$select` projection
//! - [`data_array`] - `$resultFormat=dataArray` grouping of Observations
//! - [`created`] - `201 Created` responses with a `Location` header

pub mod created;
pub mod data_array;
pub mod select;

pub use created::created_response;

use serde::Serialize;
use serde_json::Value;

use crate::error::{RestError, RestResult};

/// Serializes an entity for a response body.
pub fn to_json<T: Serialize>(value: &T) -> RestResult<Value> {
    serde_json::to_value(value).map_err(|e| RestError::InternalError {
        message: format!("Failed to serialize response: {}", e),
    })
}
