//! Error types for the SensorThings API.
//!
//! Every error is rendered as a JSON error document:
//!
//! ```json
//! {"error": {"code": 400, "status": "Bad Request", "message": ["..."]}}
//! ```
//!
//! `message` is a list so that validation failures can report every problem
//! at once.
//!
//! # Error Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | BadRequest, MissingMandatoryParameters, UnsupportedQueryOption | 400 |
//! | NotFound | 404 |
//! | Conflict | 409 |
//! | NotImplemented | 501 |
//! | InternalError | 500 |
//!
//! Storage errors from the persistence layer are mapped as follows:
//!
//! | Storage Error | HTTP Status |
//! |--------------|-------------|
//! | NotFound | 404 |
//! | UniqueViolation | 409 |
//! | Validation | 400 |
//! | UnsupportedCapability | 501 |
//! | Internal | 500 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sensorthings_persistence::error::{BackendError, ResourceError, StorageError};
use sensorthings_persistence::types::{EntityType, QueryOptionError, QueryOptionKind};
use std::fmt;

/// The primary error type for REST API operations.
#[derive(Debug)]
pub enum RestError {
    /// Bad request (HTTP 400).
    BadRequest {
        /// Error message.
        message: String,
    },

    /// One or more mandatory fields are absent (HTTP 400).
    MissingMandatoryParameters {
        /// The entity being written.
        entity_type: EntityType,
        /// Wire names of the missing fields; nested ones as `Relation[index].field`.
        fields: Vec<String>,
    },

    /// A query option is not supported for the addressed entity type (HTTP 400).
    UnsupportedQueryOption {
        /// The rejected option.
        option: QueryOptionKind,
        /// The addressed entity type.
        entity_type: EntityType,
    },

    /// Resource not found (HTTP 404).
    NotFound {
        /// Error message.
        message: String,
    },

    /// Conflict (HTTP 409).
    Conflict {
        /// Error message.
        message: String,
    },

    /// Not implemented (HTTP 501).
    NotImplemented {
        /// Description of what's not implemented.
        feature: String,
    },

    /// Internal server error (HTTP 500).
    InternalError {
        /// Error message.
        message: String,
    },
}

impl RestError {
    /// Returns the HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::BadRequest { .. }
            | RestError::MissingMandatoryParameters { .. }
            | RestError::UnsupportedQueryOption { .. } => StatusCode::BAD_REQUEST,
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::Conflict { .. } => StatusCode::CONFLICT,
            RestError::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns one message per reported problem.
    pub fn messages(&self) -> Vec<String> {
        match self {
            RestError::MissingMandatoryParameters {
                entity_type,
                fields,
            } => fields
                .iter()
                .map(|field| format!("Missing mandatory parameter: {}.{}", entity_type, field))
                .collect(),
            other => vec![other.to_string()],
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::BadRequest { message } => write!(f, "{}", message),
            RestError::MissingMandatoryParameters {
                entity_type,
                fields,
            } => {
                write!(
                    f,
                    "Missing mandatory parameters for {}: {}",
                    entity_type,
                    fields.join(", ")
                )
            }
            RestError::UnsupportedQueryOption {
                option,
                entity_type,
            } => {
                write!(
                    f,
                    "Query option {} is not supported for {}",
                    option,
                    entity_type.collection_name()
                )
            }
            RestError::NotFound { message } => write!(f, "{}", message),
            RestError::Conflict { message } => write!(f, "{}", message),
            RestError::NotImplemented { feature } => {
                write!(f, "Not implemented: {}", feature)
            }
            RestError::InternalError { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for RestError {}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = create_error_document(status, self.messages());
        (status, Json(body)).into_response()
    }
}

/// Creates the JSON error document for a status and its messages.
pub fn create_error_document(status: StatusCode, messages: Vec<String>) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": status.as_u16(),
            "status": status.canonical_reason().unwrap_or("Unknown"),
            "message": messages
        }
    })
}

// Implement conversions from storage errors

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Resource(e) => e.into(),
            StorageError::Validation(e) => RestError::BadRequest {
                message: e.to_string(),
            },
            StorageError::Backend(e) => e.into(),
        }
    }
}

impl From<ResourceError> for RestError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound { .. } => RestError::NotFound {
                message: err.to_string(),
            },
            ResourceError::UniqueViolation { .. } => RestError::Conflict {
                message: err.to_string(),
            },
        }
    }
}

impl From<BackendError> for RestError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::UnsupportedCapability { capability, .. } => RestError::NotImplemented {
                feature: capability,
            },
            _ => RestError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

impl From<QueryOptionError> for RestError {
    fn from(err: QueryOptionError) -> Self {
        RestError::BadRequest {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        RestError::BadRequest {
            message: format!("Invalid JSON: {}", err),
        }
    }
}

/// Result type alias for REST operations.
pub type RestResult<T> = Result<T, RestError>;
