//! Error types for the persistence layer.
//!
//! Errors are grouped by category so callers can tell a missing row apart
//! from a broken backend: resource state errors, validation errors raised by
//! the store itself, and backend failures.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::types::{EntityId, EntityType};

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Validation errors raised by the store
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns true if this error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }

    /// Returns true if this error reports a uniqueness constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Resource(ResourceError::UniqueViolation { .. })
        )
    }
}

/// Errors related to entity state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested entity was not found.
    #[error("{entity_type}({id}) not found")]
    NotFound { entity_type: EntityType, id: EntityId },

    /// A uniqueness constraint rejected the write.
    #[error("{entity_type} violates unique constraint '{constraint}'")]
    UniqueViolation {
        entity_type: EntityType,
        constraint: String,
    },
}

/// Validation errors detected by the storage engine.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The parent/child combination is not a navigable relation.
    #[error("{entity_type} cannot be listed through {parent}")]
    UnsupportedRelation {
        entity_type: EntityType,
        parent: EntityType,
    },

    /// A referenced entity does not exist.
    #[error("{entity_type} references {target}({id}) which does not exist")]
    InvalidReference {
        entity_type: EntityType,
        target: EntityType,
        id: EntityId,
    },

    /// A related entity was supplied without an identifier.
    #[error("{entity_type} requires {target} to carry an @iot.id")]
    MissingReferenceId {
        entity_type: EntityType,
        target: EntityType,
    },
}

/// Backend failures.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend cannot execute the requested capability.
    #[error("backend '{backend_name}' does not support {capability}")]
    UnsupportedCapability {
        backend_name: String,
        capability: String,
    },

    /// Internal backend failure.
    #[error("backend '{backend_name}' failed: {message}")]
    Internal {
        backend_name: String,
        message: String,
    },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
