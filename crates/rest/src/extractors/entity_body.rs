//! Entity body extractor.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RestError, RestResult};

/// Axum extractor for a JSON entity body.
///
/// The body must be a JSON object. Which entity it describes depends on the
/// request path, so typing is deferred to [`EntityBody::into_entity`].
#[derive(Debug, Clone)]
pub struct EntityBody(pub Value);

impl EntityBody {
    /// Deserializes the body into an entity struct.
    pub fn into_entity<E: DeserializeOwned>(self) -> RestResult<E> {
        Ok(serde_json::from_value(self.0)?)
    }

    /// Returns a reference to the inner Value.
    pub fn inner(&self) -> &Value {
        &self.0
    }
}

impl<S> FromRequest<S> for EntityBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| RestError::BadRequest {
                message: format!("Unable to read request body: {}", e),
            })?;

        if bytes.is_empty() {
            return Err(RestError::BadRequest {
                message: "Request body must be a JSON object".to_string(),
            });
        }

        let value: Value = serde_json::from_slice(&bytes)?;
        if !value.is_object() {
            return Err(RestError::BadRequest {
                message: "Request body must be a JSON object".to_string(),
            });
        }

        Ok(EntityBody(value))
    }
}
