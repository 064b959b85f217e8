//! Query option extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use sensorthings_persistence::types::QueryOptions;

use crate::error::RestError;

/// Axum extractor for the system query options of a request.
///
/// Unknown `$` options, duplicates and malformed values are rejected with
/// `400 Bad Request`. Whether an option is allowed for the addressed entity
/// type is checked later by the API layer.
///
/// # Example
///
/// ```rust,ignore
/// use sensorthings_rest::extractors::ODataQuery;
///
/// async fn list_handler(ODataQuery(options): ODataQuery) {
///     let top = options.top;
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ODataQuery(pub QueryOptions);

impl ODataQuery {
    /// Consumes the extractor and returns the options.
    pub fn into_inner(self) -> QueryOptions {
        self.0
    }
}

impl<S> FromRequestParts<S> for ODataQuery
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or("");
        Ok(ODataQuery(QueryOptions::parse(query)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(uri: &str) -> Result<ODataQuery, RestError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        ODataQuery::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_options() {
        let ODataQuery(options) = extract("/v1.0/things?$top=5&$count=false").await.unwrap();
        assert_eq!(options.top, Some(5));
        assert_eq!(options.count, Some(false));
    }

    #[tokio::test]
    async fn test_no_query_is_empty() {
        let ODataQuery(options) = extract("/v1.0/things").await.unwrap();
        assert!(options.requested().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_option_rejected() {
        let err = extract("/v1.0/things?$bogus=1").await.unwrap_err();
        assert!(matches!(err, RestError::BadRequest { .. }));
    }
}
