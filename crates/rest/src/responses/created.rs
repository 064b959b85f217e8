//! `201 Created` responses.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Builds a `201 Created` response whose `Location` is the entity's self link.
pub fn created_response(body: Value) -> Response {
    let mut headers = HeaderMap::new();
    if let Some(location) = body
        .get("@iot.selfLink")
        .and_then(|link| link.as_str())
        .and_then(|link| HeaderValue::from_str(link).ok())
    {
        headers.insert(header::LOCATION, location);
    }
    (StatusCode::CREATED, headers, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_from_self_link() {
        let response = created_response(json!({
            "@iot.id": 1,
            "@iot.selfLink": "http://localhost:8080/v1.0/Things(1)"
        }));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "http://localhost:8080/v1.0/Things(1)"
        );
    }

    #[test]
    fn test_no_location_without_self_link() {
        let response = created_response(json!({}));
        assert!(response.headers().get(header::LOCATION).is_none());
    }
}
