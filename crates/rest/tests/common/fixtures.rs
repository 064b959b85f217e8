//! Entity bodies for tests.

use serde_json::{Value, json};

/// A Thing with no Locations.
pub fn thing(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "properties": {"deployment": "test"}
    })
}

/// A Thing linked to existing Locations.
pub fn thing_at(name: &str, location_ids: &[u64]) -> Value {
    let mut body = thing(name);
    body["Locations"] = location_ids
        .iter()
        .map(|id| json!({"@iot.id": id}))
        .collect();
    body
}

/// A GeoJSON point Location.
pub fn location(name: &str, lon: f64, lat: f64) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "encodingType": "application/vnd.geo+json",
        "location": {"type": "Point", "coordinates": [lon, lat]}
    })
}

/// A Datastream owned by a Thing.
pub fn datastream(name: &str, thing_id: u64) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "unitOfMeasurement": {
            "name": "degree Celsius",
            "symbol": "degC",
            "definition": "http://unitsofmeasure.org/ucum.html#para-30"
        },
        "observationType": "http://www.opengis.net/def/observationType/OGC-OM/2.0/OM_Measurement",
        "Thing": {"@iot.id": thing_id}
    })
}

/// A FeatureOfInterest body without an id.
pub fn feature_of_interest(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "encodingType": "application/vnd.geo+json",
        "feature": {"type": "Point", "coordinates": [10.0, 50.0]}
    })
}

/// An Observation referencing a Datastream.
pub fn observation(result: Value, datastream_id: u64) -> Value {
    json!({
        "result": result,
        "phenomenonTime": "2024-03-01T12:00:00Z",
        "Datastream": {"@iot.id": datastream_id}
    })
}
