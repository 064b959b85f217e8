//! `$select` projection.

use serde_json::{Map, Value};

/// Keeps only the listed top-level properties.
///
/// `id` selects `@iot.id`. Unknown names are ignored.
pub fn project(value: Value, properties: &[String]) -> Value {
    let Value::Object(object) = value else {
        return value;
    };

    let result: Map<String, Value> = object
        .into_iter()
        .filter(|(key, _)| properties.iter().any(|p| matches(p, key)))
        .collect();
    Value::Object(result)
}

fn matches(property: &str, key: &str) -> bool {
    property == key || (property == "id" && key == "@iot.id")
}
