//! Compact `dataArray` rendering of Observations.
//!
//! ```json
//! {
//!   "Datastream@iot.navigationLink": "http://host/v1.0/Datastreams(7)",
//!   "components": ["id", "phenomenonTime", "result"],
//!   "dataArray@iot.count": 2,
//!   "dataArray": [[1, "2024-01-01T00:00:00Z", 21.5], [2, "2024-01-01T00:01:00Z", 21.7]]
//! }
//! ```

use sensorthings_persistence::types::{EntityId, EntityType, self_link};
use serde_json::{Value, json};

/// Components used when the request has no `$select`.
pub const DEFAULT_COMPONENTS: &[&str] = &[
    "id",
    "phenomenonTime",
    "result",
    "resultTime",
    "parameters",
];

/// Groups serialized Observations by Datastream.
///
/// Groups appear in order of their first Observation and keep the order of
/// the Observations within them.
pub fn group(observations: Vec<Value>, select: Option<&[String]>, base_url: &str) -> Vec<Value> {
    let components: Vec<String> = match select {
        Some(properties) if !properties.is_empty() => properties.to_vec(),
        _ => DEFAULT_COMPONENTS.iter().map(|c| c.to_string()).collect(),
    };

    let mut groups: Vec<(Option<EntityId>, Vec<Value>)> = Vec::new();
    for observation in observations {
        let datastream_id = datastream_id(&observation);
        let row = Value::Array(
            components
                .iter()
                .map(|component| component_value(&observation, component))
                .collect(),
        );
        match groups.iter_mut().find(|(id, _)| *id == datastream_id) {
            Some((_, rows)) => rows.push(row),
            None => groups.push((datastream_id, vec![row])),
        }
    }

    groups
        .into_iter()
        .map(|(datastream_id, rows)| {
            let mut group = json!({
                "components": components,
                "dataArray@iot.count": rows.len(),
                "dataArray": rows,
            });
            if let Some(id) = datastream_id {
                group["Datastream@iot.navigationLink"] =
                    Value::String(self_link(base_url, EntityType::Datastream, id));
            }
            group
        })
        .collect()
}

fn datastream_id(observation: &Value) -> Option<EntityId> {
    observation
        .get("Datastream")
        .and_then(|datastream| datastream.get("@iot.id"))
        .and_then(|id| serde_json::from_value(id.clone()).ok())
}

fn component_value(observation: &Value, component: &str) -> Value {
    let key = if component == "id" { "@iot.id" } else { component };
    observation.get(key).cloned().unwrap_or(Value::Null)
}
