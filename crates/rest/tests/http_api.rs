//! End-to-end HTTP tests over the in-memory backend.

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::fixtures;
use common::harness::TestHarness;
use sensorthings_persistence::types::EntityType;

#[tokio::test]
async fn test_observation_derives_and_reuses_feature_of_interest() {
    let harness = TestHarness::new();

    // Location 3 and Datastream 7 under one Thing.
    for name in ["spare a", "spare b"] {
        harness
            .create("Locations", fixtures::location(name, 0.0, 0.0))
            .await;
    }
    let location_id = harness
        .create("Locations", fixtures::location("hilltop", 11.57, 48.14))
        .await;
    assert_eq!(location_id, 3);
    let thing_id = harness
        .create("Things", fixtures::thing_at("mast", &[location_id]))
        .await;
    let mut datastream_id = 0;
    for i in 0..7 {
        datastream_id = harness
            .create("Datastreams", fixtures::datastream(&format!("ds {}", i), thing_id))
            .await;
    }
    assert_eq!(datastream_id, 7);

    let response = harness
        .post("/v1.0/Observations", fixtures::observation(json!(21.5), 7))
        .await;
    response.assert_status(StatusCode::CREATED);
    let first: Value = response.json();

    let feature_id = first["FeatureOfInterest"]["@iot.id"].as_u64().unwrap();
    assert_eq!(first["FeatureOfInterest"]["originLocation@iot.id"], 3);
    assert_eq!(first["FeatureOfInterest"]["name"], "hilltop");

    let stored = harness
        .get(&format!("/v1.0/FeaturesOfInterest({})", feature_id))
        .await;
    stored.assert_status_ok();
    assert_eq!(stored.json::<Value>()["originLocation@iot.id"], 3);

    let response = harness
        .post("/v1.0/Observations", fixtures::observation(json!(22.0), 7))
        .await;
    response.assert_status(StatusCode::CREATED);
    let second: Value = response.json();

    assert_eq!(second["FeatureOfInterest"]["@iot.id"], feature_id);
    assert_eq!(harness.count(EntityType::FeatureOfInterest), 1);
    assert_eq!(harness.count(EntityType::Observation), 2);
}

#[tokio::test]
async fn test_create_returns_location_header() {
    let harness = TestHarness::new();

    let response = harness.post("/v1.0/Things", fixtures::thing("lamp")).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["@iot.selfLink"], "http://localhost:8080/v1.0/Things(1)");
    assert_eq!(
        body["Datastreams@iot.navigationLink"],
        "http://localhost:8080/v1.0/Things(1)/Datastreams"
    );
    assert_eq!(
        response.header("location"),
        "http://localhost:8080/v1.0/Things(1)"
    );
}

#[tokio::test]
async fn test_missing_mandatory_fields_listed() {
    let harness = TestHarness::new();

    let response = harness.post("/v1.0/Locations", json!({"name": "nowhere"})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        body["error"]["message"],
        json!([
            "Missing mandatory parameter: Location.description",
            "Missing mandatory parameter: Location.encodingType",
            "Missing mandatory parameter: Location.location"
        ])
    );
    assert_eq!(harness.backend.write_count(), 0);
}

#[tokio::test]
async fn test_observation_for_unknown_datastream_rejected() {
    let harness = TestHarness::new();
    harness.seed_sensor("mast").await;
    let writes = harness.backend.write_count();

    let response = harness
        .post("/v1.0/Observations", fixtures::observation(json!(1), 42))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(harness.backend.write_count(), writes);
    assert_eq!(harness.count(EntityType::FeatureOfInterest), 0);
}

#[tokio::test]
async fn test_post_observation_under_datastream() {
    let harness = TestHarness::new();
    let (_, _, datastream_id) = harness.seed_sensor("mast").await;

    let response = harness
        .post(
            &format!("/v1.0/Datastreams({})/Observations", datastream_id),
            json!({"result": 12.25}),
        )
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(
        body["Datastream@iot.navigationLink"],
        format!("http://localhost:8080/v1.0/Observations({})/Datastream", body["@iot.id"])
    );

    let listed = harness
        .get(&format!("/v1.0/Datastreams({})/Observations", datastream_id))
        .await;
    listed.assert_status_ok();
    assert_eq!(listed.json::<Value>()["value"][0]["result"], 12.25);
}

#[tokio::test]
async fn test_create_under_other_parent_rejected() {
    let harness = TestHarness::new();
    let (thing_id, _, _) = harness.seed_sensor("mast").await;

    let response = harness
        .post(
            &format!("/v1.0/Things({})/Datastreams", thing_id),
            fixtures::datastream("orphan", thing_id),
        )
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_paths_are_case_insensitive() {
    let harness = TestHarness::new();
    let thing_id = harness.create("Things", fixtures::thing("lamp")).await;

    harness.get("/V1.0/THINGS").await.assert_status_ok();
    let response = harness.get(&format!("/v1.0/things({})", thing_id)).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["name"], "lamp");
}

#[tokio::test]
async fn test_reserved_segment_keeps_case() {
    let harness = TestHarness::new();

    let response = harness.get("/Dashboard/X").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>()["error"]["message"][0],
        "No resource at /Dashboard/X"
    );
}

#[tokio::test]
async fn test_unknown_collection_is_not_found() {
    let harness = TestHarness::new();

    harness.get("/v1.0/Sensors").await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collection_paging_and_next_link() {
    let harness = TestHarness::new();
    for i in 0..12 {
        harness
            .create("Things", fixtures::thing(&format!("thing {}", i)))
            .await;
    }

    let response = harness.get("/v1.0/Things?$count=true").await;
    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["@iot.count"], 12);
    assert_eq!(page["value"].as_array().unwrap().len(), 10);
    assert_eq!(
        page["@iot.nextLink"],
        "http://localhost:8080/v1.0/things?$count=true&$top=10&$skip=10"
    );

    let response = harness.get("/v1.0/Things?$top=5&$skip=10").await;
    let page: Value = response.json();
    assert_eq!(page["value"].as_array().unwrap().len(), 2);
    assert!(page.get("@iot.nextLink").is_none());
    assert_eq!(page["@iot.count"], 12);

    let page: Value = harness.get("/v1.0/Things?$count=false").await.json();
    assert!(page.get("@iot.count").is_none());
}

#[tokio::test]
async fn test_unsupported_query_option_rejected() {
    let harness = TestHarness::new();

    let response = harness.get("/v1.0/Things?$resultFormat=dataArray").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(harness.backend.write_count(), 0);
}

#[tokio::test]
async fn test_select_projects_properties() {
    let harness = TestHarness::new();
    let thing_id = harness.create("Things", fixtures::thing("lamp")).await;

    let response = harness
        .get(&format!("/v1.0/Things({})?$select=id,name", thing_id))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"@iot.id": thing_id, "name": "lamp"})
    );
}

#[tokio::test]
async fn test_data_array_result_format() {
    let harness = TestHarness::new();
    let (_, _, datastream_id) = harness.seed_sensor("mast").await;
    for result in [1.5, 2.5] {
        harness
            .post(
                "/v1.0/Observations",
                fixtures::observation(json!(result), datastream_id),
            )
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = harness
        .get("/v1.0/Observations?$resultFormat=dataArray&$select=id,result")
        .await;

    response.assert_status_ok();
    let page: Value = response.json();
    let group = &page["value"][0];
    assert_eq!(group["components"], json!(["id", "result"]));
    assert_eq!(group["dataArray@iot.count"], 2);
    assert_eq!(group["dataArray"], json!([[1, 1.5], [2, 2.5]]));
    assert_eq!(
        group["Datastream@iot.navigationLink"],
        format!("http://localhost:8080/v1.0/Datastreams({})", datastream_id)
    );
}

#[tokio::test]
async fn test_navigate_to_related_entity() {
    let harness = TestHarness::new();
    let (thing_id, _, datastream_id) = harness.seed_sensor("mast").await;

    let response = harness
        .get(&format!("/v1.0/Datastreams({})/Thing", datastream_id))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["@iot.id"], thing_id);
}

#[tokio::test]
async fn test_patch_and_deep_patch() {
    let harness = TestHarness::new();
    let (thing_id, location_id, _) = harness.seed_sensor("mast").await;
    let path = format!("/v1.0/Things({})", thing_id);

    let response = harness.patch(&path, json!({"name": "renamed"})).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["name"], "renamed");
    assert_eq!(response.json::<Value>()["description"], "mast description");

    let response = harness
        .patch(&path, json!({"Locations": [{"@iot.id": location_id}]}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete() {
    let harness = TestHarness::new();
    let thing_id = harness.create("Things", fixtures::thing("lamp")).await;
    let path = format!("/v1.0/Things({})", thing_id);

    harness.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
    harness.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    harness.delete(&path).await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1.0/Things")
        .content_type("application/json")
        .text("{not json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_service_root() {
    let harness = TestHarness::new();

    let response = harness.get("/v1.0").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let names: Vec<&str> = body["value"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Things", "Locations", "Datastreams", "FeaturesOfInterest", "Observations"]
    );
    assert_eq!(body["value"][0]["url"], "http://localhost:8080/v1.0/Things");
}

#[tokio::test]
async fn test_health() {
    let harness = TestHarness::new();

    let response = harness.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "memory");
    assert_eq!(body["notifications"], false);
}

#[tokio::test]
async fn test_observations_by_feature_of_interest() {
    let harness = TestHarness::new();
    let (_, _, datastream_id) = harness.seed_sensor("mast").await;
    let created: Value = harness
        .post("/v1.0/Observations", fixtures::observation(json!(3.5), datastream_id))
        .await
        .json();
    let feature_id = created["FeatureOfInterest"]["@iot.id"].as_u64().unwrap();

    let response = harness
        .get(&format!("/v1.0/FeaturesOfInterest({})/Observations", feature_id))
        .await;

    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["@iot.count"], 1);
    assert_eq!(page["value"][0]["@iot.id"], created["@iot.id"]);
}

#[tokio::test]
async fn test_thing_deep_inserts_locations() {
    let harness = TestHarness::new();
    let mut body = fixtures::thing("rover");
    body["Locations"] = json!([fixtures::location("landing site", 1.0, 2.0)]);

    let thing_id = harness.create("Things", body).await;

    assert_eq!(harness.count(EntityType::Location), 1);
    let response = harness
        .get(&format!("/v1.0/Things({})/Locations", thing_id))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["value"][0]["name"], "landing site");
}

#[tokio::test]
async fn test_thing_with_incomplete_nested_location_rejected() {
    let harness = TestHarness::new();
    let mut body = fixtures::thing("rover");
    body["Locations"] = json!([
        fixtures::location("landing site", 1.0, 2.0),
        {"name": "bare"}
    ]);

    let response = harness.post("/v1.0/Things", body).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["message"],
        json!([
            "Missing mandatory parameter: Thing.Locations[1].description",
            "Missing mandatory parameter: Thing.Locations[1].encodingType",
            "Missing mandatory parameter: Thing.Locations[1].location"
        ])
    );
    assert_eq!(harness.backend.write_count(), 0);
    assert_eq!(harness.count(EntityType::Location), 0);
    assert_eq!(harness.count(EntityType::Thing), 0);
}

#[tokio::test]
async fn test_patch_and_delete_observation() {
    let harness = TestHarness::new();
    let (_, _, datastream_id) = harness.seed_sensor("mast").await;
    let created: Value = harness
        .post("/v1.0/Observations", fixtures::observation(json!(1.0), datastream_id))
        .await
        .json();
    let path = format!("/v1.0/Observations({})", created["@iot.id"]);

    let response = harness
        .patch(&path, json!({"result": 2.0, "Datastream": {"@iot.id": datastream_id}}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = harness.patch(&path, json!({"result": 2.0})).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["result"], 2.0);

    harness.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
    assert_eq!(harness.count(EntityType::Observation), 0);
}
