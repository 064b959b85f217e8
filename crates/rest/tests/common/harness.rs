//! REST API test harness.
//!
//! Runs the full application, middleware included, over an in-memory
//! backend that stays reachable for direct inspection.

use std::sync::Arc;

use axum_test::{TestResponse, TestServer};
use sensorthings_persistence::backends::memory::InMemoryBackend;
use sensorthings_persistence::types::EntityType;
use serde_json::Value;

use sensorthings_rest::notifications::Notifier;
use sensorthings_rest::{ServerConfig, create_app_with_notifier};

use super::fixtures;

/// Test harness for REST API testing.
///
/// # Example
///
/// ```rust,ignore
/// let harness = TestHarness::new();
/// let thing_id = harness.create("Things", fixtures::thing("lamp")).await;
/// harness.get(&format!("/v1.0/Things({})", thing_id)).await.assert_status_ok();
/// ```
pub struct TestHarness {
    /// The test server instance.
    pub server: TestServer,

    /// The storage backend.
    pub backend: Arc<InMemoryBackend>,

    /// Server configuration.
    pub config: ServerConfig,
}

impl TestHarness {
    /// Creates a harness with notifications disabled.
    pub fn new() -> Self {
        Self::with_notifier(Notifier::disabled())
    }

    /// Creates a harness that publishes through `notifier`.
    pub fn with_notifier(notifier: Notifier) -> Self {
        Self::with_config(ServerConfig::for_testing(), notifier)
    }

    /// Creates a harness with a custom configuration.
    pub fn with_config(config: ServerConfig, notifier: Notifier) -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        let app = create_app_with_notifier(Arc::clone(&backend), config.clone(), notifier);
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            backend,
            config,
        }
    }

    /// Makes a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.server.get(path).await
    }

    /// Makes a POST request with a JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.server.post(path).json(&body).await
    }

    /// Makes a PATCH request with a JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> TestResponse {
        self.server.patch(path).json(&body).await
    }

    /// Makes a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.server.delete(path).await
    }

    /// Creates an entity through `POST /v1.0/{collection}` and returns its id.
    pub async fn create(&self, collection: &str, body: Value) -> u64 {
        let response = self.post(&format!("/v1.0/{}", collection), body).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["@iot.id"]
            .as_u64()
            .expect("created entity has an id")
    }

    /// Seeds a Thing at one new Location with one Datastream.
    ///
    /// Returns `(thing_id, location_id, datastream_id)`.
    pub async fn seed_sensor(&self, name: &str) -> (u64, u64, u64) {
        let location_id = self
            .create("Locations", fixtures::location(name, 8.68, 49.41))
            .await;
        let thing_id = self
            .create("Things", fixtures::thing_at(name, &[location_id]))
            .await;
        let datastream_id = self
            .create("Datastreams", fixtures::datastream(name, thing_id))
            .await;
        (thing_id, location_id, datastream_id)
    }

    /// Returns the number of stored entities of a type.
    pub fn count(&self, entity_type: EntityType) -> usize {
        self.backend.count(entity_type)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
