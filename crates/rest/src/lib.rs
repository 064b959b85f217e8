//! # sensorthings-rest - OGC SensorThings API resource layer
//!
//! This crate serves the SensorThings entities (Things, Locations,
//! Datastreams, FeaturesOfInterest, Observations) over HTTP and holds the
//! orchestration logic between requests and storage.
//!
//! ## Features
//!
//! - **Query options**: `$top`, `$skip`, `$count`, `$select`, `$orderby`, and
//!   `$resultFormat=dataArray` for Observations, checked per entity type
//! - **Pagination**: `@iot.count` and `@iot.nextLink` on every collection
//! - **Observation ingestion**: FeatureOfInterest derived from the Thing's
//!   Location when omitted, deep insert when supplied without an id
//! - **Notifications**: fire-and-forget, via a bounded queue and a background worker
//! - **Case-insensitive paths**: request paths are lower-cased before routing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sensorthings_rest::{create_app_with_config, ServerConfig};
//! use sensorthings_persistence::backends::memory::InMemoryBackend;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!     let app = create_app_with_config(InMemoryBackend::new(), config);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Interaction | HTTP Method | URL Pattern |
//! |------------|-------------|-------------|
//! | service root | GET | `/v1.0` |
//! | read collection | GET | `/v1.0/[Collection]` |
//! | read entity | GET | `/v1.0/[Collection]([id])` |
//! | navigate | GET | `/v1.0/[Collection]([id])/[Navigation]` |
//! | create | POST | `/v1.0/[Collection]` |
//! | create Observation in Datastream | POST | `/v1.0/Datastreams([id])/Observations` |
//! | patch | PATCH | `/v1.0/[Collection]([id])` |
//! | delete | DELETE | `/v1.0/[Collection]([id])` |
//! | health | GET | `/health` |
//!
//! ## Error Handling
//!
//! Errors are returned as JSON documents, see [`error`].
//!
//! ## Architecture
//!
//! - [`api`] - the orchestration layer
//! - [`notifications`] - notification queue and publishers
//! - [`error`] - error types and HTTP mapping
//! - [`config`] - server configuration
//! - [`state`] - application state
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - path normalization
//! - [`extractors`] - query options, bodies and path segments
//! - [`responses`] - projection, data arrays and created responses
//! - [`routing`] - route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod responses;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use api::SensorThingsApi;
pub use config::ServerConfig;
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware::from_fn_with_state};
use sensorthings_persistence::core::SensorThingsStorage;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::middleware::{ReservedSegment, normalize_path_case};
use crate::notifications::Notifier;

/// Creates the Axum application with default configuration.
///
/// Must be called from within a Tokio runtime; the notification worker is
/// spawned here.
pub fn create_app<S>(storage: S) -> Router
where
    S: SensorThingsStorage,
{
    create_app_with_config(storage, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// The notifier is built from `config.publisher`. Must be called from within
/// a Tokio runtime.
///
/// # Example
///
/// ```rust,ignore
/// use sensorthings_rest::{create_app_with_config, ServerConfig};
/// use sensorthings_persistence::backends::memory::InMemoryBackend;
///
/// let config = ServerConfig {
///     external_url: "https://sensors.example.org".to_string(),
///     ..Default::default()
/// };
/// let app = create_app_with_config(InMemoryBackend::new(), config);
/// ```
pub fn create_app_with_config<S>(storage: S, config: ServerConfig) -> Router
where
    S: SensorThingsStorage,
{
    let notifier = Notifier::from_kind(config.publisher, config.notification_queue_capacity);
    create_app_with_notifier(Arc::new(storage), config, notifier)
}

/// Creates the Axum application with a caller-supplied notifier.
///
/// Useful for embedding and tests that subscribe to notifications.
pub fn create_app_with_notifier<S>(storage: Arc<S>, config: ServerConfig, notifier: Notifier) -> Router
where
    S: SensorThingsStorage,
{
    info!(
        backend = storage.backend_name(),
        external_url = %config.external_url(),
        notifications = notifier.is_enabled(),
        "Creating SensorThings API server"
    );

    let state = AppState::new(storage, config.clone(), notifier);
    let router = routing::create_routes(state).layer(DefaultBodyLimit::max(config.max_body_size));

    // Path normalization must see the request before route matching.
    let reserved = ReservedSegment::new(config.reserved_path_segment.as_str());
    let router = Router::new()
        .fallback_service(router)
        .layer(from_fn_with_state(reserved, normalize_path_case));

    // Build middleware stack
    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    // Add CORS if enabled
    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    fn list<T: std::str::FromStr>(value: &str) -> Vec<T> {
        value
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect()
    }

    let mut cors = CorsLayer::new();

    cors = if config.cors_origins == "*" {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(list::<axum::http::HeaderValue>(&config.cors_origins))
    };

    cors = if config.cors_methods == "*" {
        cors.allow_methods(Any)
    } else {
        cors.allow_methods(list::<axum::http::Method>(&config.cors_methods))
    };

    cors = if config.cors_headers == "*" {
        cors.allow_headers(Any)
    } else {
        cors.allow_headers(list::<axum::http::HeaderName>(&config.cors_headers))
    };

    cors.expose_headers([axum::http::header::LOCATION])
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` takes
/// precedence over `level`.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "sensorthings_rest={level},sensorthings_persistence={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
