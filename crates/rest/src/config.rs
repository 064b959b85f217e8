//! Server configuration for the SensorThings API.
//!
//! This module provides configuration types for the server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STA_SERVER_PORT` | 8080 | Server port |
//! | `STA_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `STA_LOG_LEVEL` | info | Log level |
//! | `STA_MAX_BODY_SIZE` | 10485760 | Max request body (bytes) |
//! | `STA_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `STA_ENABLE_CORS` | true | Enable CORS |
//! | `STA_CORS_ORIGINS` | * | Allowed origins |
//! | `STA_CORS_METHODS` | GET,POST,PATCH,DELETE,OPTIONS | Allowed methods |
//! | `STA_CORS_HEADERS` | Content-Type,Authorization,Accept | Allowed headers |
//! | `STA_EXTERNAL_URL` | http://localhost:8080 | Base of self and navigation links |
//! | `STA_DEFAULT_PAGE_SIZE` | 100 | `$top` when the client sends none |
//! | `STA_MAX_PAGE_SIZE` | 1000 | Upper bound for `$top` |
//! | `STA_RESERVED_PATH_SEGMENT` | dashboard | Path segment exempt from lower-casing |
//! | `STA_NOTIFICATION_QUEUE_CAPACITY` | 1024 | Pending notifications before new ones are dropped |
//! | `STA_PUBLISHER` | log | Notification publisher (`log` or `none`) |
//!
//! # Example
//!
//! ```rust
//! use sensorthings_rest::ServerConfig;
//!
//! // Create from environment
//! let config = ServerConfig::from_env();
//!
//! // Or create programmatically
//! let config = ServerConfig {
//!     port: 3000,
//!     external_url: "https://sensors.example.org".to_string(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::{Parser, ValueEnum};

/// Where change notifications go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PublisherKind {
    /// Emit each notification as a tracing event.
    #[default]
    Log,
    /// Discard notifications.
    None,
}

/// Server configuration for the SensorThings API.
///
/// This struct can be constructed from environment variables using [`ServerConfig::from_env`],
/// from command line arguments using [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "sensorthings")]
#[command(about = "OGC SensorThings API Server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "STA_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "STA_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "STA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum request body size in bytes.
    #[arg(long, env = "STA_MAX_BODY_SIZE", default_value = "10485760")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "STA_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "STA_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "STA_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(
        long,
        env = "STA_CORS_METHODS",
        default_value = "GET,POST,PATCH,DELETE,OPTIONS"
    )]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "STA_CORS_HEADERS",
        default_value = "Content-Type,Authorization,Accept"
    )]
    pub cors_headers: String,

    /// External base address stamped onto self and navigation links.
    #[arg(long, env = "STA_EXTERNAL_URL", default_value = "http://localhost:8080")]
    pub external_url: String,

    /// Page size used when a request has no `$top`.
    #[arg(long, env = "STA_DEFAULT_PAGE_SIZE", default_value = "100")]
    pub default_page_size: u32,

    /// Maximum page size; larger `$top` values are clamped.
    #[arg(long, env = "STA_MAX_PAGE_SIZE", default_value = "1000")]
    pub max_page_size: u32,

    /// Path segment whose requests keep their original casing.
    #[arg(long, env = "STA_RESERVED_PATH_SEGMENT", default_value = "dashboard")]
    pub reserved_path_segment: String,

    /// Capacity of the outbound notification queue.
    #[arg(long, env = "STA_NOTIFICATION_QUEUE_CAPACITY", default_value = "1024")]
    pub notification_queue_capacity: usize,

    /// Notification publisher.
    #[arg(long, env = "STA_PUBLISHER", value_enum, default_value = "log")]
    pub publisher: PublisherKind,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            max_body_size: 10 * 1024 * 1024, // 10MB
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,PATCH,DELETE,OPTIONS".to_string(),
            cors_headers: "Content-Type,Authorization,Accept".to_string(),
            external_url: "http://localhost:8080".to_string(),
            default_page_size: 100,
            max_page_size: 1000,
            reserved_path_segment: "dashboard".to_string(),
            notification_queue_capacity: 1024,
            publisher: PublisherKind::Log,
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// This is a convenience method that parses environment variables without
    /// requiring command line arguments.
    pub fn from_env() -> Self {
        // Try to parse from environment, falling back to defaults
        Self::try_parse_from(["sensorthings"]).unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the external base address without a trailing slash.
    pub fn external_url(&self) -> &str {
        self.external_url.trim_end_matches('/')
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if url::Url::parse(&self.external_url).is_err() {
            errors.push(format!("External URL '{}' is not a valid URL", self.external_url));
        }

        if self.reserved_path_segment.is_empty() || self.reserved_path_segment.contains('/') {
            errors.push("Reserved path segment must be a single non-empty segment".to_string());
        }

        if self.notification_queue_capacity == 0 {
            errors.push("Notification queue capacity cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// This uses ephemeral port 0 and disables features that might interfere
    /// with tests.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            log_level: "debug".to_string(),
            request_timeout: 5, // Shorter timeout for tests
            enable_cors: false,
            cors_methods: "*".to_string(),
            cors_headers: "*".to_string(),
            external_url: "http://localhost:8080".to_string(),
            default_page_size: 10,
            max_page_size: 100,
            notification_queue_capacity: 64,
            publisher: PublisherKind::None,
            ..Default::default()
        }
    }
}
