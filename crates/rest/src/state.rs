//! Application state for the SensorThings API.
//!
//! The state handed to every handler: the orchestration layer (which owns the
//! storage handle and the notifier) and the server configuration.

use std::sync::Arc;

use sensorthings_persistence::core::SensorThingsStorage;

use crate::api::{ApiSettings, SensorThingsApi};
use crate::config::ServerConfig;
use crate::notifications::Notifier;

/// Shared application state for the REST API.
///
/// # Type Parameters
///
/// * `S` - The storage backend type (must implement [`SensorThingsStorage`])
///
/// # Example
///
/// ```rust,ignore
/// use sensorthings_rest::{AppState, ServerConfig};
/// use sensorthings_rest::notifications::Notifier;
/// use sensorthings_persistence::backends::memory::InMemoryBackend;
/// use std::sync::Arc;
///
/// let state = AppState::new(
///     Arc::new(InMemoryBackend::new()),
///     ServerConfig::default(),
///     Notifier::disabled(),
/// );
/// ```
pub struct AppState<S> {
    api: SensorThingsApi<S>,
    config: Arc<ServerConfig>,
}

// S sits behind an Arc and need not be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: SensorThingsStorage> AppState<S> {
    /// Creates a new AppState with the given storage, configuration and notifier.
    pub fn new(storage: Arc<S>, config: ServerConfig, notifier: Notifier) -> Self {
        let api = SensorThingsApi::new(storage, ApiSettings::from_config(&config), notifier);
        Self {
            api,
            config: Arc::new(config),
        }
    }

    /// Returns the orchestration layer.
    pub fn api(&self) -> &SensorThingsApi<S> {
        &self.api
    }

    /// Returns a reference to the storage backend.
    pub fn storage(&self) -> &S {
        self.api.storage()
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the external base address.
    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Returns the absolute address of a request path.
    pub fn request_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}
