//! The resource orchestration layer.
//!
//! [`SensorThingsApi`] sits between the HTTP handlers and the storage backend.
//! It checks query options against the addressed entity type, windows and
//! links collection results, enforces cross-entity write rules, and queues
//! change notifications once a write has been persisted.
//!
//! - [`options`] - per-entity query option whitelist check
//! - [`links`] - `@iot.nextLink` construction
//! - [`facade`] - read, create, patch and delete for every entity type
//! - [`feature_of_interest`] - FeatureOfInterest derivation from a Thing's Location
//! - [`observation`] - the Observation write path

pub mod facade;
pub mod feature_of_interest;
pub mod links;
pub mod observation;
pub mod options;

pub use facade::CollectionPage;
pub use feature_of_interest::ResolveError;
pub use links::build_next_link;
pub use options::check_supported;

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::notifications::Notifier;

/// Values the orchestration layer needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// External base address, without a trailing slash.
    pub external_url: String,
    /// `$top` applied when a request has none.
    pub default_page_size: u32,
    /// Upper bound for `$top`.
    pub max_page_size: u32,
}

impl ApiSettings {
    /// Extracts the settings from a server configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            external_url: config.external_url().to_string(),
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// Entry point of the orchestration layer.
///
/// Holds the storage handle, settings and notifier explicitly; nothing is
/// read from process state once it is built.
pub struct SensorThingsApi<S> {
    storage: Arc<S>,
    settings: Arc<ApiSettings>,
    notifier: Notifier,
}

impl<S> Clone for SensorThingsApi<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            settings: Arc::clone(&self.settings),
            notifier: self.notifier.clone(),
        }
    }
}

impl<S> SensorThingsApi<S> {
    /// Creates the layer over a storage backend.
    pub fn new(storage: Arc<S>, settings: ApiSettings, notifier: Notifier) -> Self {
        Self {
            storage,
            settings: Arc::new(settings),
            notifier,
        }
    }

    /// Returns the storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the settings.
    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Returns the notification handle.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Returns the external base address.
    pub fn base_url(&self) -> &str {
        &self.settings.external_url
    }
}
