//! # Core Configuration Module
//!
//! Configuration for a playback core instance.
//!
//! ## Overview
//!
//! [`CoreConfigBuilder`] collects paths, host bridges and tuning knobs and
//! produces a [`CoreConfig`]. Validation is fail-fast: a missing bridge is
//! reported as [`Error::CapabilityMissing`] with a message that tells the
//! host what to inject, before any task is spawned.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - user preferences (auto-add toggle)
//! - `NetworkMonitor` - metered detection for stream selection
//! - A catalog: either a ready `CatalogService`, or an `HttpClient` plus a
//!   catalog base URL from which the HTTP catalog is built
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/data/library.db")
//!     .downloads_dir("/data/downloads")
//!     .settings_store(Arc::new(MySettings))
//!     .network_monitor(Arc::new(MyMonitor))
//!     .http_client(Arc::new(MyHttpClient))
//!     .catalog_base_url("https://catalog.example.com")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{CatalogService, HttpClient, NetworkMonitor, SettingsStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Default number of remaining entries below which the next page is fetched.
pub const DEFAULT_REFILL_THRESHOLD: usize = 6;

/// Default capacity of the outbound event bus.
pub const DEFAULT_EVENT_BUFFER: usize = 100;

/// Core configuration for a playback session.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite library database
    pub database_path: PathBuf,

    /// Directory downloaded tracks are stored in
    pub downloads_dir: PathBuf,

    /// Base URL for the HTTP catalog; ignored when `catalog` is provided
    pub catalog_base_url: Option<String>,

    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Pre-built catalog; takes precedence over the HTTP catalog
    pub catalog: Option<Arc<dyn CatalogService>>,

    pub settings_store: Arc<dyn SettingsStore>,

    pub network_monitor: Arc<dyn NetworkMonitor>,

    /// Remaining-entry count that triggers pagination
    pub refill_threshold: usize,

    /// Capacity of the broadcast event bus
    pub event_buffer: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("downloads_dir", &self.downloads_dir)
            .field("catalog_base_url", &self.catalog_base_url)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "catalog",
                &self.catalog.as_ref().map(|_| "CatalogService { ... }"),
            )
            .field("settings_store", &"SettingsStore { ... }")
            .field("network_monitor", &"NetworkMonitor { ... }")
            .field("refill_threshold", &self.refill_threshold)
            .field("event_buffer", &self.event_buffer)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// Checks that paths are non-empty, the knobs are in range and that a
    /// catalog can be obtained.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.downloads_dir.as_os_str().is_empty() {
            return Err(Error::Config(
                "Downloads directory cannot be empty".to_string(),
            ));
        }

        if self.refill_threshold == 0 {
            return Err(Error::Config(
                "Refill threshold must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer == 0 {
            return Err(Error::Config(
                "Event buffer must hold at least one event".to_string(),
            ));
        }

        if self.catalog.is_none() {
            if self.http_client.is_none() {
                return Err(catalog_missing_error());
            }
            match self.catalog_base_url.as_deref() {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                Some(url) => {
                    return Err(Error::Config(format!(
                        "Catalog base URL must be http(s), got '{}'",
                        url
                    )))
                }
                None => return Err(catalog_missing_error()),
            }
        }

        Ok(())
    }
}

fn catalog_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "CatalogService".to_string(),
        message: "No catalog available for stream resolution. \
                  Inject a CatalogService, or provide both an HttpClient and a catalog base URL."
            .to_string(),
    }
}

fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for user preferences \
                  such as automatic library adds."
            .to_string(),
    }
}

fn network_monitor_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "NetworkMonitor".to_string(),
        message: "NetworkMonitor implementation is required to pick stream bitrates \
                  on metered connections."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    downloads_dir: Option<PathBuf>,
    catalog_base_url: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    catalog: Option<Arc<dyn CatalogService>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    refill_threshold: Option<usize>,
    event_buffer: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the library database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .database_path("/path/to/library.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the directory downloaded tracks resolve into.
    pub fn downloads_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.downloads_dir = Some(path.into());
        self
    }

    pub fn catalog_base_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_base_url = Some(url.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Injects a ready catalog, bypassing the HTTP catalog.
    pub fn catalog(mut self, catalog: Arc<dyn CatalogService>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    pub fn refill_threshold(mut self, threshold: usize) -> Self {
        self.refill_threshold = Some(threshold);
        self
    }

    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = Some(capacity);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let downloads_dir = self.downloads_dir.ok_or_else(|| {
            Error::Config(
                "Downloads directory is required. Use .downloads_dir() to set it.".to_string(),
            )
        })?;

        let settings_store = self
            .settings_store
            .ok_or_else(settings_store_missing_error)?;
        let network_monitor = self
            .network_monitor
            .ok_or_else(network_monitor_missing_error)?;

        let config = CoreConfig {
            database_path,
            downloads_dir,
            catalog_base_url: self.catalog_base_url,
            http_client: self.http_client,
            catalog: self.catalog,
            settings_store,
            network_monitor,
            refill_threshold: self.refill_threshold.unwrap_or(DEFAULT_REFILL_THRESHOLD),
            event_buffer: self.event_buffer.unwrap_or(DEFAULT_EVENT_BUFFER),
        };

        config.validate()?;

        Ok(config)
    }
}
