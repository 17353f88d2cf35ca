//! # Host Bridge Traits
//!
//! Capability contracts the playback core consumes but does not implement.
//!
//! ## Overview
//!
//! Each trait represents something the host application (desktop shell,
//! mobile wrapper, test harness) must hand to the core. The core never talks
//! to the network, the OS connectivity APIs or the preference store directly;
//! it goes through these seams so every collaborator can be swapped for a
//! fake in tests.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP transport used by the catalog provider
//! - [`NetworkMonitor`](network::NetworkMonitor) - Connectivity and metered network detection
//!
//! ### Remote catalog
//! - [`CatalogService`](catalog::CatalogService) - Playback data and grouping expansion
//!
//! ### Preferences
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform-specific failures into it with an actionable
//! message.
//!
//! ## Thread Safety
//!
//! Every bridge trait requires `Send + Sync`; handles are shared as
//! `Arc<dyn Trait>` across the session's async tasks.

pub mod catalog;
pub mod error;
pub mod http;
pub mod network;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use catalog::{
    CatalogItem, CatalogService, PlayabilityStatus, PlaybackData, StreamFormat, TrackReference,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use network::{NetworkInfo, NetworkMonitor, NetworkStatus, NetworkType};
pub use storage::SettingsStore;
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
