//! # HTTP Catalog Provider
//!
//! [`CatalogService`](bridge_traits::CatalogService) backed by a JSON catalog
//! API reached through the host's
//! [`HttpClient`](bridge_traits::HttpClient).
//!
//! - Playback data (playability plus adaptive stream formats) per track
//! - Album and playlist expansion into ordered track references
//! - Retry with exponential backoff on rate limiting, 5xx and transport errors

pub mod connector;
pub mod error;
pub mod types;

pub use connector::CatalogConnector;
pub use error::{CatalogError, Result};
