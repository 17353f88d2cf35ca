//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the playback crates:
//! - Logging and tracing initialisation
//! - Configuration with fail-fast bridge validation
//! - The outbound event bus
//!
//! Nothing here knows about queues or tracks; the crates above publish their
//! own event payloads through [`events::CoreEvent`].

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
