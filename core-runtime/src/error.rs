//! Runtime errors: configuration and logging setup.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is missing or out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required host bridge was not injected.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The global subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
