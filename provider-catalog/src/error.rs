//! Error types for the HTTP catalog

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog answered with a non-success status
    #[error("Catalog API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by catalog after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Failed to parse catalog response: {0}")]
    ParseError(String),

    /// No response was received
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl From<CatalogError> for BridgeError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NetworkError(msg) => BridgeError::Transport(msg),
            CatalogError::Bridge(inner) => inner,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}
