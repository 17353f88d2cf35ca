use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Network transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// `true` when the failure happened before a response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, BridgeError::Transport(_) | BridgeError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
