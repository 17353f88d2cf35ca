//! # Playback Error Types
//!
//! Errors raised while resolving media, paging the queue and handling
//! session commands.

use core_library::LibraryError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// The catalog refused to stream the track (status other than `OK`).
    #[error("Stream unavailable: {status}")]
    StreamUnavailable { status: String },

    /// The track is playable but offers no audio-only format.
    #[error("No stream available")]
    NoStreamAvailable,

    /// The catalog could not be reached while resolving a track.
    #[error("Failed to resolve stream: {0}")]
    ResolutionNetworkFailure(String),

    // ========================================================================
    // Queue Errors
    // ========================================================================
    /// Fetching the initial status or a further page failed.
    #[error("Queue pagination failed: {0}")]
    PaginationFailure(String),

    /// A session command was refused without touching the queue.
    #[error("Command rejected: {0}")]
    CommandRejected(String),

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    /// Catalog answered, but with an error that is not a transport failure.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The host engine rejected a control call.
    #[error("Engine error: {0}")]
    Engine(String),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    #[error("Playback session released")]
    SessionReleased,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::ResolutionNetworkFailure(_)
                | PlaybackError::PaginationFailure(_)
                | PlaybackError::Catalog(_)
        )
    }

    /// Returns `true` if the error concerns a single track and the rest of
    /// the queue stays playable.
    pub fn is_per_track(&self) -> bool {
        matches!(
            self,
            PlaybackError::StreamUnavailable { .. }
                | PlaybackError::NoStreamAvailable
                | PlaybackError::ResolutionNetworkFailure(_)
                | PlaybackError::Catalog(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
