//! # Engine Events
//!
//! Notifications pushed by the host engine into the session.
//!
//! The engine's callbacks must never block, so they only hand a
//! [`PlaybackEvent`] to an [`EngineEventSender`]; the session's dispatcher
//! task drains the matching [`EngineEventReceiver`] and routes each event to
//! the queue controller and the library curator.

use bridge_traits::TrackReference;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::trace;

/// Why the engine moved to another entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// The previous entry finished and playback advanced.
    Auto,
    /// The same entry started again.
    Repeat,
    Seek,
    /// The entry list changed under the engine.
    QueueChanged,
}

/// Why the playback position jumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscontinuityReason {
    /// The previous entry played to its end.
    AutoTransition,
    Seek,
    /// The active entry was removed.
    Remove,
    Skip,
    Internal,
}

/// Engine playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Nothing prepared, or released.
    #[default]
    Idle,
    Buffering,
    Ready,
    /// Played past the last entry.
    Ended,
}

/// Snapshot of a playback position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub index: usize,
    /// Metadata of the entry at `index`, if there was one.
    pub track: Option<TrackReference>,
    /// Engine-reported duration of that entry; `None` when unknown.
    pub duration: Option<Duration>,
}

impl PositionInfo {
    pub fn new(index: usize, track: Option<TrackReference>) -> Self {
        Self {
            index,
            track,
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Event reported by the host engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    ItemTransition {
        reason: TransitionReason,
    },
    PositionDiscontinuity {
        reason: DiscontinuityReason,
        old: PositionInfo,
        new: PositionInfo,
    },
    StateChanged {
        state: EngineState,
        /// Active entry when the state changed. Engines should fill this in
        /// for [`EngineState::Ended`]; without it the entry is read back from
        /// the engine when the event is handled.
        #[serde(default)]
        current: Option<PositionInfo>,
    },
    /// An entry failed to load, typically because its source could not be
    /// resolved.
    PlayerError {
        track_id: Option<String>,
        message: String,
        recoverable: bool,
    },
}

/// Non-blocking handle the engine's callbacks push events through.
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    sender: mpsc::UnboundedSender<PlaybackEvent>,
}

/// Receiving half, owned by the session's dispatcher.
pub type EngineEventReceiver = mpsc::UnboundedReceiver<PlaybackEvent>;

impl EngineEventSender {
    /// Creates a connected sender/receiver pair.
    pub fn channel() -> (Self, EngineEventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queues an event for the dispatcher.
    ///
    /// Returns `false` once the session is gone; the event is dropped.
    pub fn send(&self, event: PlaybackEvent) -> bool {
        match self.sender.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                trace!(?event, "Engine event dropped, session closed");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
