//! # Event Bus System
//!
//! Outbound notifications from the playback core, carried over
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The bus is how hosts (UI, remote controllers, analytics) observe what the
//! core did without being on its call paths:
//! - **Event Types**: [`CoreEvent`] wrapping one enum per domain
//! - **EventBus**: cloneable broadcast sender
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ```text
//! ┌──────────────────┐  emit   ┌──────────┐ subscribe ┌────────────┐
//! │ QueueController  ├────────>│          ├──────────>│ Host UI    │
//! ├──────────────────┤         │ EventBus │           └────────────┘
//! │ Session / Curator├────────>│          ├──────────>┌────────────┐
//! └──────────────────┘         └──────────┘           │ Telemetry  │
//!                                                     └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, QueueEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Queue(QueueEvent::Installed {
//!     generation: 1,
//!     item_count: 3,
//!     start_index: 0,
//! }))
//! .ok();
//!
//! assert!(matches!(rx.recv().await, Ok(CoreEvent::Queue(_))));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! `emit` fails only when nobody is subscribed; publishers ignore that.
//! Slow subscribers see `RecvError::Lagged(n)` and may keep reading;
//! `RecvError::Closed` means the session is gone.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Queue(QueueEvent),
    Library(LibraryEvent),
    Session(SessionEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Queue(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Session(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Session(SessionEvent::PlaybackError {
                recoverable: false, ..
            }) => EventSeverity::Error,
            CoreEvent::Session(SessionEvent::PlaybackError { .. })
            | CoreEvent::Queue(QueueEvent::PaginationFailed { .. })
            | CoreEvent::Library(LibraryEvent::AddFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Library(LibraryEvent::TrackAdded { .. })
            | CoreEvent::Queue(QueueEvent::Installed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Queue Events
// ============================================================================

/// Queue installation and pagination.
///
/// `generation` identifies the installation; it increases by one on every
/// `play_queue` so subscribers can ignore stale notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum QueueEvent {
    /// A new queue replaced the previous one.
    Installed {
        generation: u64,
        item_count: usize,
        start_index: usize,
    },
    /// The provider's next page was appended.
    PageAppended {
        generation: u64,
        added: usize,
        total: usize,
    },
    /// Fetching the next page failed; the queue is unchanged.
    PaginationFailed { generation: u64, message: String },
    /// Entries were inserted by a command or an add request.
    ItemsInserted { index: usize, count: usize },
}

impl QueueEvent {
    fn description(&self) -> &str {
        match self {
            QueueEvent::Installed { .. } => "Queue installed",
            QueueEvent::PageAppended { .. } => "Queue page appended",
            QueueEvent::PaginationFailed { .. } => "Queue pagination failed",
            QueueEvent::ItemsInserted { .. } => "Queue items inserted",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// What caused a library write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddTrigger {
    /// Played through while auto-add was enabled.
    AutoCurated,
    /// Explicit add-to-library command.
    Manual,
}

/// Local library changes made by the playback core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    TrackAdded {
        track_id: String,
        title: String,
        artist: Option<String>,
        trigger: AddTrigger,
    },
    AddFailed { track_id: String, message: String },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::TrackAdded { .. } => "Track added to library",
            LibraryEvent::AddFailed { .. } => "Track could not be added to library",
        }
    }
}

// ============================================================================
// Session Events
// ============================================================================

/// Session-level notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// The engine failed to load an entry. Playback is not skipped; the
    /// host decides whether to retry with a prepare command.
    PlaybackError {
        track_id: Option<String>,
        message: String,
        recoverable: bool,
    },
    /// A remote command was rejected without mutating the queue.
    CommandRejected { command: String, reason: String },
    /// The session released its engine and stopped its tasks.
    Released,
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::PlaybackError { .. } => "Playback error",
            SessionEvent::CommandRejected { .. } => "Command rejected",
            SessionEvent::Released => "Session released",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for [`CoreEvent`]s.
///
/// Cloning is cheap; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// `capacity` is the number of events buffered per subscriber before it
    /// starts lagging.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates an independent receiver for all future events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let queue_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Queue(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once every sender is gone.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Receives without waiting; `None` when nothing is buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
