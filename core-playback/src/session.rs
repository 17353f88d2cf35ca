//! # Session Command Bridge
//!
//! Translates remote-controller commands into queue and engine operations.
//!
//! ## Protocol
//!
//! Commands arrive either as [`Command`] values or as raw JSON requests of
//! the form `{"command": "<name>", "extras": {...}}`. Every command is
//! answered with a [`CommandAck`]: `NotHandled` tells the host to pass the
//! request on to whatever else it routes commands to.
//!
//! | command              | extras                          |
//! |----------------------|---------------------------------|
//! | `seek_to_queue_item` | `media_id`                      |
//! | `play_next`          | `songs: [TrackReference]`       |
//! | `add_to_queue`       | `songs: [TrackReference]`       |
//! | `move_item`          | `from`, `to`                    |
//! | `add_item`           | `item: TrackReference`, `index?`|
//! | `remove_item`        | `media_id`                      |
//! | `add_to_library`     | none                            |
//! | `prepare`            | `play_when_ready`               |
//!
//! Mutations that change upcoming entries re-prepare the engine; seeks do
//! not.

use bridge_traits::TrackReference;
use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::curator::AutoLibraryCurator;
use crate::error::{PlaybackError, Result};
use crate::queue::{InsertPosition, QueueController};
use crate::types::MediaDescription;

/// Command sent by a remote controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "extras", rename_all = "snake_case")]
pub enum Command {
    SeekToQueueItem {
        media_id: String,
    },
    PlayNext {
        songs: Vec<TrackReference>,
    },
    AddToQueue {
        songs: Vec<TrackReference>,
    },
    MoveItem {
        from: usize,
        to: usize,
    },
    AddItem {
        item: TrackReference,
        #[serde(default)]
        index: Option<usize>,
    },
    RemoveItem {
        media_id: String,
    },
    /// Add the active track to the library.
    AddToLibrary,
    /// Retry trigger after a failed entry.
    Prepare {
        play_when_ready: bool,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SeekToQueueItem { .. } => "seek_to_queue_item",
            Command::PlayNext { .. } => "play_next",
            Command::AddToQueue { .. } => "add_to_queue",
            Command::MoveItem { .. } => "move_item",
            Command::AddItem { .. } => "add_item",
            Command::RemoveItem { .. } => "remove_item",
            Command::AddToLibrary => "add_to_library",
            Command::Prepare { .. } => "prepare",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAck {
    Handled,
    NotHandled,
}

#[derive(Clone)]
pub struct SessionCommandBridge {
    controller: QueueController,
    curator: AutoLibraryCurator,
    events: EventBus,
}

impl SessionCommandBridge {
    pub fn new(controller: QueueController, curator: AutoLibraryCurator, events: EventBus) -> Self {
        Self {
            controller,
            curator,
            events,
        }
    }

    /// Decode and handle a raw JSON request.
    ///
    /// Unknown commands and malformed extras are `NotHandled`.
    pub async fn handle_raw(&self, request: &str) -> CommandAck {
        match serde_json::from_str::<Command>(request) {
            Ok(command) => self.handle(command).await,
            Err(e) => {
                debug!(error = %e, "Passing on unrecognised command");
                CommandAck::NotHandled
            }
        }
    }

    #[instrument(skip_all, fields(command = command.name()))]
    pub async fn handle(&self, command: Command) -> CommandAck {
        let name = command.name();
        match self.execute(command).await {
            Ok(()) => CommandAck::Handled,
            Err(PlaybackError::CommandRejected(reason)) => {
                debug!(%reason, "Command rejected");
                let _ = self
                    .events
                    .emit(CoreEvent::Session(SessionEvent::CommandRejected {
                        command: name.to_string(),
                        reason,
                    }));
                CommandAck::NotHandled
            }
            Err(e) => {
                warn!(error = %e, "Command failed");
                CommandAck::NotHandled
            }
        }
    }

    async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::SeekToQueueItem { media_id } => {
                if !self.controller.seek_to_track(&media_id).await? {
                    debug!(%media_id, "Seek target not in queue");
                }
            }
            Command::PlayNext { songs } => {
                self.controller
                    .insert_tracks(InsertPosition::AfterCurrent, songs)
                    .await?;
            }
            Command::AddToQueue { songs } => {
                self.controller
                    .insert_tracks(InsertPosition::AtEnd, songs)
                    .await?;
            }
            Command::MoveItem { from, to } => self.controller.move_item(from, to).await?,
            Command::AddItem { item, index } => self.controller.insert_at(index, item).await?,
            Command::RemoveItem { media_id } => {
                if !self.controller.remove_track(&media_id).await? {
                    debug!(%media_id, "Remove target not in queue");
                }
            }
            Command::AddToLibrary => {
                if self.curator.add_current().await.is_none() {
                    debug!("Nothing playing to add to library");
                }
            }
            Command::Prepare { play_when_ready } => self.controller.prepare(play_when_ready).await?,
        }
        Ok(())
    }

    /// Navigation query: display metadata of the entry at `index`.
    pub async fn queue_item_description(&self, index: usize) -> Option<MediaDescription> {
        self.controller.describe(index).await
    }
}
