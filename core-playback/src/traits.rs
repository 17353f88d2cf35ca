//! # Playback Seams
//!
//! Traits at the boundary between the playback core and the host.
//!
//! ## Overview
//!
//! - [`PlaybackEngine`] is the host's player: it owns playback position and
//!   state, decodes and renders audio, and mirrors the entry list the queue
//!   controller gives it.
//! - [`SourceResolver`] turns a track id into something the engine can open.
//!   [`MediaResolver`](crate::resolver::MediaResolver) is the production
//!   implementation.
//!
//! ## Threading Model
//!
//! Both traits are `Send + Sync` and shared as `Arc<dyn Trait>` across the
//! session's tasks. The engine reports back exclusively through an
//! [`EngineEventSender`](crate::events::EngineEventSender); it must not call
//! into the controller from its own callbacks.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use core_playback::{PlaybackEngine, PlayableItem};
//! async fn describe_current(engine: &dyn PlaybackEngine) -> Option<String> {
//!     let item = engine.current_item().await?;
//!     let source = item.resolve_source().await.ok()?;
//!     Some(format!("{} from {}", item.track().title, source.location()))
//! }
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;
use crate::events::EngineState;
use crate::types::{PlayableItem, ResolvedSource};

/// Resolves a track id to a playable source.
///
/// Called lazily, when the engine actually needs an entry's media.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// # Errors
    ///
    /// Per-track failures (see
    /// [`PlaybackError::is_per_track`](crate::PlaybackError::is_per_track)).
    async fn resolve(&self, track_id: &str) -> Result<ResolvedSource>;
}

/// Control surface of the host playback engine.
///
/// Indices are positions in the engine's entry list, which always mirrors
/// the queue controller's list.
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Replace every entry. An empty list clears the engine.
    async fn set_items(&self, items: Vec<PlayableItem>) -> Result<()>;

    /// Seek to the default position of the entry at `index`.
    async fn seek_to_item(&self, index: usize) -> Result<()>;

    /// Insert entries so the first one lands at `index` (`index <= count`).
    async fn add_items(&self, index: usize, items: Vec<PlayableItem>) -> Result<()>;

    async fn remove_item(&self, index: usize) -> Result<()>;

    /// Move one entry; both indices must be in bounds.
    async fn move_item(&self, from: usize, to: usize) -> Result<()>;

    /// Active entry, `None` when the engine has no entries.
    async fn current_index(&self) -> Option<usize>;

    async fn item_count(&self) -> usize;

    async fn item_at(&self, index: usize) -> Option<PlayableItem>;

    async fn current_item(&self) -> Option<PlayableItem>;

    /// Duration of the active entry, `None` while unknown.
    async fn duration(&self) -> Option<Duration>;

    async fn state(&self) -> EngineState;

    async fn prepare(&self) -> Result<()>;

    async fn set_play_when_ready(&self, play_when_ready: bool) -> Result<()>;

    /// Stop playback and free engine resources. Further calls are no-ops.
    async fn release(&self) -> Result<()>;
}
