//! # Queue Controller
//!
//! Owns the session's entry list and keeps the engine's copy in step.
//!
//! ## Installation
//!
//! [`play_queue`](QueueController::play_queue) starts a new *installation*:
//! the generation counter moves forward, the previous installation's token is
//! cancelled and the engine is cleared. The provider's initial status is then
//! fetched on the session scope. Every task that awaits the provider checks
//! the generation again once it holds the state lock, so a page fetched for
//! an older installation is dropped rather than appended.
//!
//! ## Pagination
//!
//! Engine item transitions drive [`on_item_transition`]: once fewer than
//! `refill_threshold` entries remain counting from the active one, the next
//! page is fetched and appended. One fetch runs at a time. A page the engine
//! refuses is kept and offered again on the next trigger before the provider
//! is asked for more.
//!
//! The engine is always called before the controller's list changes, so a
//! refused call leaves both sides as they were.
//!
//! [`on_item_transition`]: QueueController::on_item_transition

use bridge_traits::{CatalogItem, CatalogService, TrackReference};
use core_runtime::events::{CoreEvent, EventBus, QueueEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{PlaybackError, Result};
use crate::events::{EngineState, TransitionReason};
use crate::queue::provider::{EmptyQueue, QueueProvider};
use crate::scope::SessionScope;
use crate::traits::{PlaybackEngine, SourceResolver};
use crate::types::{MediaDescription, PlayableItem};

/// Where added tracks go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    /// Right after the active entry; first position on an empty queue.
    AfterCurrent,
    AtEnd,
}

struct QueueState {
    generation: u64,
    provider: Arc<dyn QueueProvider>,
    token: CancellationToken,
    items: Vec<PlayableItem>,
    paging: bool,
    /// Page fetched but not yet accepted by the engine.
    pending: Option<Vec<TrackReference>>,
}

struct Inner {
    engine: Arc<dyn PlaybackEngine>,
    resolver: Arc<dyn SourceResolver>,
    catalog: Arc<dyn CatalogService>,
    events: EventBus,
    scope: SessionScope,
    refill_threshold: usize,
    state: Mutex<QueueState>,
}

/// Cloneable handle; clones share one queue.
#[derive(Clone)]
pub struct QueueController {
    inner: Arc<Inner>,
}

impl QueueController {
    pub fn new(
        engine: Arc<dyn PlaybackEngine>,
        resolver: Arc<dyn SourceResolver>,
        catalog: Arc<dyn CatalogService>,
        events: EventBus,
        scope: SessionScope,
        refill_threshold: usize,
    ) -> Self {
        let token = scope.child_token();
        Self {
            inner: Arc::new(Inner {
                engine,
                resolver,
                catalog,
                events,
                scope,
                refill_threshold,
                state: Mutex::new(QueueState {
                    generation: 0,
                    provider: Arc::new(EmptyQueue),
                    token,
                    items: Vec::new(),
                    paging: false,
                    pending: None,
                }),
            }),
        }
    }

    fn emit(&self, event: QueueEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.emit(CoreEvent::Queue(event));
    }

    fn playable(&self, tracks: Vec<TrackReference>) -> Vec<PlayableItem> {
        tracks
            .into_iter()
            .map(|track| PlayableItem::new(track, self.inner.resolver.clone()))
            .collect()
    }

    fn ensure_active(&self) -> Result<()> {
        if self.inner.scope.is_released() {
            return Err(PlaybackError::SessionReleased);
        }
        Ok(())
    }

    // ========================================================================
    // Installation
    // ========================================================================

    /// Replace the queue with `provider`.
    ///
    /// The engine is cleared before this returns; the initial status is
    /// fetched and installed by the returned task.
    #[instrument(skip_all)]
    pub async fn play_queue(
        &self,
        provider: Arc<dyn QueueProvider>,
    ) -> Result<JoinHandle<Result<()>>> {
        self.ensure_active()?;

        let (generation, token) = {
            let mut state = self.inner.state.lock().await;
            self.inner.engine.set_items(Vec::new()).await?;
            state.token.cancel();
            state.generation = state.generation.wrapping_add(1);
            state.token = self.inner.scope.child_token();
            state.provider = provider.clone();
            state.items.clear();
            state.paging = false;
            state.pending = None;
            (state.generation, state.token.clone())
        };

        debug!(generation, "Queue installation started");
        let this = self.clone();
        Ok(self
            .inner
            .scope
            .spawn(async move { this.install(generation, token, provider).await }))
    }

    async fn install(
        &self,
        generation: u64,
        token: CancellationToken,
        provider: Arc<dyn QueueProvider>,
    ) -> Result<()> {
        let status = tokio::select! {
            _ = token.cancelled() => {
                debug!(generation, "Installation superseded before initial status");
                return Ok(());
            }
            status = provider.initial_status() => status,
        };

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                warn!(generation, error = %e, "Initial queue status failed");
                self.emit(QueueEvent::PaginationFailed {
                    generation,
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            debug!(generation, "Dropping initial status of a stale installation");
            return Ok(());
        }

        let start_index = status.clamped_start();
        let items = self.playable(status.items);
        let item_count = items.len();

        let engine = &self.inner.engine;
        if let Err(e) = engine.set_items(items.clone()).await {
            drop(state);
            warn!(generation, error = %e, "Engine refused queue installation");
            self.emit(QueueEvent::PaginationFailed {
                generation,
                message: e.to_string(),
            });
            return Err(e);
        }
        state.items = items;

        if start_index > 0 {
            engine.seek_to_item(start_index).await?;
        }
        engine.prepare().await?;
        engine.set_play_when_ready(true).await?;
        drop(state);

        info!(generation, item_count, start_index, "Queue installed");
        self.emit(QueueEvent::Installed {
            generation,
            item_count,
            start_index,
        });
        Ok(())
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    /// React to an engine item transition.
    ///
    /// Returns the page fetch task when one was started.
    pub async fn on_item_transition(&self, reason: TransitionReason) -> Option<JoinHandle<()>> {
        if reason == TransitionReason::Repeat || self.inner.scope.is_released() {
            return None;
        }

        let mut state = self.inner.state.lock().await;
        if state.paging || self.inner.engine.state().await == EngineState::Idle {
            return None;
        }

        let active = self.inner.engine.current_index().await.unwrap_or(0);
        let remaining = state.items.len().saturating_sub(active);
        if remaining >= self.inner.refill_threshold
            || (state.pending.is_none() && !state.provider.has_next_page())
        {
            return None;
        }

        state.paging = true;
        let generation = state.generation;
        let token = state.token.clone();
        let provider = state.provider.clone();
        let pending = state.pending.take();
        drop(state);

        debug!(generation, remaining, retry = pending.is_some(), "Fetching next queue page");
        let this = self.clone();
        Some(self.inner.scope.spawn(async move {
            this.append_next_page(generation, token, provider, pending).await
        }))
    }

    async fn append_next_page(
        &self,
        generation: u64,
        token: CancellationToken,
        provider: Arc<dyn QueueProvider>,
        pending: Option<Vec<TrackReference>>,
    ) {
        let page = match pending {
            Some(tracks) => Ok(tracks),
            None => tokio::select! {
                _ = token.cancelled() => return,
                page = provider.next_page() => page,
            },
        };

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            debug!(generation, "Dropping page of a stale installation");
            return;
        }
        state.paging = false;

        let tracks = match page {
            Ok(tracks) => tracks,
            Err(e) => {
                drop(state);
                warn!(generation, error = %e, "Queue pagination failed");
                self.emit(QueueEvent::PaginationFailed {
                    generation,
                    message: e.to_string(),
                });
                return;
            }
        };

        if tracks.is_empty() {
            return;
        }

        let items = self.playable(tracks.clone());
        let added = items.len();
        let index = state.items.len();
        if let Err(e) = self.inner.engine.add_items(index, items.clone()).await {
            state.pending = Some(tracks);
            drop(state);
            warn!(generation, error = %e, "Engine refused queue page, keeping it for retry");
            self.emit(QueueEvent::PaginationFailed {
                generation,
                message: e.to_string(),
            });
            return;
        }
        state.items.extend(items);
        let total = state.items.len();
        drop(state);

        debug!(generation, added, total, "Queue page appended");
        self.emit(QueueEvent::PageAppended {
            generation,
            added,
            total,
        });
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a catalog item to the queue.
    ///
    /// Songs add one entry, albums and playlists their whole listing; other
    /// kinds are ignored. Returns the number of entries added; a listing
    /// that arrives after the queue was replaced is dropped.
    #[instrument(skip(self, item))]
    pub async fn handle_add_endpoint(
        &self,
        position: InsertPosition,
        item: CatalogItem,
    ) -> Result<usize> {
        self.ensure_active()?;
        let generation = self.generation().await;

        let tracks = match (&item, item.grouping_id()) {
            (CatalogItem::Song(track), _) => vec![track.clone()],
            (_, Some(grouping_id)) => self
                .inner
                .catalog
                .grouping_tracks(grouping_id)
                .await
                .map_err(|e| PlaybackError::Catalog(e.to_string()))?,
            _ => {
                debug!(?item, "Item kind cannot be queued");
                return Ok(0);
            }
        };

        self.insert_positioned(Some(generation), position, tracks).await
    }

    /// Insert tracks and re-prepare the engine.
    pub async fn insert_tracks(
        &self,
        position: InsertPosition,
        tracks: Vec<TrackReference>,
    ) -> Result<usize> {
        self.insert_positioned(None, position, tracks).await
    }

    async fn insert_positioned(
        &self,
        expected_generation: Option<u64>,
        position: InsertPosition,
        tracks: Vec<TrackReference>,
    ) -> Result<usize> {
        self.ensure_active()?;
        let mut state = self.inner.state.lock().await;
        if let Some(generation) = expected_generation {
            if state.generation != generation {
                debug!(generation, "Dropping listing fetched for a replaced queue");
                return Ok(0);
            }
        }

        let len = state.items.len();
        let index = match position {
            InsertPosition::AtEnd => len,
            InsertPosition::AfterCurrent if len == 0 => 0,
            InsertPosition::AfterCurrent => {
                let active = self.inner.engine.current_index().await.unwrap_or(0);
                (active + 1).min(len)
            }
        };

        let count = self.insert_locked(&mut state, index, tracks).await?;
        drop(state);

        self.inner.engine.prepare().await?;
        Ok(count)
    }

    /// Insert one track at `index`, or append it when `index` is `None`.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::CommandRejected`] when `index` is past the end.
    pub async fn insert_at(&self, index: Option<usize>, track: TrackReference) -> Result<()> {
        self.ensure_active()?;
        let mut state = self.inner.state.lock().await;

        let len = state.items.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(PlaybackError::CommandRejected(format!(
                "insert index {} out of bounds for {} entries",
                index, len
            )));
        }

        self.insert_locked(&mut state, index, vec![track]).await?;
        drop(state);

        self.inner.engine.prepare().await
    }

    async fn insert_locked(
        &self,
        state: &mut QueueState,
        index: usize,
        tracks: Vec<TrackReference>,
    ) -> Result<usize> {
        if tracks.is_empty() {
            return Ok(0);
        }

        let items = self.playable(tracks);
        let count = items.len();
        self.inner.engine.add_items(index, items.clone()).await?;
        let tail = state.items.split_off(index);
        state.items.extend(items);
        state.items.extend(tail);

        self.emit(QueueEvent::ItemsInserted { index, count });
        Ok(count)
    }

    /// Move one entry.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::CommandRejected`] when either index is out of bounds;
    /// the queue is left untouched.
    pub async fn move_item(&self, from: usize, to: usize) -> Result<()> {
        self.ensure_active()?;
        let mut state = self.inner.state.lock().await;

        let len = state.items.len();
        if from >= len || to >= len {
            return Err(PlaybackError::CommandRejected(format!(
                "move {} -> {} out of bounds for {} entries",
                from, to, len
            )));
        }

        self.inner.engine.move_item(from, to).await?;
        let item = state.items.remove(from);
        state.items.insert(to, item);
        drop(state);

        self.inner.engine.prepare().await
    }

    /// Remove the first entry for `track_id`. Returns whether one was found.
    pub async fn remove_track(&self, track_id: &str) -> Result<bool> {
        self.ensure_active()?;
        let mut state = self.inner.state.lock().await;

        let Some(index) = state.items.iter().position(|item| item.id() == track_id) else {
            return Ok(false);
        };

        self.inner.engine.remove_item(index).await?;
        state.items.remove(index);
        drop(state);

        self.inner.engine.prepare().await?;
        Ok(true)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Seek to the default position of the first entry for `track_id`.
    /// Returns whether one was found.
    pub async fn seek_to_track(&self, track_id: &str) -> Result<bool> {
        self.ensure_active()?;
        let state = self.inner.state.lock().await;

        match state.items.iter().position(|item| item.id() == track_id) {
            Some(index) => {
                self.inner.engine.seek_to_item(index).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Display metadata of the entry at `index`.
    pub async fn describe(&self, index: usize) -> Option<MediaDescription> {
        let state = self.inner.state.lock().await;
        state
            .items
            .get(index)
            .map(|item| MediaDescription::from(item.track()))
    }

    /// Snapshot of the queued tracks.
    pub async fn tracks(&self) -> Vec<TrackReference> {
        let state = self.inner.state.lock().await;
        state.items.iter().map(|item| item.track().clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn generation(&self) -> u64 {
        self.inner.state.lock().await.generation
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Re-prepare the engine, e.g. to retry an entry that failed to load.
    pub async fn prepare(&self, play_when_ready: bool) -> Result<()> {
        self.ensure_active()?;
        self.inner.engine.set_play_when_ready(play_when_ready).await?;
        self.inner.engine.prepare().await
    }

    /// Cancel pagination and release the engine.
    pub async fn release(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock().await;
            state.token.cancel();
            state.paging = false;
            state.pending = None;
        }
        self.inner.engine.release().await
    }
}
