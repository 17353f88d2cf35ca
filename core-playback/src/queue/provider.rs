//! Queue sources.
//!
//! A [`QueueProvider`] hands the controller an initial list and, optionally,
//! further pages on demand. The controller never asks why a provider has no
//! more pages; it only stops asking.

use async_trait::async_trait;
use bridge_traits::{CatalogService, TrackReference};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::error::{PlaybackError, Result};
use crate::types::QueueStatus;

/// Ordered, possibly paginated sequence of tracks.
#[async_trait]
pub trait QueueProvider: Send + Sync {
    /// Tracks to install and the entry to start at.
    async fn initial_status(&self) -> Result<QueueStatus>;

    /// Whether [`next_page`](Self::next_page) has anything left to return.
    fn has_next_page(&self) -> bool;

    /// Next batch of tracks to append.
    async fn next_page(&self) -> Result<Vec<TrackReference>>;
}

/// Provider with nothing in it.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyQueue;

#[async_trait]
impl QueueProvider for EmptyQueue {
    async fn initial_status(&self) -> Result<QueueStatus> {
        Ok(QueueStatus::default())
    }

    fn has_next_page(&self) -> bool {
        false
    }

    async fn next_page(&self) -> Result<Vec<TrackReference>> {
        Ok(Vec::new())
    }
}

/// Fixed track list.
///
/// Without a page size every track is part of the initial status. With one,
/// the initial status holds the first page and the rest is served one page
/// at a time.
#[derive(Debug)]
pub struct ListQueue {
    tracks: Vec<TrackReference>,
    start_index: usize,
    page_size: Option<usize>,
    cursor: Mutex<usize>,
}

impl ListQueue {
    pub fn new(tracks: Vec<TrackReference>, start_index: usize) -> Self {
        let cursor = tracks.len();
        Self {
            tracks,
            start_index,
            page_size: None,
            cursor: Mutex::new(cursor),
        }
    }

    /// Serve the list in pages of `page_size` (at least 1).
    pub fn paged(tracks: Vec<TrackReference>, start_index: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let cursor = page_size.min(tracks.len());
        Self {
            tracks,
            start_index,
            page_size: Some(page_size),
            cursor: Mutex::new(cursor),
        }
    }

    fn initial_len(&self) -> usize {
        self.page_size
            .map_or(self.tracks.len(), |size| size.min(self.tracks.len()))
    }
}

#[async_trait]
impl QueueProvider for ListQueue {
    async fn initial_status(&self) -> Result<QueueStatus> {
        let items = self.tracks[..self.initial_len()].to_vec();
        Ok(QueueStatus::new(items, self.start_index))
    }

    fn has_next_page(&self) -> bool {
        *self.cursor.lock() < self.tracks.len()
    }

    async fn next_page(&self) -> Result<Vec<TrackReference>> {
        let Some(page_size) = self.page_size else {
            return Ok(Vec::new());
        };

        let mut cursor = self.cursor.lock();
        let start = *cursor;
        let end = (start + page_size).min(self.tracks.len());
        *cursor = end;

        debug!(start, end, "Serving list page");
        Ok(self.tracks[start..end].to_vec())
    }
}

/// An album or playlist, expanded through the catalog when installed.
pub struct GroupingQueue {
    catalog: Arc<dyn CatalogService>,
    grouping_id: String,
    start_track: Option<String>,
}

impl GroupingQueue {
    pub fn new(catalog: Arc<dyn CatalogService>, grouping_id: impl Into<String>) -> Self {
        Self {
            catalog,
            grouping_id: grouping_id.into(),
            start_track: None,
        }
    }

    /// Start at this track instead of the first one, if the listing has it.
    pub fn starting_at(mut self, track_id: impl Into<String>) -> Self {
        self.start_track = Some(track_id.into());
        self
    }
}

#[async_trait]
impl QueueProvider for GroupingQueue {
    async fn initial_status(&self) -> Result<QueueStatus> {
        let tracks = self
            .catalog
            .grouping_tracks(&self.grouping_id)
            .await
            .map_err(|e| PlaybackError::PaginationFailure(e.to_string()))?;

        let start_index = self
            .start_track
            .as_deref()
            .and_then(|id| tracks.iter().position(|track| track.id == id))
            .unwrap_or(0);

        debug!(
            grouping_id = %self.grouping_id,
            count = tracks.len(),
            start_index,
            "Grouping expanded"
        );
        Ok(QueueStatus::new(tracks, start_index))
    }

    fn has_next_page(&self) -> bool {
        false
    }

    async fn next_page(&self) -> Result<Vec<TrackReference>> {
        Ok(Vec::new())
    }
}
