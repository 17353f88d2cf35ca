//! Queue entry and source types shared by the controller, the engine and the
//! command bridge.

use bridge_traits::TrackReference;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::traits::SourceResolver;

/// Where the engine reads a track's audio from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedSource {
    /// Downloaded file in the library's downloads directory.
    LocalFile { path: PathBuf },
    /// Adaptive format picked from the catalog.
    RemoteStream { url: String, bitrate: u64 },
}

impl ResolvedSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, ResolvedSource::RemoteStream { .. })
    }

    /// Location handed to the engine's data source.
    pub fn location(&self) -> String {
        match self {
            ResolvedSource::LocalFile { path } => path.display().to_string(),
            ResolvedSource::RemoteStream { url, .. } => url.clone(),
        }
    }
}

/// Initial contents of a queue: ordered tracks plus the entry to start at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStatus {
    pub items: Vec<TrackReference>,
    pub start_index: usize,
}

impl QueueStatus {
    pub fn new(items: Vec<TrackReference>, start_index: usize) -> Self {
        Self { items, start_index }
    }

    /// Start index clamped into the list; 0 for an empty list.
    pub fn clamped_start(&self) -> usize {
        self.start_index.min(self.items.len().saturating_sub(1))
    }
}

/// Display metadata answered to the navigation query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescription {
    pub media_id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub icon_url: Option<String>,
}

impl From<&TrackReference> for MediaDescription {
    fn from(track: &TrackReference) -> Self {
        Self {
            media_id: track.id.clone(),
            title: track.title.clone(),
            subtitle: track.artist.clone(),
            icon_url: track.artwork_url.clone(),
        }
    }
}

/// A queue entry: a track bound to a lazily resolved source.
///
/// Clones share the source cache, so the controller's copy and the engine's
/// copy of an entry never resolve twice. The cache lives as long as the
/// entry; the engine calls [`invalidate_source`](Self::invalidate_source)
/// when a cached source fails so the next attempt resolves again.
#[derive(Clone)]
pub struct PlayableItem {
    track: TrackReference,
    resolver: Arc<dyn SourceResolver>,
    source: Arc<Mutex<Option<ResolvedSource>>>,
}

impl PlayableItem {
    pub fn new(track: TrackReference, resolver: Arc<dyn SourceResolver>) -> Self {
        Self {
            track,
            resolver,
            source: Arc::new(Mutex::new(None)),
        }
    }

    /// Resolution key.
    pub fn id(&self) -> &str {
        &self.track.id
    }

    pub fn track(&self) -> &TrackReference {
        &self.track
    }

    /// Returns the cached source, resolving it on first use.
    ///
    /// Failures are not cached.
    pub async fn resolve_source(&self) -> Result<ResolvedSource> {
        if let Some(source) = self.cached_source() {
            return Ok(source);
        }

        let source = self.resolver.resolve(&self.track.id).await?;
        *self.source.lock() = Some(source.clone());
        Ok(source)
    }

    pub fn cached_source(&self) -> Option<ResolvedSource> {
        self.source.lock().clone()
    }

    pub fn invalidate_source(&self) {
        if self.source.lock().take().is_some() {
            debug!(track_id = %self.track.id, "Source cache invalidated");
        }
    }
}

impl fmt::Debug for PlayableItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayableItem")
            .field("track", &self.track)
            .field("source", &self.cached_source())
            .finish()
    }
}
