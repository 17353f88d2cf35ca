//! # Media Resolution
//!
//! Maps a track id to a local file or a remote adaptive stream.
//!
//! Downloaded tracks never touch the network. Everything else goes through
//! the catalog: the track must be playable, and among its audio-only formats
//! the highest bitrate is picked on unmetered networks and the lowest on
//! metered ones.

use async_trait::async_trait;
use bridge_traits::{CatalogService, NetworkMonitor, StreamFormat};
use core_library::{DownloadState, LibraryStore};
use core_runtime::logging::strip_path;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{PlaybackError, Result};
use crate::traits::SourceResolver;
use crate::types::ResolvedSource;

/// Stateless resolver over the library, the catalog and the network monitor.
#[derive(Clone)]
pub struct MediaResolver {
    library: Arc<dyn LibraryStore>,
    catalog: Arc<dyn CatalogService>,
    network: Arc<dyn NetworkMonitor>,
}

impl MediaResolver {
    pub fn new(
        library: Arc<dyn LibraryStore>,
        catalog: Arc<dyn CatalogService>,
        network: Arc<dyn NetworkMonitor>,
    ) -> Self {
        Self {
            library,
            catalog,
            network,
        }
    }

    async fn local_source(&self, track_id: &str) -> Option<ResolvedSource> {
        match self.library.download_state(track_id).await {
            Ok(DownloadState::Downloaded) => {
                let path = self.library.local_file_path(track_id);
                debug!(
                    file = %strip_path(&path.to_string_lossy()),
                    "Resolved to downloaded file"
                );
                Some(ResolvedSource::LocalFile { path })
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Library lookup failed, resolving remotely");
                None
            }
        }
    }
}

#[async_trait]
impl SourceResolver for MediaResolver {
    #[instrument(skip(self), fields(track_id = %track_id))]
    async fn resolve(&self, track_id: &str) -> Result<ResolvedSource> {
        if let Some(source) = self.local_source(track_id).await {
            return Ok(source);
        }

        let data = self.catalog.playback_data(track_id).await.map_err(|e| {
            if e.is_transport() {
                PlaybackError::ResolutionNetworkFailure(e.to_string())
            } else {
                PlaybackError::Catalog(e.to_string())
            }
        })?;

        if !data.playability.is_ok() {
            warn!(
                status = %data.playability.status,
                reason = ?data.playability.reason,
                "Track not playable"
            );
            return Err(PlaybackError::StreamUnavailable {
                status: data.playability.status,
            });
        }

        let metered = self.network.is_metered().await;
        let format =
            select_audio_format(&data.formats, metered).ok_or(PlaybackError::NoStreamAvailable)?;

        debug!(bitrate = format.bitrate, metered, "Resolved to remote stream");
        Ok(ResolvedSource::RemoteStream {
            url: format.url.clone(),
            bitrate: format.bitrate,
        })
    }
}

/// Picks the audio-only format with the highest bitrate, or the lowest when
/// `metered`. On equal bitrates the first one in `formats` wins.
pub fn select_audio_format(formats: &[StreamFormat], metered: bool) -> Option<&StreamFormat> {
    formats
        .iter()
        .filter(|format| format.is_audio())
        .fold(None, |best: Option<&StreamFormat>, format| match best {
            Some(current)
                if (metered && format.bitrate >= current.bitrate)
                    || (!metered && format.bitrate <= current.bitrate) =>
            {
                Some(current)
            }
            _ => Some(format),
        })
}
