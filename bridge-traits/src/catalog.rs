//! Remote Catalog Abstraction
//!
//! The catalog is the service that knows how to stream a track and how to
//! expand an album or playlist into its track listing. Ranking and search
//! live elsewhere; the playback core only needs these two lookups.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Reference to a catalog track.
///
/// Produced by queue providers and the catalog, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackReference {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    /// Display-only hint; the engine-reported duration wins when known.
    #[serde(default)]
    pub duration_secs: Option<u32>,
}

impl TrackReference {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: None,
            artwork_url: None,
            album: None,
            duration_secs: None,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_artwork(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_duration_secs(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

/// Something a remote controller can ask to enqueue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CatalogItem {
    Song(TrackReference),
    #[serde(rename_all = "camelCase")]
    Album {
        id: String,
        title: String,
        /// Listing used to expand the album into tracks.
        playlist_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Playlist { id: String, title: String },
    #[serde(rename_all = "camelCase")]
    Artist { id: String, title: String },
}

impl CatalogItem {
    /// Grouping id to expand through [`CatalogService::grouping_tracks`].
    pub fn grouping_id(&self) -> Option<&str> {
        match self {
            CatalogItem::Album { playlist_id, .. } => Some(playlist_id),
            CatalogItem::Playlist { id, .. } => Some(id),
            CatalogItem::Song(_) | CatalogItem::Artist { .. } => None,
        }
    }
}

/// Playability verdict for a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayabilityStatus {
    /// `"OK"` when streamable; anything else is a refusal code.
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl PlayabilityStatus {
    pub const OK: &'static str = "OK";

    pub fn ok() -> Self {
        Self {
            status: Self::OK.to_string(),
            reason: None,
        }
    }

    pub fn refused(status: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            status: status.into(),
            reason,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Self::OK
    }
}

/// One adaptive stream offered by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamFormat {
    pub url: String,
    pub mime_type: String,
    /// Bits per second
    pub bitrate: u64,
}

impl StreamFormat {
    /// Audio-only formats carry an `audio/*` MIME type.
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }
}

/// Playback data for a single track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackData {
    pub playability: PlayabilityStatus,
    pub formats: Vec<StreamFormat>,
}

/// Remote catalog trait
///
/// Errors are reported as [`BridgeError`](crate::BridgeError). Transport
/// failures should use [`BridgeError::Transport`](crate::BridgeError::Transport)
/// so callers can tell an unreachable catalog from a refused request.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetch playability and adaptive formats for a track.
    async fn playback_data(&self, track_id: &str) -> Result<PlaybackData>;

    /// Expand an album or playlist into its ordered tracks.
    async fn grouping_tracks(&self, grouping_id: &str) -> Result<Vec<TrackReference>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_format_detection() {
        let audio = StreamFormat {
            url: "https://cdn/a".into(),
            mime_type: "audio/webm; codecs=\"opus\"".into(),
            bitrate: 160_000,
        };
        let video = StreamFormat {
            url: "https://cdn/v".into(),
            mime_type: "video/mp4".into(),
            bitrate: 900_000,
        };

        assert!(audio.is_audio());
        assert!(!video.is_audio());
    }

    #[test]
    fn test_grouping_id() {
        let album = CatalogItem::Album {
            id: "MPRE1".into(),
            title: "Album".into(),
            playlist_id: "OLAK1".into(),
        };
        let artist = CatalogItem::Artist {
            id: "UC1".into(),
            title: "Artist".into(),
        };

        assert_eq!(album.grouping_id(), Some("OLAK1"));
        assert_eq!(artist.grouping_id(), None);
        assert_eq!(
            CatalogItem::Song(TrackReference::new("t1", "Song")).grouping_id(),
            None
        );
    }

    #[test]
    fn test_catalog_item_json_shape() {
        let item: CatalogItem = serde_json::from_value(serde_json::json!({
            "type": "song",
            "id": "abc",
            "title": "Track",
            "artist": "Someone"
        }))
        .unwrap();

        match item {
            CatalogItem::Song(track) => {
                assert_eq!(track.id, "abc");
                assert_eq!(track.artist.as_deref(), Some("Someone"));
                assert_eq!(track.duration_secs, None);
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn test_playability_status() {
        assert!(PlayabilityStatus::ok().is_ok());
        assert!(!PlayabilityStatus::refused("LOGIN_REQUIRED", None).is_ok());
    }
}
