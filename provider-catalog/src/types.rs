//! Catalog API response types

use bridge_traits::catalog::{PlayabilityStatus, PlaybackData, StreamFormat, TrackReference};
use serde::{Deserialize, Serialize};

/// Body of a `player` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRequest<'a> {
    pub video_id: &'a str,
}

/// `player` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub playability_status: PlayabilityStatusDto,
    /// Absent when the track is not playable
    #[serde(default)]
    pub streaming_data: Option<StreamingData>,
}

#[derive(Debug, Deserialize)]
pub struct PlayabilityStatusDto {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    #[serde(default)]
    pub adaptive_formats: Vec<AdaptiveFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveFormat {
    #[serde(default)]
    pub itag: Option<u32>,
    /// Missing for ciphered formats, which cannot be streamed directly
    #[serde(default)]
    pub url: Option<String>,
    pub mime_type: String,
    #[serde(default)]
    pub bitrate: u64,
}

impl From<PlayerResponse> for PlaybackData {
    fn from(response: PlayerResponse) -> Self {
        let formats = response
            .streaming_data
            .unwrap_or_default()
            .adaptive_formats
            .into_iter()
            .filter_map(|format| {
                format.url.map(|url| StreamFormat {
                    url,
                    mime_type: format.mime_type,
                    bitrate: format.bitrate,
                })
            })
            .collect();

        PlaybackData {
            playability: PlayabilityStatus {
                status: response.playability_status.status,
                reason: response.playability_status.reason,
            },
            formats,
        }
    }
}

/// `playlist` response: the ordered tracks of an album or playlist.
#[derive(Debug, Deserialize)]
pub struct PlaylistResponse {
    #[serde(default)]
    pub tracks: Vec<PlaylistTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrack {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(default)]
    pub length_seconds: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AlbumRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: u32,
}

impl From<PlaylistTrack> for TrackReference {
    fn from(track: PlaylistTrack) -> Self {
        let artist = if track.artists.is_empty() {
            None
        } else {
            Some(
                track
                    .artists
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };
        let artwork_url = track
            .thumbnails
            .into_iter()
            .max_by_key(|thumb| thumb.width)
            .map(|thumb| thumb.url);

        TrackReference {
            id: track.video_id,
            title: track.title,
            artist,
            artwork_url,
            album: track.album.map(|a| a.name),
            duration_secs: track.length_seconds,
        }
    }
}
