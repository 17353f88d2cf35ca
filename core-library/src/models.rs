//! Domain models for the local library

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::LibraryError;

/// Offline availability of a song.
///
/// Written by the host's download manager; the playback core only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    #[default]
    NotDownloaded,
    Downloading,
    Downloaded,
}

impl DownloadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadState::NotDownloaded => "not_downloaded",
            DownloadState::Downloading => "downloading",
            DownloadState::Downloaded => "downloaded",
        }
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_downloaded" => Ok(DownloadState::NotDownloaded),
            "downloading" => Ok(DownloadState::Downloading),
            "downloaded" => Ok(DownloadState::Downloaded),
            other => Err(format!("unknown download state '{}'", other)),
        }
    }
}

/// A song persisted in the local library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySong {
    pub id: String,
    pub title: String,
    pub artist_name: Option<String>,
    /// Whole seconds; `None` when the length was unknown at insert time.
    pub duration_secs: Option<u32>,
    pub artwork_url: Option<String>,
    pub download_state: DownloadState,
    /// Unix seconds, assigned by the store on first insert
    pub created_at: i64,
}

impl LibrarySong {
    /// New record for a track the user has not downloaded.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist_name: None,
            duration_secs: None,
            artwork_url: None,
            download_state: DownloadState::NotDownloaded,
            created_at: 0,
        }
    }

    pub fn with_artist(mut self, artist: Option<String>) -> Self {
        self.artist_name = artist;
        self
    }

    pub fn with_duration_secs(mut self, secs: Option<u32>) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn with_artwork(mut self, url: Option<String>) -> Self {
        self.artwork_url = url;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Song id cannot be empty".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("Song title cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Raw `songs` row.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct SongRow {
    pub id: String,
    pub title: String,
    pub artist_name: Option<String>,
    pub duration_secs: Option<i64>,
    pub artwork_url: Option<String>,
    pub download_state: String,
    pub created_at: i64,
}

impl TryFrom<SongRow> for LibrarySong {
    type Error = LibraryError;

    fn try_from(row: SongRow) -> Result<Self, Self::Error> {
        let download_state =
            row.download_state
                .parse()
                .map_err(|message| LibraryError::CorruptRow {
                    id: row.id.clone(),
                    message,
                })?;
        let duration_secs = row
            .duration_secs
            .map(u32::try_from)
            .transpose()
            .map_err(|e| LibraryError::CorruptRow {
                id: row.id.clone(),
                message: format!("duration out of range: {}", e),
            })?;

        Ok(LibrarySong {
            id: row.id,
            title: row.title,
            artist_name: row.artist_name,
            duration_secs,
            artwork_url: row.artwork_url,
            download_state,
            created_at: row.created_at,
        })
    }
}
