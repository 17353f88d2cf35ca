//! Library store trait and SQLite implementation

use crate::error::{LibraryError, Result};
use crate::models::{DownloadState, LibrarySong, SongRow};
use async_trait::async_trait;
use bridge_traits::time::{Clock, SystemClock};
use sqlx::{query_as, SqlitePool};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Local library access used by the playback core.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Download state of a song; unknown songs are `NotDownloaded`.
    async fn download_state(&self, id: &str) -> Result<DownloadState>;

    /// Where the downloaded file for `id` lives. Only meaningful when
    /// [`download_state`](LibraryStore::download_state) is `Downloaded`.
    fn local_file_path(&self, id: &str) -> PathBuf;

    /// Insert a song, or refresh the metadata of an existing one.
    ///
    /// The download state and creation time of an existing row are kept.
    async fn add_track(&self, song: &LibrarySong) -> Result<()>;

    /// Find a song by id
    async fn get_track(&self, id: &str) -> Result<Option<LibrarySong>>;

    /// Record a download state change reported by the host.
    ///
    /// # Errors
    /// [`LibraryError::NotFound`] if the song is not in the library.
    async fn set_download_state(&self, id: &str, state: DownloadState) -> Result<()>;
}

/// SQLite implementation of [`LibraryStore`]
pub struct SqliteLibraryStore {
    pool: SqlitePool,
    downloads_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl SqliteLibraryStore {
    pub fn new(pool: SqlitePool, downloads_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(pool, downloads_dir, Arc::new(SystemClock))
    }

    pub fn with_clock(
        pool: SqlitePool,
        downloads_dir: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pool,
            downloads_dir: downloads_dir.into(),
            clock,
        }
    }
}

#[async_trait]
impl LibraryStore for SqliteLibraryStore {
    async fn download_state(&self, id: &str) -> Result<DownloadState> {
        let state: Option<(String,)> =
            query_as("SELECT download_state FROM songs WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match state {
            Some((raw,)) => raw.parse().map_err(|message| LibraryError::CorruptRow {
                id: id.to_string(),
                message,
            }),
            None => Ok(DownloadState::NotDownloaded),
        }
    }

    fn local_file_path(&self, id: &str) -> PathBuf {
        self.downloads_dir.join(id)
    }

    async fn add_track(&self, song: &LibrarySong) -> Result<()> {
        song.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "song".to_string(),
            message: msg,
        })?;

        let now = self.clock.unix_timestamp();
        sqlx::query(
            r#"
            INSERT INTO songs (
                id, title, artist_name, duration_secs, artwork_url,
                download_state, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                artist_name = excluded.artist_name,
                duration_secs = COALESCE(excluded.duration_secs, songs.duration_secs),
                artwork_url = excluded.artwork_url,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&song.id)
        .bind(&song.title)
        .bind(&song.artist_name)
        .bind(song.duration_secs.map(i64::from))
        .bind(&song.artwork_url)
        .bind(song.download_state.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(song_id = %song.id, "Song stored in library");
        Ok(())
    }

    async fn get_track(&self, id: &str) -> Result<Option<LibrarySong>> {
        let row = query_as::<_, SongRow>(
            "SELECT id, title, artist_name, duration_secs, artwork_url, download_state, created_at \
             FROM songs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LibrarySong::try_from).transpose()
    }

    async fn set_download_state(&self, id: &str, state: DownloadState) -> Result<()> {
        let result = sqlx::query("UPDATE songs SET download_state = ?, updated_at = ? WHERE id = ?")
            .bind(state.as_str())
            .bind(self.clock.unix_timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound { id: id.to_string() });
        }
        Ok(())
    }
}
