//! HTTP catalog connector
//!
//! Implements [`CatalogService`] over the host's [`HttpClient`].

use async_trait::async_trait;
use bridge_traits::catalog::{CatalogService, PlaybackData, TrackReference};
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::CatalogError;
use crate::types::{PlayerRequest, PlayerResponse, PlaylistResponse};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(100);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Catalog API connector
///
/// - `POST {base}/player` with `{"videoId": ...}` for playability and
///   adaptive formats
/// - `GET {base}/playlist?list=...` for album/playlist expansion
///
/// Rate limiting (429), server errors and transport failures are retried
/// with exponential backoff; other statuses fail immediately.
///
/// # Example
///
/// ```ignore
/// use provider_catalog::CatalogConnector;
/// use bridge_traits::CatalogService;
///
/// let catalog = CatalogConnector::new(http_client, "https://catalog.example.com");
/// let data = catalog.playback_data("dQw4w9WgXcQ").await?;
/// ```
pub struct CatalogConnector {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    max_attempts: u32,
    base_backoff: Duration,
}

impl CatalogConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
        }
    }

    /// Override the retry policy. `max_attempts` is clamped to at least 1.
    pub fn with_retry(mut self, max_attempts: u32, base_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_backoff = base_backoff;
        self
    }

    fn player_url(&self) -> String {
        format!("{}/player", self.base_url)
    }

    fn playlist_url(&self, grouping_id: &str) -> String {
        format!(
            "{}/playlist?list={}",
            self.base_url,
            urlencoding::encode(grouping_id)
        )
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt)
    }

    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, CatalogError> {
        let mut attempt = 0;

        loop {
            let request = request.clone().timeout(REQUEST_TIMEOUT);

            match self.http_client.execute(request).await {
                Ok(response) if response.is_success() => {
                    debug!(status = response.status, "Catalog request succeeded");
                    return Ok(response);
                }
                Ok(response) if response.status == 429 || response.is_server_error() => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        warn!(status = response.status, attempts = attempt, "Catalog request gave up");
                        return Err(if response.status == 429 {
                            CatalogError::RateLimited { attempts: attempt }
                        } else {
                            CatalogError::ApiError {
                                status_code: response.status,
                                message: format!("Request failed after {} attempts", attempt),
                            }
                        });
                    }
                    let backoff = self.backoff(attempt);
                    warn!(
                        status = response.status,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Catalog request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Ok(response) => {
                    warn!(status = response.status, "Catalog request rejected");
                    return Err(CatalogError::ApiError {
                        status_code: response.status,
                        message: String::from_utf8_lossy(&response.body).to_string(),
                    });
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        warn!(error = %e, attempts = attempt, "Catalog unreachable");
                        return Err(CatalogError::NetworkError(e.to_string()));
                    }
                    let backoff = self.backoff(attempt);
                    warn!(error = %e, attempt, "Catalog transport error, retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    fn parse<T: DeserializeOwned>(
        response: &HttpResponse,
        what: &str,
    ) -> std::result::Result<T, CatalogError> {
        serde_json::from_slice(&response.body)
            .map_err(|e| CatalogError::ParseError(format!("{}: {}", what, e)))
    }
}

#[async_trait]
impl CatalogService for CatalogConnector {
    #[instrument(skip(self))]
    async fn playback_data(&self, track_id: &str) -> Result<PlaybackData> {
        let request = HttpRequest::post(self.player_url())
            .header("Accept", "application/json")
            .json(&PlayerRequest { video_id: track_id })?;

        let response = self.execute_with_retry(request).await?;
        let player: PlayerResponse = Self::parse(&response, "player response")?;
        let data = PlaybackData::from(player);

        debug!(
            status = %data.playability.status,
            formats = data.formats.len(),
            "Playback data received"
        );
        Ok(data)
    }

    #[instrument(skip(self))]
    async fn grouping_tracks(&self, grouping_id: &str) -> Result<Vec<TrackReference>> {
        let request =
            HttpRequest::get(self.playlist_url(grouping_id)).header("Accept", "application/json");

        let response = self.execute_with_retry(request).await?;
        let playlist: PlaylistResponse = Self::parse(&response, "playlist response")?;
        let tracks: Vec<TrackReference> = playlist.tracks.into_iter().map(Into::into).collect();

        info!(count = tracks.len(), "Expanded grouping");
        Ok(tracks)
    }
}
