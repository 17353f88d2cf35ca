//! # Auto Library Curator
//!
//! Adds played-through tracks to the local library.
//!
//! Two engine events count as "played through":
//! - a position discontinuity caused by an automatic transition, which
//!   persists the entry that just finished (the *old* position)
//! - the engine reaching [`EngineState::Ended`], which persists the entry
//!   still active: the event's own snapshot when the engine sent one,
//!   otherwise whatever the engine reports as current when the event is
//!   handled
//!
//! Plain item transitions are not triggers, so an automatic advance from A
//! to B writes A exactly once. The `auto_add_song` preference is read on
//! every trigger. Writes run on the session scope and never block the
//! dispatcher; failures are logged and published, not retried.

use bridge_traits::{SettingsStore, TrackReference};
use core_library::{LibrarySong, LibraryStore};
use core_runtime::events::{AddTrigger, CoreEvent, EventBus, LibraryEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::events::{DiscontinuityReason, EngineState, PlaybackEvent};
use crate::scope::SessionScope;
use crate::traits::PlaybackEngine;

#[derive(Clone)]
pub struct AutoLibraryCurator {
    settings: Arc<dyn SettingsStore>,
    library: Arc<dyn LibraryStore>,
    engine: Arc<dyn PlaybackEngine>,
    events: EventBus,
    scope: SessionScope,
    auto_add_key: String,
    default_auto_add: bool,
}

impl AutoLibraryCurator {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        library: Arc<dyn LibraryStore>,
        engine: Arc<dyn PlaybackEngine>,
        events: EventBus,
        scope: SessionScope,
        config: &PlaybackConfig,
    ) -> Self {
        Self {
            settings,
            library,
            engine,
            events,
            scope,
            auto_add_key: config.auto_add_key.clone(),
            default_auto_add: config.default_auto_add,
        }
    }

    /// Current value of the auto-add preference.
    ///
    /// An unreadable preference falls back to the default.
    pub async fn is_enabled(&self) -> bool {
        match self.settings.get_bool(&self.auto_add_key).await {
            Ok(Some(enabled)) => enabled,
            Ok(None) => self.default_auto_add,
            Err(e) => {
                warn!(key = %self.auto_add_key, error = %e, "Failed to read auto-add preference");
                self.default_auto_add
            }
        }
    }

    /// Persist a track if `event` is a trigger and auto-add is enabled.
    ///
    /// Returns the write task when one was started.
    pub async fn on_event(&self, event: &PlaybackEvent) -> Option<JoinHandle<()>> {
        let (track, duration) = match event {
            PlaybackEvent::PositionDiscontinuity {
                reason: DiscontinuityReason::AutoTransition,
                old,
                ..
            } => {
                if !self.is_enabled().await {
                    return None;
                }
                (old.track.clone()?, old.duration)
            }
            PlaybackEvent::StateChanged {
                state: EngineState::Ended,
                current,
            } => {
                if !self.is_enabled().await {
                    return None;
                }
                match current {
                    Some(position) => (position.track.clone()?, position.duration),
                    None => {
                        let item = self.engine.current_item().await?;
                        (item.track().clone(), self.engine.duration().await)
                    }
                }
            }
            _ => return None,
        };

        Some(self.persist(track, duration, AddTrigger::AutoCurated))
    }

    /// Persist the active track regardless of the preference.
    pub async fn add_current(&self) -> Option<JoinHandle<()>> {
        let item = self.engine.current_item().await?;
        let duration = self.engine.duration().await;
        Some(self.persist(item.track().clone(), duration, AddTrigger::Manual))
    }

    fn persist(
        &self,
        track: TrackReference,
        duration: Option<Duration>,
        trigger: AddTrigger,
    ) -> JoinHandle<()> {
        let library = self.library.clone();
        let events = self.events.clone();
        let song = library_song(&track, duration);

        debug!(track_id = %track.id, ?trigger, "Adding track to library");
        self.scope.spawn(async move {
            let event = match library.add_track(&song).await {
                Ok(()) => {
                    info!(track_id = %song.id, ?trigger, "Track added to library");
                    LibraryEvent::TrackAdded {
                        track_id: song.id,
                        title: song.title,
                        artist: song.artist_name,
                        trigger,
                    }
                }
                Err(e) => {
                    warn!(track_id = %song.id, error = %e, "Failed to add track to library");
                    LibraryEvent::AddFailed {
                        track_id: song.id,
                        message: e.to_string(),
                    }
                }
            };
            let _ = events.emit(CoreEvent::Library(event));
        })
    }
}

/// Library record for `track`; the duration is truncated to whole seconds.
fn library_song(track: &TrackReference, duration: Option<Duration>) -> LibrarySong {
    let duration_secs = duration.map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX));

    LibrarySong::new(track.id.clone(), track.title.clone())
        .with_artist(track.artist.clone())
        .with_duration_secs(duration_secs)
        .with_artwork(track.artwork_url.clone())
}
