//! Shared fakes for the playback integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::catalog::{PlayabilityStatus, PlaybackData, StreamFormat};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::network::{NetworkInfo, NetworkMonitor, NetworkType};
use bridge_traits::{CatalogService, SettingsStore, TrackReference};
use core_library::{DownloadState, LibrarySong, LibraryStore};
use core_playback::{
    EngineEventSender, EngineState, PlayableItem, PlaybackConfig, PlaybackEngine, PlaybackError,
    PlaybackSession, QueueProvider, QueueStatus, Result, SessionDeps,
};
use core_runtime::events::{CoreEvent, EventBus};
use mockall::mock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Semaphore};

pub fn track(id: &str) -> TrackReference {
    TrackReference::new(id, format!("Title {}", id)).with_artist(format!("Artist {}", id))
}

pub fn tracks(ids: &[&str]) -> Vec<TrackReference> {
    ids.iter().map(|id| track(id)).collect()
}

pub fn numbered(n: usize) -> Vec<TrackReference> {
    (0..n).map(|i| track(&format!("t{}", i))).collect()
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Default)]
struct EngineInner {
    items: Vec<PlayableItem>,
    current: usize,
    state: EngineState,
    play_when_ready: bool,
    prepare_count: usize,
    seeks: Vec<usize>,
    duration: Option<Duration>,
    released: bool,
    reject_installs: bool,
    rejected_adds: usize,
}

/// In-memory engine that mirrors entries the way a real player does,
/// keeping the active entry stable across inserts, removals and moves.
#[derive(Default)]
pub struct FakeEngine {
    inner: Mutex<EngineInner>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .items
            .iter()
            .map(|item| item.id().to_string())
            .collect()
    }

    pub fn set_current(&self, index: usize) {
        self.inner.lock().current = index;
    }

    pub fn set_state(&self, state: EngineState) {
        self.inner.lock().state = state;
    }

    pub fn set_duration(&self, duration: Option<Duration>) {
        self.inner.lock().duration = duration;
    }

    pub fn prepare_count(&self) -> usize {
        self.inner.lock().prepare_count
    }

    pub fn seeks(&self) -> Vec<usize> {
        self.inner.lock().seeks.clone()
    }

    pub fn play_when_ready(&self) -> bool {
        self.inner.lock().play_when_ready
    }

    pub fn is_released(&self) -> bool {
        self.inner.lock().released
    }

    /// Refuse every non-empty `set_items`.
    pub fn reject_installs(&self, reject: bool) {
        self.inner.lock().reject_installs = reject;
    }

    /// Refuse the next `count` calls to `add_items`.
    pub fn reject_next_adds(&self, count: usize) {
        self.inner.lock().rejected_adds = count;
    }
}

#[async_trait]
impl PlaybackEngine for FakeEngine {
    async fn set_items(&self, items: Vec<PlayableItem>) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.reject_installs && !items.is_empty() {
            return Err(PlaybackError::Engine("busy".into()));
        }
        inner.items = items;
        inner.current = 0;
        if inner.items.is_empty() {
            inner.state = EngineState::Idle;
        }
        Ok(())
    }

    async fn seek_to_item(&self, index: usize) -> Result<()> {
        let mut inner = self.inner.lock();
        if index >= inner.items.len() {
            return Err(PlaybackError::Engine(format!("seek to {}", index)));
        }
        inner.current = index;
        inner.seeks.push(index);
        Ok(())
    }

    async fn add_items(&self, index: usize, items: Vec<PlayableItem>) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.rejected_adds > 0 {
            inner.rejected_adds -= 1;
            return Err(PlaybackError::Engine("buffer full".into()));
        }
        if index > inner.items.len() {
            return Err(PlaybackError::Engine(format!("insert at {}", index)));
        }
        let count = items.len();
        let was_empty = inner.items.is_empty();
        let tail = inner.items.split_off(index);
        inner.items.extend(items);
        inner.items.extend(tail);
        if !was_empty && index <= inner.current {
            inner.current += count;
        }
        Ok(())
    }

    async fn remove_item(&self, index: usize) -> Result<()> {
        let mut inner = self.inner.lock();
        if index >= inner.items.len() {
            return Err(PlaybackError::Engine(format!("remove {}", index)));
        }
        inner.items.remove(index);
        if index < inner.current {
            inner.current -= 1;
        }
        inner.current = inner.current.min(inner.items.len().saturating_sub(1));
        Ok(())
    }

    async fn move_item(&self, from: usize, to: usize) -> Result<()> {
        let mut inner = self.inner.lock();
        let len = inner.items.len();
        if from >= len || to >= len {
            return Err(PlaybackError::Engine(format!("move {} -> {}", from, to)));
        }
        let item = inner.items.remove(from);
        inner.items.insert(to, item);

        let current = inner.current;
        inner.current = if current == from {
            to
        } else if from < current && to >= current {
            current - 1
        } else if from > current && to <= current {
            current + 1
        } else {
            current
        };
        Ok(())
    }

    async fn current_index(&self) -> Option<usize> {
        let inner = self.inner.lock();
        (!inner.items.is_empty()).then_some(inner.current)
    }

    async fn item_count(&self) -> usize {
        self.inner.lock().items.len()
    }

    async fn item_at(&self, index: usize) -> Option<PlayableItem> {
        self.inner.lock().items.get(index).cloned()
    }

    async fn current_item(&self) -> Option<PlayableItem> {
        let inner = self.inner.lock();
        inner.items.get(inner.current).cloned()
    }

    async fn duration(&self) -> Option<Duration> {
        self.inner.lock().duration
    }

    async fn state(&self) -> EngineState {
        self.inner.lock().state
    }

    async fn prepare(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.prepare_count += 1;
        if !inner.items.is_empty() {
            inner.state = EngineState::Ready;
        }
        Ok(())
    }

    async fn set_play_when_ready(&self, play_when_ready: bool) -> Result<()> {
        self.inner.lock().play_when_ready = play_when_ready;
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.released = true;
        inner.state = EngineState::Idle;
        Ok(())
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Catalog that knows a fixed set of groupings and streams every track.
#[derive(Default)]
pub struct FakeCatalog {
    groupings: Mutex<HashMap<String, Vec<TrackReference>>>,
    playback_calls: AtomicUsize,
    grouping_gate: Option<Semaphore>,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_grouping(self: Arc<Self>, id: &str, tracks: Vec<TrackReference>) -> Arc<Self> {
        self.groupings.lock().insert(id.to_string(), tracks);
        self
    }

    /// Catalog whose grouping lookups wait for [`open_gate`](Self::open_gate).
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            grouping_gate: Some(Semaphore::new(0)),
            ..Self::default()
        })
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.grouping_gate {
            gate.add_permits(1);
        }
    }

    pub fn playback_calls(&self) -> usize {
        self.playback_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn playback_data(&self, track_id: &str) -> BridgeResult<PlaybackData> {
        self.playback_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PlaybackData {
            playability: PlayabilityStatus::ok(),
            formats: vec![
                StreamFormat {
                    url: format!("https://cdn/{}/low", track_id),
                    mime_type: "audio/webm".into(),
                    bitrate: 48_000,
                },
                StreamFormat {
                    url: format!("https://cdn/{}/high", track_id),
                    mime_type: "audio/webm".into(),
                    bitrate: 160_000,
                },
            ],
        })
    }

    async fn grouping_tracks(&self, grouping_id: &str) -> BridgeResult<Vec<TrackReference>> {
        if let Some(gate) = &self.grouping_gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.groupings
            .lock()
            .get(grouping_id)
            .cloned()
            .ok_or_else(|| BridgeError::OperationFailed(format!("unknown grouping {}", grouping_id)))
    }
}

// ============================================================================
// Library & Settings
// ============================================================================

#[derive(Default)]
pub struct MemoryLibrary {
    songs: Mutex<HashMap<String, LibrarySong>>,
    add_calls: AtomicUsize,
}

impl MemoryLibrary {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn song(&self, id: &str) -> Option<LibrarySong> {
        self.songs.lock().get(id).cloned()
    }

    pub fn mark_downloaded(&self, id: &str) {
        let mut song = LibrarySong::new(id, id);
        song.download_state = DownloadState::Downloaded;
        self.songs.lock().insert(id.to_string(), song);
    }
}

#[async_trait]
impl LibraryStore for MemoryLibrary {
    async fn download_state(&self, id: &str) -> core_library::Result<DownloadState> {
        Ok(self
            .songs
            .lock()
            .get(id)
            .map(|song| song.download_state)
            .unwrap_or_default())
    }

    fn local_file_path(&self, id: &str) -> PathBuf {
        PathBuf::from("/downloads").join(id)
    }

    async fn add_track(&self, song: &LibrarySong) -> core_library::Result<()> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.songs.lock().insert(song.id.clone(), song.clone());
        Ok(())
    }

    async fn get_track(&self, id: &str) -> core_library::Result<Option<LibrarySong>> {
        Ok(self.song(id))
    }

    async fn set_download_state(&self, id: &str, state: DownloadState) -> core_library::Result<()> {
        match self.songs.lock().get_mut(id) {
            Some(song) => {
                song.download_state = state;
                Ok(())
            }
            None => Err(core_library::LibraryError::NotFound { id: id.to_string() }),
        }
    }
}

#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set_bool(&self, key: &str, value: bool) -> BridgeResult<()> {
        self.set_string(key, if value { "true" } else { "false" }).await
    }

    async fn get_bool(&self, key: &str) -> BridgeResult<Option<bool>> {
        Ok(self.values.lock().get(key).map(|v| v == "true"))
    }

    async fn set_i64(&self, key: &str, value: i64) -> BridgeResult<()> {
        self.set_string(key, &value.to_string()).await
    }

    async fn get_i64(&self, key: &str) -> BridgeResult<Option<i64>> {
        Ok(self
            .values
            .lock()
            .get(key)
            .and_then(|v| v.parse().ok()))
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

// ============================================================================
// Network
// ============================================================================

mock! {
    pub Network {}

    #[async_trait]
    impl NetworkMonitor for Network {
        async fn get_network_info(&self) -> BridgeResult<NetworkInfo>;
    }
}

pub fn network(metered: bool) -> MockNetwork {
    let mut mock = MockNetwork::new();
    mock.expect_get_network_info().returning(move || {
        Ok(NetworkInfo::connected(
            if metered {
                NetworkType::Cellular
            } else {
                NetworkType::WiFi
            },
            metered,
        ))
    });
    mock
}

// ============================================================================
// Queue providers
// ============================================================================

/// Paged provider whose initial status and pages wait for [`release`].
///
/// [`release`]: GatedQueue::release
pub struct GatedQueue {
    initial: Vec<TrackReference>,
    pages: Mutex<Vec<Vec<TrackReference>>>,
    gate: Semaphore,
}

impl GatedQueue {
    pub fn new(initial: Vec<TrackReference>, pages: Vec<Vec<TrackReference>>) -> Arc<Self> {
        Arc::new(Self {
            initial,
            pages: Mutex::new(pages),
            gate: Semaphore::new(0),
        })
    }

    /// Let one pending `initial_status` or `next_page` call through.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    async fn wait(&self) {
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
    }
}

#[async_trait]
impl QueueProvider for GatedQueue {
    async fn initial_status(&self) -> Result<QueueStatus> {
        self.wait().await;
        Ok(QueueStatus::new(self.initial.clone(), 0))
    }

    fn has_next_page(&self) -> bool {
        !self.pages.lock().is_empty()
    }

    async fn next_page(&self) -> Result<Vec<TrackReference>> {
        self.wait().await;
        let mut pages = self.pages.lock();
        if pages.is_empty() {
            return Ok(Vec::new());
        }
        Ok(pages.remove(0))
    }
}

/// Provider whose pages always fail.
pub struct FailingPages {
    pub initial: Vec<TrackReference>,
}

#[async_trait]
impl QueueProvider for FailingPages {
    async fn initial_status(&self) -> Result<QueueStatus> {
        Ok(QueueStatus::new(self.initial.clone(), 0))
    }

    fn has_next_page(&self) -> bool {
        true
    }

    async fn next_page(&self) -> Result<Vec<TrackReference>> {
        Err(PlaybackError::PaginationFailure("continuation expired".into()))
    }
}

// ============================================================================
// Session harness
// ============================================================================

pub struct Harness {
    pub engine: Arc<FakeEngine>,
    pub catalog: Arc<FakeCatalog>,
    pub library: Arc<MemoryLibrary>,
    pub settings: Arc<MemorySettings>,
    pub events: EventBus,
    pub sender: EngineEventSender,
    pub session: PlaybackSession,
}

impl Harness {
    pub fn start() -> Self {
        Self::start_with(FakeCatalog::new(), false)
    }

    pub fn start_with(catalog: Arc<FakeCatalog>, metered: bool) -> Self {
        let engine = FakeEngine::new();
        let library = MemoryLibrary::new();
        let settings = MemorySettings::new();
        let events = EventBus::new(64);
        let (sender, receiver) = EngineEventSender::channel();

        let deps = SessionDeps {
            library: library.clone(),
            catalog: catalog.clone(),
            network: Arc::new(network(metered)),
            settings: settings.clone(),
            events: events.clone(),
        };
        let session =
            PlaybackSession::start(deps, engine.clone(), receiver, PlaybackConfig::default())
                .expect("session should start");

        Self {
            engine,
            catalog,
            library,
            settings,
            events,
            sender,
            session,
        }
    }

    /// Install `tracks` and wait until the engine has them.
    pub async fn install(&self, tracks: Vec<TrackReference>, start_index: usize) {
        self.session
            .controller()
            .play_queue(Arc::new(core_playback::ListQueue::new(tracks, start_index)))
            .await
            .expect("play_queue")
            .await
            .expect("install task")
            .expect("install");
    }
}

/// Wait for the first bus event matching `predicate`.
pub async fn next_event<F>(rx: &mut broadcast::Receiver<CoreEvent>, predicate: F) -> CoreEvent
where
    F: Fn(&CoreEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
