//! Core service façade and bootstrap.
//!
//! Turns a validated [`CoreConfig`] into a running playback session: opens
//! the library database, builds the catalog (injected, or the HTTP catalog
//! over the host's client) and starts a [`PlaybackSession`] against the
//! host's engine.
//!
//! ```rust,ignore
//! let (sender, receiver) = EngineEventSender::channel();
//! let engine = Arc::new(HostEngine::new(sender));
//!
//! let core = CoreService::bootstrap(config, engine, receiver).await?;
//! let mut events = core.subscribe();
//! core.session().controller().play_queue(provider).await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::CatalogService;
use core_library::db::{create_pool, DatabaseConfig};
use core_library::{LibraryStore, SqliteLibraryStore};
use core_playback::{
    EngineEventReceiver, PlaybackConfig, PlaybackEngine, PlaybackSession, SessionDeps,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus};
use provider_catalog::CatalogConnector;
use tokio::sync::broadcast::Receiver;
use tracing::{info, instrument};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    session: Arc<PlaybackSession>,
    library: Arc<dyn LibraryStore>,
    events: EventBus,
}

impl CoreService {
    /// Open the library, build the catalog and start the playback session.
    ///
    /// Must be called inside a tokio runtime; session tasks run on it.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CapabilityMissing`] when no catalog can be built
    /// - [`CoreError::Library`] when the database cannot be opened or migrated
    /// - [`CoreError::Playback`] when the session cannot start
    #[instrument(skip_all, fields(database = %config.database_path.display()))]
    pub async fn bootstrap(
        config: CoreConfig,
        engine: Arc<dyn PlaybackEngine>,
        receiver: EngineEventReceiver,
    ) -> Result<Self> {
        config.validate()?;

        let pool = create_pool(DatabaseConfig::new(&config.database_path)).await?;
        let library: Arc<dyn LibraryStore> =
            Arc::new(SqliteLibraryStore::new(pool, &config.downloads_dir));
        let catalog = build_catalog(&config)?;
        let events = EventBus::new(config.event_buffer);

        let deps = SessionDeps {
            library: library.clone(),
            catalog,
            network: config.network_monitor.clone(),
            settings: config.settings_store.clone(),
            events: events.clone(),
        };
        let playback = PlaybackConfig::default().with_refill_threshold(config.refill_threshold);
        let session = PlaybackSession::start(deps, engine, receiver, playback)?;

        info!("Core service ready");
        Ok(Self {
            session: Arc::new(session),
            library,
            events,
        })
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn library(&self) -> &Arc<dyn LibraryStore> {
        &self.library
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to queue, library and session events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Release the session. Idempotent.
    pub async fn shutdown(&self) {
        self.session.release().await;
    }
}

fn build_catalog(config: &CoreConfig) -> Result<Arc<dyn CatalogService>> {
    if let Some(catalog) = &config.catalog {
        return Ok(catalog.clone());
    }

    match (&config.http_client, &config.catalog_base_url) {
        (Some(client), Some(base_url)) => {
            info!(base_url = %base_url, "Using HTTP catalog");
            Ok(Arc::new(CatalogConnector::new(client.clone(), base_url.clone())))
        }
        _ => Err(CoreError::CapabilityMissing {
            capability: "CatalogService".to_string(),
            message: "Inject a CatalogService, or provide both an HttpClient and a catalog base URL."
                .to_string(),
        }),
    }
}
