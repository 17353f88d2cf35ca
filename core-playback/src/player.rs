//! # Playback Session
//!
//! Wires the queue controller, the command bridge and the library curator
//! to one host engine, and runs the task that routes engine events to them.
//!
//! ```text
//!  engine callbacks ──> EngineEventSender ──> dispatcher ─┬─> QueueController (pagination)
//!                                                         └─> AutoLibraryCurator (library writes)
//!  remote controller ──> SessionCommandBridge ──> QueueController / engine
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (sender, receiver) = EngineEventSender::channel();
//! let engine = Arc::new(HostEngine::new(sender));
//!
//! let session = PlaybackSession::start(deps, engine, receiver, PlaybackConfig::default())?;
//! session.controller().play_queue(Arc::new(ListQueue::new(tracks, 0))).await?;
//! // ...
//! session.release().await;
//! ```

use bridge_traits::{CatalogService, NetworkMonitor, SettingsStore};
use core_library::LibraryStore;
use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::curator::AutoLibraryCurator;
use crate::error::{PlaybackError, Result};
use crate::events::{EngineEventReceiver, PlaybackEvent};
use crate::queue::QueueController;
use crate::resolver::MediaResolver;
use crate::scope::SessionScope;
use crate::session::SessionCommandBridge;
use crate::traits::PlaybackEngine;

/// Collaborators a session needs besides the engine.
#[derive(Clone)]
pub struct SessionDeps {
    pub library: Arc<dyn LibraryStore>,
    pub catalog: Arc<dyn CatalogService>,
    pub network: Arc<dyn NetworkMonitor>,
    pub settings: Arc<dyn SettingsStore>,
    pub events: EventBus,
}

pub struct PlaybackSession {
    scope: SessionScope,
    engine: Arc<dyn PlaybackEngine>,
    controller: QueueController,
    commands: SessionCommandBridge,
    curator: AutoLibraryCurator,
    events: EventBus,
    released: AtomicBool,
}

impl PlaybackSession {
    /// Start a session on the current tokio runtime.
    ///
    /// `receiver` must be the other half of the sender the engine reports
    /// through.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Internal`] for an invalid configuration or when
    /// called outside a runtime.
    pub fn start(
        deps: SessionDeps,
        engine: Arc<dyn PlaybackEngine>,
        receiver: EngineEventReceiver,
        config: PlaybackConfig,
    ) -> Result<Self> {
        Self::start_in(SessionScope::current()?, deps, engine, receiver, config)
    }

    /// Start a session whose tasks run in `scope`.
    pub fn start_in(
        scope: SessionScope,
        deps: SessionDeps,
        engine: Arc<dyn PlaybackEngine>,
        receiver: EngineEventReceiver,
        config: PlaybackConfig,
    ) -> Result<Self> {
        config.validate().map_err(PlaybackError::Internal)?;

        let resolver = Arc::new(MediaResolver::new(
            deps.library.clone(),
            deps.catalog.clone(),
            deps.network.clone(),
        ));
        let controller = QueueController::new(
            engine.clone(),
            resolver,
            deps.catalog.clone(),
            deps.events.clone(),
            scope.clone(),
            config.refill_threshold,
        );
        let curator = AutoLibraryCurator::new(
            deps.settings.clone(),
            deps.library.clone(),
            engine.clone(),
            deps.events.clone(),
            scope.clone(),
            &config,
        );
        let commands =
            SessionCommandBridge::new(controller.clone(), curator.clone(), deps.events.clone());

        scope.spawn(dispatch_events(
            receiver,
            controller.clone(),
            curator.clone(),
            deps.events.clone(),
            scope.clone(),
        ));

        info!(
            refill_threshold = config.refill_threshold,
            "Playback session started"
        );
        Ok(Self {
            scope,
            engine,
            controller,
            commands,
            curator,
            events: deps.events,
            released: AtomicBool::new(false),
        })
    }

    pub fn controller(&self) -> &QueueController {
        &self.controller
    }

    pub fn commands(&self) -> &SessionCommandBridge {
        &self.commands
    }

    pub fn curator(&self) -> &AutoLibraryCurator {
        &self.curator
    }

    pub fn engine(&self) -> &Arc<dyn PlaybackEngine> {
        &self.engine
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Cancel pagination, release the engine and wait for every session
    /// task to finish. Calling it again does nothing.
    pub async fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Err(e) = self.controller.release().await {
            warn!(error = %e, "Engine release failed");
        }
        self.scope.shutdown().await;

        info!("Playback session released");
        let _ = self
            .events
            .emit(CoreEvent::Session(SessionEvent::Released));
    }
}

async fn dispatch_events(
    mut receiver: EngineEventReceiver,
    controller: QueueController,
    curator: AutoLibraryCurator,
    events: EventBus,
    scope: SessionScope,
) {
    loop {
        let event = tokio::select! {
            _ = scope.token().cancelled() => break,
            event = receiver.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match &event {
            PlaybackEvent::ItemTransition { reason } => {
                controller.on_item_transition(*reason).await;
            }
            PlaybackEvent::PositionDiscontinuity { .. } | PlaybackEvent::StateChanged { .. } => {
                curator.on_event(&event).await;
            }
            PlaybackEvent::PlayerError {
                track_id,
                message,
                recoverable,
            } => {
                warn!(track_id = ?track_id, %message, recoverable, "Engine reported an error");
                let _ = events.emit(CoreEvent::Session(SessionEvent::PlaybackError {
                    track_id: track_id.clone(),
                    message: message.clone(),
                    recoverable: *recoverable,
                }));
            }
        }
    }
    debug!("Engine event dispatcher stopped");
}
