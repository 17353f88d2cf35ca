//! # Playback Core
//!
//! Queue-driven playback control on top of a host-provided engine.
//!
//! ## Overview
//!
//! This crate handles:
//! - Resolving tracks to downloaded files or network-appropriate remote
//!   streams ([`MediaResolver`])
//! - Installing paginated queues and appending pages as playback advances
//!   ([`QueueController`])
//! - Remote-controller commands over the queue ([`SessionCommandBridge`])
//! - Adding played-through tracks to the local library
//!   ([`AutoLibraryCurator`])
//!
//! Decoding and rendering stay in the host's [`PlaybackEngine`]; the engine
//! reports back through an [`EngineEventSender`] and a [`PlaybackSession`]
//! routes those events.

pub mod config;
pub mod curator;
pub mod error;
pub mod events;
pub mod player;
pub mod queue;
pub mod resolver;
pub mod scope;
pub mod session;
pub mod traits;
pub mod types;

pub use config::PlaybackConfig;
pub use curator::AutoLibraryCurator;
pub use error::{PlaybackError, Result};
pub use events::{
    DiscontinuityReason, EngineEventReceiver, EngineEventSender, EngineState, PlaybackEvent,
    PositionInfo, TransitionReason,
};
pub use player::{PlaybackSession, SessionDeps};
pub use queue::{
    EmptyQueue, GroupingQueue, InsertPosition, ListQueue, QueueController, QueueProvider,
};
pub use resolver::MediaResolver;
pub use scope::SessionScope;
pub use session::{Command, CommandAck, SessionCommandBridge};
pub use traits::{PlaybackEngine, SourceResolver};
pub use types::{MediaDescription, PlayableItem, QueueStatus, ResolvedSource};
