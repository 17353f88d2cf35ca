//! Workspace placeholder crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates. Host applications can depend on `cadence-workspace` and enable
//! `service` (the full bootstrap façade) or `playback-only` (just the queue
//! controller and its collaborators) without wiring each crate individually.

#[cfg(feature = "service")]
pub use core_service;

#[cfg(feature = "playback-only")]
pub use core_playback;
