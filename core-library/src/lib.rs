//! # Local Library
//!
//! The user's on-device library: songs added by playing them through or by
//! hand, and whether each one is available offline.
//!
//! - [`db`] opens the SQLite database and applies the embedded migrations
//! - [`store::LibraryStore`] is what the playback core reads and writes
//! - [`models`] holds the persisted records

pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use error::{LibraryError, Result};
pub use models::{DownloadState, LibrarySong};
pub use store::{LibraryStore, SqliteLibraryStore};
