//! # Playback Configuration
//!
//! Tuning knobs for a playback session.

use serde::{Deserialize, Serialize};

/// Settings key of the auto-add preference.
pub const AUTO_ADD_SONG_KEY: &str = "auto_add_song";

/// Playback session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// The next page is requested once fewer than this many entries remain,
    /// counting from the active one.
    ///
    /// Default: 6.
    #[serde(default = "default_refill_threshold")]
    pub refill_threshold: usize,

    /// Settings key read to decide whether played tracks are added to the
    /// library.
    #[serde(default = "default_auto_add_key")]
    pub auto_add_key: String,

    /// Value used when the preference has never been written.
    ///
    /// Default: true.
    #[serde(default = "default_auto_add")]
    pub default_auto_add: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            refill_threshold: default_refill_threshold(),
            auto_add_key: default_auto_add_key(),
            default_auto_add: default_auto_add(),
        }
    }
}

impl PlaybackConfig {
    pub fn with_refill_threshold(mut self, threshold: usize) -> Self {
        self.refill_threshold = threshold;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.refill_threshold == 0 {
            return Err("refill_threshold must be > 0".to_string());
        }

        if self.auto_add_key.trim().is_empty() {
            return Err("auto_add_key cannot be empty".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_refill_threshold() -> usize {
    core_runtime::config::DEFAULT_REFILL_THRESHOLD
}

fn default_auto_add_key() -> String {
    AUTO_ADD_SONG_KEY.to_string()
}

fn default_auto_add() -> bool {
    true
}
