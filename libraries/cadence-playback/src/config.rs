//! Playback and service configuration

use crate::types::RepeatMode;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// User-facing playback preferences
///
/// The core never writes these; they are read at each decision point so
/// that changes made by the UI take effect on the next command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Repeat mode (default: Off)
    #[serde(default)]
    pub repeat: RepeatMode,

    /// Pre-arm the next track for gapless playback (default: true)
    #[serde(default = "default_true")]
    pub gapless: bool,

    /// Empty the queue once the last track finishes with repeat off (default: false)
    #[serde(default)]
    pub clear_playlist_on_finish: bool,

    /// Delete the server bookmark of a track that played to the end (default: false)
    #[serde(default)]
    pub clear_bookmark_on_finish: bool,

    /// Show a playback notification at all (default: true)
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Keep the notification visible while paused or preparing (default: false)
    #[serde(default)]
    pub notification_always_visible: bool,

    /// Include the five-star rating in notifications (default: false)
    #[serde(default)]
    pub show_rating: bool,

    /// Edge length of notification artwork in pixels (default: 256)
    #[serde(default = "default_image_size")]
    pub notification_image_size: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            repeat: RepeatMode::Off,
            gapless: true,
            clear_playlist_on_finish: false,
            clear_bookmark_on_finish: false,
            notifications_enabled: true,
            notification_always_visible: false,
            show_rating: false,
            notification_image_size: default_image_size(),
        }
    }
}

/// Settings of the service worker thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// How long a caller waits for a command to be processed (default: 2000)
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Readiness probes before giving up on startup (default: 20)
    #[serde(default = "default_startup_attempts")]
    pub startup_attempts: u32,

    /// Wait per readiness probe (default: 50)
    #[serde(default = "default_startup_retry_delay_ms")]
    pub startup_retry_delay_ms: u64,

    /// Capacity of the command channel (default: 64)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl ServiceConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn startup_retry_delay(&self) -> Duration {
        Duration::from_millis(self.startup_retry_delay_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: default_command_timeout_ms(),
            startup_attempts: default_startup_attempts(),
            startup_retry_delay_ms: default_startup_retry_delay_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Shared, live view of [`PlaybackConfig`]
///
/// Cloning yields another handle to the same preferences.
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    inner: Arc<RwLock<PlaybackConfig>>,
}

impl Preferences {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current preferences
    pub fn snapshot(&self) -> PlaybackConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Modify the preferences in place
    pub fn update(&self, f: impl FnOnce(&mut PlaybackConfig)) {
        let mut config = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut config);
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .repeat
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        self.update(|config| config.repeat = mode);
    }
}

// Default values
fn default_true() -> bool {
    true
}

fn default_image_size() -> u32 {
    256
}

fn default_command_timeout_ms() -> u64 {
    2000
}

fn default_startup_attempts() -> u32 {
    20
}

fn default_startup_retry_delay_ms() -> u64 {
    50
}

fn default_queue_capacity() -> usize {
    64
}
