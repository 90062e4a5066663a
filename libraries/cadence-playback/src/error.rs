//! Error types for playback orchestration

use std::time::Duration;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Local or remote backend rejected an operation
    #[error("Backend error: {0}")]
    Backend(String),

    /// The playback service is not running (never started or already shut down)
    #[error("Playback service unavailable")]
    ServiceUnavailable,

    /// The playback service did not answer in time
    #[error("Playback service did not respond within {0:?}")]
    Timeout(Duration),

    /// Queue persistence failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Music service call failed
    #[error("Music service error: {0}")]
    MusicService(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
