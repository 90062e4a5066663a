//! External collaborators consumed by the playback manager
//!
//! Downloading, persistence and music-service calls live outside this
//! crate; the manager only sees these traits.

use crate::error::Result;
use crate::queue::TrackQueue;
use crate::types::{QueueSnapshot, Track};

/// Download scheduling for queued tracks
pub trait DownloadScheduler: Send {
    /// Make sure the current and upcoming entries are being fetched
    fn check_downloads(&mut self, queue: &TrackQueue);

    /// Cancel and forget all scheduled downloads
    fn clear(&mut self);

    /// Stop the scheduler; called once on shutdown
    fn stop(&mut self) -> Result<()>;
}

/// Queue persistence sink
///
/// Called after every state-affecting mutation. Implementations should
/// hand the snapshot off instead of blocking on I/O.
pub trait QueueStore: Send {
    fn save(&mut self, snapshot: &QueueSnapshot) -> Result<()>;
}

/// Music service calls the manager makes on its own
pub trait MusicService: Send {
    /// Remove the server-side resume bookmark of a track
    fn delete_bookmark(&mut self, track_id: &str) -> Result<()>;
}

/// Album artwork lookup for notifications
pub trait CoverArtSource: Send {
    /// Encoded image bytes at roughly `size` pixels, `None` if the track has no art
    fn cover_art(&mut self, track: &Track, size: u32) -> Result<Option<Vec<u8>>>;
}

/// Scheduler that never downloads anything (all tracks already local)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDownloads;

impl DownloadScheduler for NoDownloads {
    fn check_downloads(&mut self, _queue: &TrackQueue) {}

    fn clear(&mut self) {}

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Store that drops every snapshot
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

impl QueueStore for NoPersistence {
    fn save(&mut self, _snapshot: &QueueSnapshot) -> Result<()> {
        Ok(())
    }
}

/// Music service for offline setups
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineMusicService;

impl MusicService for OfflineMusicService {
    fn delete_bookmark(&mut self, _track_id: &str) -> Result<()> {
        Ok(())
    }
}
