//! Core types for playback orchestration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

/// Track metadata as delivered by the music service
///
/// Eagerly loaded when the track is queued so that notifications,
/// widgets and scrobbles never need to go back to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Identifier of the track on the music service
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name (optional)
    #[serde(default)]
    pub artist: Option<String>,

    /// Album name (optional)
    #[serde(default)]
    pub album: Option<String>,

    /// Track duration, when known
    #[serde(default)]
    pub duration: Option<Duration>,

    /// User rating from 0 to 5
    #[serde(default)]
    pub user_rating: Option<u8>,

    /// Saved resume position on the server
    #[serde(default)]
    pub bookmark_position: Option<Duration>,

    /// Cover art identifier on the music service
    #[serde(default)]
    pub cover_art: Option<String>,
}

impl Track {
    /// Create a track with only an id and a title
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: None,
            album: None,
            duration: None,
            user_rating: None,
            bookmark_position: None,
            cover_art: None,
        }
    }

    /// Whether the server holds a non-zero bookmark for this track
    pub fn has_bookmark(&self) -> bool {
        self.bookmark_position.is_some_and(|p| !p.is_zero())
    }
}

/// Identity of one queue entry
///
/// Two entries referencing the same [`Track`] still have distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}

/// Download/availability status of a queued track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DownloadStatus {
    /// Not downloaded yet
    Pending = 0,

    /// Download in progress
    Downloading = 1,

    /// Fully available for local playback
    Completed = 2,

    /// Download failed
    Failed = 3,
}

impl DownloadStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => DownloadStatus::Downloading,
            2 => DownloadStatus::Completed,
            3 => DownloadStatus::Failed,
            _ => DownloadStatus::Pending,
        }
    }
}

/// One entry of the track queue
///
/// Entries are shared (`Arc<QueuedTrack>`) between the queue and the
/// playback session. The download status is updated in place by the
/// download scheduler, so it lives behind an atomic.
#[derive(Debug)]
pub struct QueuedTrack {
    entry_id: EntryId,
    track: Track,
    status: AtomicU8,
}

impl QueuedTrack {
    /// Wrap a track into a queue entry
    pub fn new(entry_id: EntryId, track: Track) -> Self {
        Self {
            entry_id,
            track,
            status: AtomicU8::new(DownloadStatus::Pending as u8),
        }
    }

    /// Stable identity of this entry
    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    /// Track metadata
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Current download status
    pub fn status(&self) -> DownloadStatus {
        DownloadStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Update the download status
    pub fn set_status(&self, status: DownloadStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    /// Whether the track can be played without further downloading
    pub fn is_available(&self) -> bool {
        self.status() == DownloadStatus::Completed
    }
}

/// Player state
///
/// Owned exclusively by the [`PlaybackManager`](crate::PlaybackManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    /// Nothing loaded
    #[default]
    Idle,

    /// Waiting for track data
    Downloading,

    /// Decoder is preparing the track
    Preparing,

    /// Playing
    Started,

    /// Paused mid-track
    Paused,

    /// Stopped by the user
    Stopped,

    /// Reached the end of the track
    Completed,
}

impl PlayerState {
    /// Whether a playback position is meaningful in this state
    pub fn has_position(self) -> bool {
        !matches!(
            self,
            PlayerState::Idle | PlayerState::Downloading | PlayerState::Preparing
        )
    }

    /// States from which `start()` resumes playback
    pub fn is_resumable(self) -> bool {
        matches!(
            self,
            PlayerState::Paused | PlayerState::Completed | PlayerState::Stopped
        )
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlayerState::Idle => "idle",
            PlayerState::Downloading => "downloading",
            PlayerState::Preparing => "preparing",
            PlayerState::Started => "started",
            PlayerState::Paused => "paused",
            PlayerState::Stopped => "stopped",
            PlayerState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    Single,
}

/// Persisted queue and position
///
/// This is the whole persistence contract: the ordered tracks, the
/// selected index and the position inside the selected track.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Queued tracks in play order
    pub tracks: Vec<Track>,

    /// Selected index, if any
    pub current_index: Option<usize>,

    /// Position inside the selected track in milliseconds
    pub position_ms: u64,
}

/// Consistent view of the playback state for UIs
#[derive(Debug, Clone)]
pub struct PlaybackStatus {
    pub state: PlayerState,
    pub current_index: Option<usize>,
    pub current: Option<Track>,
    pub next: Option<Track>,
    pub queue_len: usize,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub remote: bool,
}
