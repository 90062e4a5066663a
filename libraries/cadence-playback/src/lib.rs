//! Cadence - Playback Orchestration
//!
//! Platform-agnostic playback orchestration for a streaming music client.
//!
//! This crate provides:
//! - Track queue with stable entry identity (append, play next, replace, remove, reorder)
//! - Repeat modes (Off, All, Single) and gapless pre-arming
//! - Routing between a local decoder and a remote "jukebox" player
//! - Player state machine (play/pause/stop/seek/toggle)
//! - Fan-out of state changes to transport, widget, notification and scrobble observers
//! - Queue persistence after every state-affecting change
//!
//! # Architecture
//!
//! `cadence-playback` does no audio work and no I/O of its own:
//! - Decoding and output live behind [`LocalBackend`]
//! - The jukebox lives behind [`RemoteBackend`]
//! - Downloads, persistence and music-service calls are traits in [`collaborators`]
//!
//! [`PlaybackManager`] is the synchronous state machine. [`PlaybackService`]
//! moves it onto a worker thread and serializes user commands and backend
//! callbacks through channels.
//!
//! # Example: Running the service
//!
//! ```rust,no_run
//! use cadence_playback::{
//!     BackendCallbacks, EnqueueMode, LocalBackend, PlaybackManager, PlaybackService,
//!     QueuedTrack, Result, ServiceConfig, Track,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! // Implement LocalBackend for your platform
//! struct MyDecoder;
//!
//! impl LocalBackend for MyDecoder {
//!     fn init(&mut self, _callbacks: BackendCallbacks) -> Result<()> { Ok(()) }
//!     fn play(&mut self, _track: &Arc<QueuedTrack>) -> Result<()> { Ok(()) }
//!     fn pause(&mut self) -> Result<()> { Ok(()) }
//!     fn start(&mut self) -> Result<()> { Ok(()) }
//!     fn seek_to(&mut self, _position: Duration) -> Result<()> { Ok(()) }
//!     fn reset(&mut self) -> Result<()> { Ok(()) }
//!     fn set_current_playing(&mut self, _track: Option<&Arc<QueuedTrack>>) {}
//!     fn set_next_playing(&mut self, _track: &Arc<QueuedTrack>) {}
//!     fn clear_next_playing(&mut self, _immediate: bool) {}
//!     fn release(&mut self) -> Result<()> { Ok(()) }
//!     fn position(&self) -> Duration { Duration::ZERO }
//!     fn duration(&self) -> Option<Duration> { None }
//! }
//!
//! let manager = PlaybackManager::builder(MyDecoder).build();
//! let service = PlaybackService::spawn(manager, ServiceConfig::default())?;
//! let handle = service.handle();
//! handle.wait_ready()?;
//!
//! handle.enqueue(vec![Track::new("t1", "My Song")], EnqueueMode::Append, true)?;
//! handle.toggle_play_pause()?;
//! # Ok::<(), cadence_playback::PlaybackError>(())
//! ```

pub mod advancer;
pub mod backend;
pub mod collaborators;
pub mod config;
mod error;
pub mod events;
mod manager;
pub mod queue;
mod service;
mod session;
pub mod types;

// Public exports
pub use backend::{
    BackendCallbacks, BackendEvent, BackendSelector, DisabledRemote, LocalBackend, RemoteBackend,
};
pub use collaborators::{
    CoverArtSource, DownloadScheduler, MusicService, NoDownloads, NoPersistence,
    OfflineMusicService, QueueStore,
};
pub use config::{PlaybackConfig, Preferences, ServiceConfig};
pub use error::{PlaybackError, Result};
pub use events::{
    Artwork, EventBroadcaster, NotificationContent, NotificationPresenter, NowPlayingSurface,
    PlaybackChange, Scrobbler, ServiceLifecycle, TransportListener, WidgetSurface,
};
pub use manager::{PlaybackManager, PlaybackManagerBuilder};
pub use queue::{EnqueueMode, TrackQueue};
pub use service::{PlaybackCommand, PlaybackService, ServiceHandle};
pub use session::PlaybackSession;
pub use types::{
    DownloadStatus, EntryId, PlaybackStatus, PlayerState, QueueSnapshot, QueuedTrack, RepeatMode,
    Track,
};
