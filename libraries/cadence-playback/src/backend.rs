//! Playback backends
//!
//! Abstracts the two places audio can actually play:
//! - the local decoder ([`LocalBackend`]), position in milliseconds
//! - a remote "jukebox" player ([`RemoteBackend`]), position in whole seconds
//!
//! [`BackendSelector`] routes every transport operation to whichever one
//! is active, based on the remote backend's own capability flag.

use crate::error::Result;
use crate::types::{EntryId, PlayerState, QueuedTrack};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Notifications a local backend sends back to the playback manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// The current track is prepared and about to start
    Prepared,

    /// The backend wants the next track pre-armed
    NextSongRequested,

    /// The backend switched tracks on its own (gapless transition)
    CurrentPlayingChanged(Option<EntryId>),

    /// The backend's playback thread moved to a new state
    PlayerStateChanged(PlayerState),

    /// The current track played to the end
    SongCompleted,
}

/// Callback registration handed to [`LocalBackend::init`]
///
/// Resolved once at construction. The backend may call these from any
/// thread, including from inside a call made by the manager.
#[derive(Clone)]
pub struct BackendCallbacks {
    sink: Arc<dyn Fn(BackendEvent) + Send + Sync>,
}

impl BackendCallbacks {
    pub fn new(sink: impl Fn(BackendEvent) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    pub fn prepared(&self) {
        (self.sink)(BackendEvent::Prepared);
    }

    pub fn next_song_requested(&self) {
        (self.sink)(BackendEvent::NextSongRequested);
    }

    pub fn current_playing_changed(&self, entry: Option<EntryId>) {
        (self.sink)(BackendEvent::CurrentPlayingChanged(entry));
    }

    pub fn player_state_changed(&self, state: PlayerState) {
        (self.sink)(BackendEvent::PlayerStateChanged(state));
    }

    pub fn song_completed(&self) {
        (self.sink)(BackendEvent::SongCompleted);
    }
}

impl fmt::Debug for BackendCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendCallbacks").finish_non_exhaustive()
    }
}

/// Local decoder/output
///
/// All calls are expected to be non-blocking handoffs to the backend's
/// own playback thread. Progress is reported through [`BackendCallbacks`].
pub trait LocalBackend: Send {
    /// Install callbacks and allocate resources
    fn init(&mut self, callbacks: BackendCallbacks) -> Result<()>;

    /// Begin playing `track` from the start
    ///
    /// The backend reports Downloading/Preparing/Started as it goes.
    fn play(&mut self, track: &Arc<QueuedTrack>) -> Result<()>;

    /// Pause output
    fn pause(&mut self) -> Result<()>;

    /// Resume output
    fn start(&mut self) -> Result<()>;

    /// Seek inside the current track
    fn seek_to(&mut self, position: Duration) -> Result<()>;

    /// Drop the current track and return to idle
    fn reset(&mut self) -> Result<()>;

    /// Record the selected entry (no transport change)
    fn set_current_playing(&mut self, track: Option<&Arc<QueuedTrack>>);

    /// Pre-buffer the entry that plays after the current one
    fn set_next_playing(&mut self, track: &Arc<QueuedTrack>);

    /// Forget the pre-armed entry; `immediate` also drops buffered data
    fn clear_next_playing(&mut self, immediate: bool);

    /// Release every resource; called once on shutdown
    fn release(&mut self) -> Result<()>;

    /// Position inside the current track
    fn position(&self) -> Duration;

    /// Duration of the current track, when known
    fn duration(&self) -> Option<Duration>;
}

/// Remote "jukebox" player controlled over the network
pub trait RemoteBackend: Send {
    /// Whether remote playback is currently switched on
    fn is_enabled(&self) -> bool;

    /// Resume playback on the remote player
    fn start(&mut self) -> Result<()>;

    /// Stop playback on the remote player
    fn stop(&mut self) -> Result<()>;

    /// Jump to `index` in the remote playlist at `offset_secs`
    fn skip(&mut self, index: usize, offset_secs: u32) -> Result<()>;

    /// Position inside the current remote track
    fn position_secs(&self) -> u32;

    /// Replace the remote playlist with `entries`
    fn update_playlist(&mut self, entries: &[Arc<QueuedTrack>]) -> Result<()>;
}

/// Remote backend for setups without a jukebox
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRemote;

impl RemoteBackend for DisabledRemote {
    fn is_enabled(&self) -> bool {
        false
    }

    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn skip(&mut self, _index: usize, _offset_secs: u32) -> Result<()> {
        Ok(())
    }

    fn position_secs(&self) -> u32 {
        0
    }

    fn update_playlist(&mut self, _entries: &[Arc<QueuedTrack>]) -> Result<()> {
        Ok(())
    }
}

/// Pure dispatch between local and remote playback
///
/// Holds no state of its own: every call asks the remote backend whether
/// it is enabled.
pub struct BackendSelector {
    local: Box<dyn LocalBackend>,
    remote: Box<dyn RemoteBackend>,
}

impl BackendSelector {
    pub fn new(local: Box<dyn LocalBackend>, remote: Box<dyn RemoteBackend>) -> Self {
        Self { local, remote }
    }

    /// Whether transport goes to the remote backend
    pub fn is_remote(&self) -> bool {
        self.remote.is_enabled()
    }

    /// Start playing the entry at `index` from the beginning
    pub fn begin(&mut self, index: usize, track: &Arc<QueuedTrack>) -> Result<()> {
        if self.is_remote() {
            self.remote.skip(index, 0)
        } else {
            self.local.play(track)
        }
    }

    /// Resume playback
    pub fn resume(&mut self) -> Result<()> {
        if self.is_remote() {
            self.remote.start()
        } else {
            self.local.start()
        }
    }

    /// Pause (local) or stop (remote) playback
    pub fn halt(&mut self) -> Result<()> {
        if self.is_remote() {
            self.remote.stop()
        } else {
            self.local.pause()
        }
    }

    /// Seek inside the current track
    ///
    /// The remote player only takes whole seconds and needs the queue index.
    pub fn seek(&mut self, index: Option<usize>, position: Duration) -> Result<()> {
        if self.is_remote() {
            match index {
                Some(index) => {
                    let secs = u32::try_from(position.as_secs()).unwrap_or(u32::MAX);
                    self.remote.skip(index, secs)
                }
                None => Ok(()),
            }
        } else {
            self.local.seek_to(position)
        }
    }

    /// Position inside the current track
    pub fn position(&self) -> Duration {
        if self.is_remote() {
            Duration::from_secs(u64::from(self.remote.position_secs()))
        } else {
            self.local.position()
        }
    }

    pub fn local(&self) -> &dyn LocalBackend {
        self.local.as_ref()
    }

    pub fn local_mut(&mut self) -> &mut dyn LocalBackend {
        self.local.as_mut()
    }

    pub fn remote_mut(&mut self) -> &mut dyn RemoteBackend {
        self.remote.as_mut()
    }
}
