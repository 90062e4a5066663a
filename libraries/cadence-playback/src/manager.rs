//! Playback manager - core orchestration
//!
//! Owns the queue, the player state and the playback session, routes
//! transport to the active backend and publishes every change to the
//! event broadcaster.
//!
//! The manager is a plain `&mut self` state machine. Exclusive access is
//! provided by its owner, normally the [`PlaybackService`](crate::PlaybackService)
//! worker thread.

use crate::{
    advancer::{self, Advance},
    backend::{BackendCallbacks, BackendEvent, BackendSelector, DisabledRemote, LocalBackend, RemoteBackend},
    collaborators::{
        DownloadScheduler, MusicService, NoDownloads, NoPersistence, OfflineMusicService, QueueStore,
    },
    config::Preferences,
    error::Result,
    events::{EventBroadcaster, Observed},
    queue::{EnqueueMode, TrackQueue},
    session::PlaybackSession,
    types::{PlaybackStatus, PlayerState, QueueSnapshot, QueuedTrack, Track},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Playback manager
///
/// Features:
/// - Queue editing (append, play next, replace, remove, reorder)
/// - Local and remote ("jukebox") transport
/// - Repeat modes (Off, All, Single)
/// - Gapless pre-arming of the next entry
/// - Queue persistence after every state-affecting change
pub struct PlaybackManager {
    queue: TrackQueue,
    state: PlayerState,
    session: PlaybackSession,
    backends: BackendSelector,
    downloads: Box<dyn DownloadScheduler>,
    store: Box<dyn QueueStore>,
    music_service: Box<dyn MusicService>,
    events: EventBroadcaster,
    prefs: Preferences,
}

/// Builder for [`PlaybackManager`]
///
/// Only the local backend is required. Everything else defaults to an
/// inert implementation.
pub struct PlaybackManagerBuilder {
    local: Box<dyn LocalBackend>,
    remote: Box<dyn RemoteBackend>,
    downloads: Box<dyn DownloadScheduler>,
    store: Box<dyn QueueStore>,
    music_service: Box<dyn MusicService>,
    events: EventBroadcaster,
    prefs: Preferences,
}

impl PlaybackManagerBuilder {
    pub fn remote(mut self, remote: impl RemoteBackend + 'static) -> Self {
        self.remote = Box::new(remote);
        self
    }

    pub fn downloads(mut self, downloads: impl DownloadScheduler + 'static) -> Self {
        self.downloads = Box::new(downloads);
        self
    }

    pub fn store(mut self, store: impl QueueStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn music_service(mut self, service: impl MusicService + 'static) -> Self {
        self.music_service = Box::new(service);
        self
    }

    pub fn events(mut self, events: EventBroadcaster) -> Self {
        self.events = events;
        self
    }

    pub fn preferences(mut self, prefs: Preferences) -> Self {
        self.prefs = prefs;
        self
    }

    pub fn build(self) -> PlaybackManager {
        PlaybackManager {
            queue: TrackQueue::new(),
            state: PlayerState::Idle,
            session: PlaybackSession::new(),
            backends: BackendSelector::new(self.local, self.remote),
            downloads: self.downloads,
            store: self.store,
            music_service: self.music_service,
            events: self.events,
            prefs: self.prefs,
        }
    }
}

impl PlaybackManager {
    /// Start building a manager around a local backend
    pub fn builder(local: impl LocalBackend + 'static) -> PlaybackManagerBuilder {
        PlaybackManagerBuilder {
            local: Box::new(local),
            remote: Box::new(DisabledRemote),
            downloads: Box::new(NoDownloads),
            store: Box::new(NoPersistence),
            music_service: Box::new(OfflineMusicService),
            events: EventBroadcaster::new(),
            prefs: Preferences::default(),
        }
    }

    // ===== Lifecycle =====

    /// Install backend callbacks and allocate backend resources
    pub fn init(&mut self, callbacks: BackendCallbacks) -> Result<()> {
        self.backends.local_mut().init(callbacks)?;
        info!("Playback manager initialized");
        Ok(())
    }

    /// Release the local backend and stop downloading
    ///
    /// Teardown failures are logged and dropped so that shutdown completes.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.backends.local_mut().release() {
            warn!("Failed to release local backend: {}", e);
        }
        if let Err(e) = self.downloads.stop() {
            warn!("Failed to stop downloads: {}", e);
        }
        info!("Playback manager shut down");
    }

    // ===== Transport =====

    /// Restart the selected entry, or the first one if nothing is selected
    pub fn play(&mut self) -> Result<()> {
        let index = self.queue.current_index().unwrap_or(0);
        self.play_index(index, true)
    }

    /// Select the entry at `index` and start it when `start` is set
    ///
    /// An index outside the queue resets playback instead of failing.
    pub fn play_index(&mut self, index: usize, start: bool) -> Result<()> {
        self.publishing(|m| m.begin_index(index, start))
    }

    /// STARTED pauses, resumable states start, IDLE plays
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        match self.state {
            PlayerState::Started => self.pause(),
            _ => self.resume_or_play(),
        }
    }

    /// Like [`toggle_play_pause`](Self::toggle_play_pause) but never pauses
    pub fn resume_or_play(&mut self) -> Result<()> {
        match self.state {
            state if state.is_resumable() => self.start(),
            PlayerState::Idle => self.play(),
            state => {
                debug!("Ignoring resume while {}", state);
                Ok(())
            }
        }
    }

    /// Pause playback; only has an effect while STARTED
    pub fn pause(&mut self) -> Result<()> {
        self.publishing(|m| {
            if m.state != PlayerState::Started {
                return Ok(());
            }
            m.backends.halt()?;
            m.apply_state(PlayerState::Paused);
            Ok(())
        })
    }

    /// Stop playback
    ///
    /// The state becomes STOPPED even if the backend refuses to halt.
    pub fn stop(&mut self) -> Result<()> {
        self.publishing(|m| {
            let result = if m.state == PlayerState::Started {
                m.backends.halt()
            } else {
                Ok(())
            };
            m.apply_state(PlayerState::Stopped);
            result
        })
    }

    /// Resume playback on the active backend
    pub fn start(&mut self) -> Result<()> {
        self.publishing(|m| {
            m.backends.resume()?;
            m.apply_state(PlayerState::Started);
            Ok(())
        })
    }

    /// Seek inside the current track
    pub fn seek_to(&mut self, position: Duration) -> Result<()> {
        let index = self.queue.current_index();
        debug!(?index, position_ms = position.as_millis() as u64, "Seeking");
        self.backends.seek(index, position)
    }

    /// Select an entry without touching transport
    ///
    /// A stale index is ignored.
    pub fn set_current_playing(&mut self, index: usize) {
        self.publishing(|m| m.select_index(index));
    }

    /// Re-run the queue advancer and pre-arm the following entry
    pub fn set_next_playing(&mut self) {
        self.arm_next();
    }

    /// Reset the backend and empty the queue
    pub fn clear(&mut self, persist: bool) {
        self.publishing(|m| m.clear_queue(persist));
    }

    // ===== Queue editing =====

    /// Insert tracks and optionally start the first one
    pub fn enqueue(&mut self, tracks: Vec<Track>, mode: EnqueueMode, autoplay: bool) -> Result<()> {
        self.publishing(|m| {
            let count = tracks.len();
            if mode == EnqueueMode::Replace {
                m.clear_queue(false);
            }

            let first = m.queue.enqueue(tracks, mode);
            debug!(count, ?mode, "Enqueued tracks");

            let result = match first {
                Some(index) if autoplay => m.begin_index(index, true),
                _ => Ok(()),
            };
            m.queue_edited();
            result
        })
    }

    /// Remove the entry at `index`
    ///
    /// Removing the selected entry resets playback. A stale index is ignored.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.publishing(|m| {
            if index >= m.queue.len() {
                debug!(index, len = m.queue.len(), "Ignoring removal of stale index");
                return Ok(());
            }

            let was_current = m.queue.current_index() == Some(index);
            let removed = m.queue.remove(index)?;
            debug!(entry = %removed.entry_id(), index, "Removed entry");

            if was_current {
                m.reset_playback();
            }
            m.queue_edited();
            Ok(())
        })
    }

    /// Move the entry at `from` to `to`
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.queue.len();
        if from >= len || to >= len {
            debug!(from, to, len, "Ignoring reorder with stale index");
            return Ok(());
        }
        self.queue.reorder(from, to)?;
        self.queue_edited();
        Ok(())
    }

    /// Rebuild the queue from a persisted snapshot
    pub fn restore(&mut self, snapshot: QueueSnapshot, autoplay: bool) -> Result<()> {
        self.publishing(|m| {
            let QueueSnapshot {
                tracks,
                current_index,
                position_ms,
            } = snapshot;

            m.clear_queue(false);
            m.queue.enqueue(tracks, EnqueueMode::Append);
            info!(
                tracks = m.queue.len(),
                ?current_index,
                position_ms,
                "Restoring queue"
            );

            let mut result = Ok(());
            if let Some(index) = current_index.filter(|&i| i < m.queue.len()) {
                result = m.begin_index(index, autoplay);
                if result.is_ok() && position_ms > 0 {
                    if let Err(e) = m.backends.seek(Some(index), Duration::from_millis(position_ms)) {
                        warn!("Failed to restore position {}ms: {}", position_ms, e);
                    }
                }
            }
            m.queue_edited();
            result
        })
    }

    // ===== Backend callbacks =====

    /// Apply one notification from the local backend
    pub fn handle_backend_event(&mut self, event: BackendEvent) {
        debug!(?event, "Backend event");
        self.publishing(|m| match event {
            BackendEvent::Prepared => m.persist(),
            BackendEvent::NextSongRequested => m.arm_next(),
            BackendEvent::CurrentPlayingChanged(entry) => {
                let index = entry.and_then(|id| m.queue.index_of(id));
                if entry.is_some() && index.is_none() {
                    debug!(?entry, "Backend switched to an entry no longer queued");
                    return;
                }
                m.select(index, false);
            }
            BackendEvent::PlayerStateChanged(state) => m.apply_state(state),
            BackendEvent::SongCompleted => m.on_song_completed(),
        });
    }

    // ===== Queries =====

    /// Get current player state
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Position inside the current track, zero before playback begins
    pub fn position(&self) -> Duration {
        if self.state.has_position() {
            self.backends.position()
        } else {
            Duration::ZERO
        }
    }

    /// Duration of the current track as reported by the local backend
    pub fn duration(&self) -> Option<Duration> {
        self.backends.local().duration()
    }

    pub fn queue(&self) -> &TrackQueue {
        &self.queue
    }

    /// Entry bound to the session
    pub fn current(&self) -> Option<&Arc<QueuedTrack>> {
        self.session.current()
    }

    /// Pre-armed entry, if any
    pub fn next(&self) -> Option<&Arc<QueuedTrack>> {
        self.session.next()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn is_remote(&self) -> bool {
        self.backends.is_remote()
    }

    /// Consistent snapshot for UIs
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            current_index: self.queue.current_index(),
            current: self.session.current().map(|e| e.track().clone()),
            next: self.session.next().map(|e| e.track().clone()),
            queue_len: self.queue.len(),
            position: self.position(),
            duration: self.duration(),
            remote: self.is_remote(),
        }
    }

    // ===== Internal =====

    /// Run `op`, then publish whatever changed
    fn publishing<T>(&mut self, op: impl FnOnce(&mut Self) -> T) -> T {
        let result = op(self);
        self.publish();
        result
    }

    fn publish(&mut self) {
        let config = self.prefs.snapshot();
        let observed = Observed {
            state: self.state,
            current: self.session.current().cloned(),
            queue_len: self.queue.len(),
            current_index: self.queue.current_index(),
            position: self.position(),
        };

        if self.events.observe(observed, &config) {
            self.stop_if_idle();
        }
    }

    /// Re-checked after every teardown, never deferred
    fn stop_if_idle(&mut self) {
        if self.queue.current().is_none() && self.state == PlayerState::Stopped {
            info!("Nothing selected and playback stopped, requesting service stop");
            self.events.request_stop();
        }
    }

    fn begin_index(&mut self, index: usize, start: bool) -> Result<()> {
        if index >= self.queue.len() {
            debug!(index, len = self.queue.len(), "Index outside queue, resetting playback");
            self.reset_playback();
            return Ok(());
        }

        self.select(Some(index), true);

        let result = if start {
            self.start_current(index)
        } else {
            Ok(())
        };
        if let Err(e) = &result {
            error!("Failed to start entry {}: {}", index, e);
        }

        // The old pre-arm belongs to the previous position even when starting failed
        self.downloads.check_downloads(&self.queue);
        self.arm_next();
        result
    }

    fn start_current(&mut self, index: usize) -> Result<()> {
        let Some(entry) = self.queue.get(index).cloned() else {
            return Ok(());
        };
        self.backends.begin(index, &entry)?;

        // The remote player never calls back, so its state is assumed
        if self.backends.is_remote() {
            self.apply_state(PlayerState::Started);
        }
        Ok(())
    }

    fn select_index(&mut self, index: usize) {
        if index >= self.queue.len() {
            debug!(index, len = self.queue.len(), "Ignoring selection of stale index");
            return;
        }
        self.select(Some(index), true);
    }

    /// Bind the queue selection and the session to `index`
    fn select(&mut self, index: Option<usize>, notify_backend: bool) {
        if let Err(e) = self.queue.set_current(index) {
            debug!("Ignoring selection: {}", e);
            return;
        }

        let entry = self.queue.current().cloned();
        if self.session.set_current(entry.clone()) {
            debug!(entry = ?entry.as_ref().map(|e| e.entry_id()), "Current entry changed");
        }
        if notify_backend {
            self.backends.local_mut().set_current_playing(entry.as_ref());
        }
    }

    fn apply_state(&mut self, state: PlayerState) {
        if state != self.state {
            debug!(from = %self.state, to = %state, "Player state changed");
        }
        self.state = state;

        if state == PlayerState::Paused {
            self.persist();
        }
    }

    fn arm_next(&mut self) {
        let config = self.prefs.snapshot();
        let local = self.backends.local_mut();

        if !config.gapless {
            local.clear_next_playing(true);
            self.session.set_next(None);
            return;
        }

        local.clear_next_playing(false);
        let next = advancer::next_index(self.queue.current_index(), self.queue.len(), config.repeat)
            .and_then(|i| self.queue.get(i).cloned());

        match next {
            Some(entry) => {
                local.set_next_playing(&entry);
                self.session.set_next(Some(entry));
            }
            None => {
                local.clear_next_playing(true);
                self.session.set_next(None);
            }
        }
    }

    fn reset_playback(&mut self) {
        if let Err(e) = self.backends.local_mut().reset() {
            warn!("Failed to reset local backend: {}", e);
        }
        self.select(None, true);
        self.arm_next();
        self.apply_state(PlayerState::Idle);
        self.persist();
    }

    fn clear_queue(&mut self, persist: bool) {
        if let Err(e) = self.backends.local_mut().reset() {
            warn!("Failed to reset local backend: {}", e);
        }
        self.downloads.clear();
        self.queue.clear();
        self.select(None, true);
        self.apply_state(PlayerState::Idle);
        self.arm_next();

        if persist {
            self.persist();
        }
    }

    fn on_song_completed(&mut self) {
        let config = self.prefs.snapshot();
        let Some(completed) = self.queue.current().cloned() else {
            debug!("Completion without a selected entry");
            return;
        };

        if config.clear_bookmark_on_finish && completed.track().has_bookmark() {
            if let Err(e) = self.music_service.delete_bookmark(&completed.track().id) {
                warn!("Failed to delete bookmark for {}: {}", completed.track().id, e);
            }
        }

        match advancer::on_completion(self.queue.current_index(), self.queue.len(), config.repeat) {
            Some(Advance::Play(next)) => {
                debug!(next, "Advancing to next entry");
                // Already logged by begin_index
                let _ = self.begin_index(next, true);
            }
            Some(Advance::End) => {
                info!("Reached end of queue");
                if config.clear_playlist_on_finish {
                    self.clear_queue(true);
                    self.refresh_remote_playlist();
                }
                self.reset_playback();
            }
            None => {}
        }
    }

    /// Queue was edited: re-arm, download, sync the jukebox, persist
    fn queue_edited(&mut self) {
        self.arm_next();
        self.downloads.check_downloads(&self.queue);
        self.refresh_remote_playlist();
        self.persist();
    }

    fn refresh_remote_playlist(&mut self) {
        if !self.backends.is_remote() {
            return;
        }
        let entries = self.queue.entries().to_vec();
        if let Err(e) = self.backends.remote_mut().update_playlist(&entries) {
            warn!("Failed to update remote playlist: {}", e);
        }
    }

    fn persist(&mut self) {
        let snapshot = QueueSnapshot {
            tracks: self.queue.tracks(),
            current_index: self.queue.current_index(),
            position_ms: u64::try_from(self.position().as_millis()).unwrap_or(u64::MAX),
        };
        if let Err(e) = self.store.save(&snapshot) {
            warn!("Failed to persist queue: {}", e);
        }
    }
}
