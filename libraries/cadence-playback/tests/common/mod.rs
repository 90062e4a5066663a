//! Shared test helpers: recording mocks for every collaborator

use cadence_playback::{
    BackendCallbacks, DownloadScheduler, EventBroadcaster, LocalBackend, MusicService, NotificationContent,
    NotificationPresenter, NowPlayingSurface, PlaybackChange, PlaybackError, PlaybackManager,
    PlaybackManagerBuilder, PlayerState, Preferences, QueueSnapshot, QueueStore, QueuedTrack,
    RemoteBackend, Result, Scrobbler, ServiceLifecycle, Track, TrackQueue, TransportListener,
    WidgetSurface,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Ordered call log shared between a mock and the test
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().unwrap().iter().any(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter()
        .map(|id| {
            let mut track = Track::new(*id, format!("Track {}", id));
            track.artist = Some("Test Artist".to_string());
            track.album = Some("Test Album".to_string());
            track.duration = Some(Duration::from_secs(180));
            track
        })
        .collect()
}

// ===== Backends =====

/// Local backend that records calls
///
/// With `auto_start`, `play` reports Preparing, Prepared and Started through
/// the installed callbacks before returning, like a decoder that has the
/// data cached.
pub struct MockLocal {
    log: Log,
    callbacks: Option<BackendCallbacks>,
    auto_start: bool,
    fail_play: bool,
}

impl LocalBackend for MockLocal {
    fn init(&mut self, callbacks: BackendCallbacks) -> Result<()> {
        self.log.push("local.init");
        self.callbacks = Some(callbacks);
        Ok(())
    }

    fn play(&mut self, track: &Arc<QueuedTrack>) -> Result<()> {
        if self.fail_play {
            return Err(PlaybackError::Backend("decoder unavailable".to_string()));
        }
        self.log.push(format!("local.play {}", track.track().id));
        if let (true, Some(callbacks)) = (self.auto_start, &self.callbacks) {
            callbacks.player_state_changed(PlayerState::Preparing);
            callbacks.prepared();
            callbacks.player_state_changed(PlayerState::Started);
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.log.push("local.pause");
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.log.push("local.start");
        Ok(())
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        self.log.push(format!("local.seek {}", position.as_millis()));
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.log.push("local.reset");
        Ok(())
    }

    fn set_current_playing(&mut self, track: Option<&Arc<QueuedTrack>>) {
        match track {
            Some(track) => self.log.push(format!("local.current {}", track.track().id)),
            None => self.log.push("local.current none"),
        }
    }

    fn set_next_playing(&mut self, track: &Arc<QueuedTrack>) {
        self.log.push(format!("local.next {}", track.track().id));
    }

    fn clear_next_playing(&mut self, immediate: bool) {
        self.log.push(format!("local.clear_next {}", immediate));
    }

    fn release(&mut self) -> Result<()> {
        self.log.push("local.release");
        Ok(())
    }

    fn position(&self) -> Duration {
        Duration::from_millis(42_500)
    }

    fn duration(&self) -> Option<Duration> {
        Some(Duration::from_secs(180))
    }
}

/// Remote backend whose capability flag the test can flip
pub struct MockRemote {
    log: Log,
    enabled: Arc<AtomicBool>,
}

impl RemoteBackend for MockRemote {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn start(&mut self) -> Result<()> {
        self.log.push("remote.start");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.log.push("remote.stop");
        Ok(())
    }

    fn skip(&mut self, index: usize, offset_secs: u32) -> Result<()> {
        self.log.push(format!("remote.skip {} {}", index, offset_secs));
        Ok(())
    }

    fn position_secs(&self) -> u32 {
        17
    }

    fn update_playlist(&mut self, entries: &[Arc<QueuedTrack>]) -> Result<()> {
        self.log.push(format!("remote.playlist {}", entries.len()));
        Ok(())
    }
}

// ===== Collaborators =====

pub struct MockDownloads(Log);

impl DownloadScheduler for MockDownloads {
    fn check_downloads(&mut self, queue: &TrackQueue) {
        self.0.push(format!("downloads.check {}", queue.len()));
    }

    fn clear(&mut self) {
        self.0.push("downloads.clear");
    }

    fn stop(&mut self) -> Result<()> {
        self.0.push("downloads.stop");
        Err(PlaybackError::Backend("already stopped".to_string()))
    }
}

pub struct MockStore(Arc<Mutex<Vec<QueueSnapshot>>>);

impl QueueStore for MockStore {
    fn save(&mut self, snapshot: &QueueSnapshot) -> Result<()> {
        self.0.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

pub struct MockMusicService {
    log: Log,
    fail: bool,
}

impl MusicService for MockMusicService {
    fn delete_bookmark(&mut self, track_id: &str) -> Result<()> {
        self.log.push(format!("bookmark.delete {}", track_id));
        if self.fail {
            Err(PlaybackError::MusicService("server unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

// ===== Observers =====

/// Records every observer call into one ordered log
pub struct EventRecorder(pub Log);

impl TransportListener for EventRecorder {
    fn playback_changed(&mut self, change: &PlaybackChange) {
        let track = change.track().map_or("none".to_string(), |t| t.id.clone());
        self.0.push(format!("transport {} {}", change.state, track));
    }

    fn release_remote_control(&mut self) {
        self.0.push("transport.release");
    }
}

impl WidgetSurface for EventRecorder {
    fn refresh(&mut self, track: Option<&Track>, playing: bool) {
        let track = track.map_or("none".to_string(), |t| t.id.clone());
        self.0.push(format!("widget {} {}", track, playing));
    }
}

impl NotificationPresenter for EventRecorder {
    fn start_foreground(&mut self, content: &NotificationContent) {
        self.0.push(format!("notification.start {}", content.state));
    }

    fn update(&mut self, content: &NotificationContent) {
        self.0.push(format!("notification.update {}", content.state));
    }

    fn stop_foreground(&mut self) {
        self.0.push("notification.stop");
    }
}

impl NowPlayingSurface for EventRecorder {
    fn set_visible(&mut self, visible: bool) {
        self.0.push(format!("now_playing {}", visible));
    }
}

impl Scrobbler for EventRecorder {
    fn report(&mut self, track: &Track, submission: bool) {
        self.0.push(format!("scrobble {} {}", track.id, submission));
    }
}

impl ServiceLifecycle for EventRecorder {
    fn request_stop(&mut self) {
        self.0.push("lifecycle.stop");
    }
}

// ===== Harness =====

/// Every mock wired into one manager, with handles to inspect them
pub struct Harness {
    /// Backend, download and music-service calls
    pub calls: Log,

    /// Observer calls
    pub events: Log,

    pub snapshots: Arc<Mutex<Vec<QueueSnapshot>>>,
    pub remote_enabled: Arc<AtomicBool>,
    pub prefs: Preferences,
    pub auto_start: bool,
    pub fail_play: bool,
    pub fail_bookmark: bool,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Route manager logs to the test output, once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence_playback=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        Self {
            calls: Log::default(),
            events: Log::default(),
            snapshots: Arc::default(),
            remote_enabled: Arc::new(AtomicBool::new(false)),
            prefs: Preferences::default(),
            auto_start: false,
            fail_play: false,
            fail_bookmark: false,
        }
    }

    pub fn builder(&self) -> PlaybackManagerBuilder {
        let events = EventBroadcaster::new()
            .with_transport(EventRecorder(self.events.clone()))
            .with_widget(EventRecorder(self.events.clone()))
            .with_notification(EventRecorder(self.events.clone()))
            .with_now_playing(EventRecorder(self.events.clone()))
            .with_scrobbler(EventRecorder(self.events.clone()))
            .with_lifecycle(EventRecorder(self.events.clone()));

        PlaybackManager::builder(MockLocal {
            log: self.calls.clone(),
            callbacks: None,
            auto_start: self.auto_start,
            fail_play: self.fail_play,
        })
        .remote(MockRemote {
            log: self.calls.clone(),
            enabled: self.remote_enabled.clone(),
        })
        .downloads(MockDownloads(self.calls.clone()))
        .store(MockStore(self.snapshots.clone()))
        .music_service(MockMusicService {
            log: self.calls.clone(),
            fail: self.fail_bookmark,
        })
        .events(events)
        .preferences(self.prefs.clone())
    }

    pub fn manager(&self) -> PlaybackManager {
        self.builder().build()
    }

    /// Manager with `ids` queued and all logs cleared
    pub fn manager_with(&self, ids: &[&str]) -> PlaybackManager {
        let mut manager = self.manager();
        manager
            .enqueue(tracks(ids), cadence_playback::EnqueueMode::Append, false)
            .unwrap();
        self.reset_logs();
        manager
    }

    pub fn reset_logs(&self) {
        self.calls.take();
        self.events.take();
        self.snapshots.lock().unwrap().clear();
    }

    pub fn last_snapshot(&self) -> Option<QueueSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }
}
