//! Playback events
//!
//! Fan-out of (player state, current track) changes to external observers.
//! Each change is delivered exactly once, in a fixed order:
//! 1. transport/metadata listeners
//! 2. widget surfaces
//! 3. notification presenter
//! 4. now-playing surface
//! 5. scrobbler
//!
//! Observers run on the manager's thread and must not call back into it.

use crate::collaborators::CoverArtSource;
use crate::config::PlaybackConfig;
use crate::types::{EntryId, PlayerState, QueuedTrack, Track};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One observed change of state and/or current track
#[derive(Debug, Clone)]
pub struct PlaybackChange {
    /// The new player state
    pub state: PlayerState,

    /// The state before this change
    pub previous_state: PlayerState,

    /// The selected entry after this change
    pub current: Option<Arc<QueuedTrack>>,

    /// Whether the selected entry differs from the previous change
    pub track_changed: bool,

    /// Number of entries in the queue
    pub queue_len: usize,

    /// 1-based position of the selected entry in the queue
    pub queue_position: Option<usize>,

    /// Playback position at the time of the change
    pub position: Duration,
}

impl PlaybackChange {
    /// Metadata of the selected track
    pub fn track(&self) -> Option<&Track> {
        self.current.as_deref().map(QueuedTrack::track)
    }

    pub fn state_changed(&self) -> bool {
        self.state != self.previous_state
    }
}

/// Notification artwork
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artwork {
    /// Encoded cover image
    Image(Vec<u8>),

    /// Generic "unknown album" artwork
    Placeholder,
}

/// Everything a notification needs to render one track
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContent {
    pub state: PlayerState,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,

    /// Five-star rating, only when rating display is enabled
    pub rating: Option<u8>,

    pub artwork: Artwork,
}

/// Media-session / broadcast listener
pub trait TransportListener: Send {
    fn playback_changed(&mut self, change: &PlaybackChange);

    /// Drop remote-control metadata once nothing is selected
    fn release_remote_control(&mut self) {}
}

/// Home-screen widget
pub trait WidgetSurface: Send {
    fn refresh(&mut self, track: Option<&Track>, playing: bool);
}

/// Ongoing playback notification
pub trait NotificationPresenter: Send {
    /// First presentation; makes the service a foreground service
    fn start_foreground(&mut self, content: &NotificationContent);

    /// Refresh an already visible presentation
    fn update(&mut self, content: &NotificationContent);

    /// Remove the presentation and leave the foreground
    fn stop_foreground(&mut self);
}

/// In-app "now playing" bar
pub trait NowPlayingSurface: Send {
    fn set_visible(&mut self, visible: bool);
}

/// Scrobble reporting
pub trait Scrobbler: Send {
    /// `submission` is false for "now playing" and true for "played"
    fn report(&mut self, track: &Track, submission: bool);
}

/// Host service lifecycle
pub trait ServiceLifecycle: Send {
    /// Nothing left to play; the host may stop the service
    fn request_stop(&mut self);
}

/// State the manager hands to [`EventBroadcaster::observe`]
pub(crate) struct Observed {
    pub state: PlayerState,
    pub current: Option<Arc<QueuedTrack>>,
    pub queue_len: usize,
    pub current_index: Option<usize>,
    pub position: Duration,
}

/// Registered observers plus the last published (state, entry) pair
pub struct EventBroadcaster {
    transport: Vec<Box<dyn TransportListener>>,
    widgets: Vec<Box<dyn WidgetSurface>>,
    notification: Option<Box<dyn NotificationPresenter>>,
    now_playing: Option<Box<dyn NowPlayingSurface>>,
    scrobbler: Option<Box<dyn Scrobbler>>,
    cover_art: Option<Box<dyn CoverArtSource>>,
    lifecycle: Option<Box<dyn ServiceLifecycle>>,

    in_foreground: bool,
    last_state: PlayerState,
    last_entry: Option<EntryId>,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroadcaster {
    /// Create a broadcaster with no observers
    pub fn new() -> Self {
        Self {
            transport: Vec::new(),
            widgets: Vec::new(),
            notification: None,
            now_playing: None,
            scrobbler: None,
            cover_art: None,
            lifecycle: None,
            in_foreground: false,
            last_state: PlayerState::Idle,
            last_entry: None,
        }
    }

    pub fn with_transport(mut self, listener: impl TransportListener + 'static) -> Self {
        self.transport.push(Box::new(listener));
        self
    }

    pub fn with_widget(mut self, widget: impl WidgetSurface + 'static) -> Self {
        self.widgets.push(Box::new(widget));
        self
    }

    pub fn with_notification(mut self, presenter: impl NotificationPresenter + 'static) -> Self {
        self.notification = Some(Box::new(presenter));
        self
    }

    pub fn with_now_playing(mut self, surface: impl NowPlayingSurface + 'static) -> Self {
        self.now_playing = Some(Box::new(surface));
        self
    }

    pub fn with_scrobbler(mut self, scrobbler: impl Scrobbler + 'static) -> Self {
        self.scrobbler = Some(Box::new(scrobbler));
        self
    }

    pub fn with_cover_art(mut self, source: impl CoverArtSource + 'static) -> Self {
        self.cover_art = Some(Box::new(source));
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: impl ServiceLifecycle + 'static) -> Self {
        self.lifecycle = Some(Box::new(lifecycle));
        self
    }

    /// Whether the notification currently holds the foreground
    pub fn is_in_foreground(&self) -> bool {
        self.in_foreground
    }

    /// Publish the observed state if it differs from the last publication
    ///
    /// Returns `true` when the presentation was torn down, in which case
    /// the caller re-checks whether the service should stop.
    pub(crate) fn observe(&mut self, observed: Observed, config: &PlaybackConfig) -> bool {
        let entry = observed.current.as_ref().map(|e| e.entry_id());
        let track_changed = entry != self.last_entry;
        if observed.state == self.last_state && !track_changed {
            return false;
        }

        let change = PlaybackChange {
            state: observed.state,
            previous_state: self.last_state,
            current: observed.current,
            track_changed,
            queue_len: observed.queue_len,
            queue_position: observed.current_index.map(|i| i + 1),
            position: observed.position,
        };
        self.last_state = change.state;
        self.last_entry = entry;

        debug!(
            state = %change.state,
            previous = %change.previous_state,
            track_changed,
            "Publishing playback change"
        );

        self.dispatch(&change, config)
    }

    fn dispatch(&mut self, change: &PlaybackChange, config: &PlaybackConfig) -> bool {
        let state = change.state;

        for listener in &mut self.transport {
            listener.playback_changed(change);
        }

        let playing = state == PlayerState::Started;
        for widget in &mut self.widgets {
            widget.refresh(change.track(), playing);
        }

        let torn_down = match &change.current {
            None => {
                self.tear_down();
                true
            }
            Some(entry) => {
                let show_when_paused =
                    state != PlayerState::Stopped && config.notification_always_visible;

                if change.track_changed || playing || show_when_paused {
                    // Only states that change the play/pause icon refresh an existing presentation
                    if change.track_changed || matches!(state, PlayerState::Started | PlayerState::Paused) {
                        self.present(entry.track(), state, config);
                        if let Some(surface) = &mut self.now_playing {
                            surface.set_visible(true);
                        }
                    }
                    false
                } else {
                    self.tear_down();
                    true
                }
            }
        };

        if let (Some(scrobbler), Some(track)) = (&mut self.scrobbler, change.track()) {
            let entered_started =
                playing && (change.state_changed() || change.track_changed);
            let entered_completed = state == PlayerState::Completed && change.state_changed();

            if entered_started {
                scrobbler.report(track, false);
            } else if entered_completed {
                scrobbler.report(track, true);
            }
        }

        torn_down
    }

    fn present(&mut self, track: &Track, state: PlayerState, config: &PlaybackConfig) {
        if !config.notifications_enabled {
            return;
        }
        let Some(presenter) = &mut self.notification else {
            return;
        };

        let artwork = match &mut self.cover_art {
            None => Artwork::Placeholder,
            Some(source) => match source.cover_art(track, config.notification_image_size) {
                Ok(Some(bytes)) => Artwork::Image(bytes),
                Ok(None) => Artwork::Placeholder,
                Err(e) => {
                    warn!("Failed to get notification cover art for {}: {}", track.id, e);
                    Artwork::Placeholder
                }
            },
        };

        let content = NotificationContent {
            state,
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            rating: config
                .show_rating
                .then(|| track.user_rating.unwrap_or(0).min(5)),
            artwork,
        };

        if self.in_foreground {
            presenter.update(&content);
        } else {
            presenter.start_foreground(&content);
            self.in_foreground = true;
        }
    }

    fn tear_down(&mut self) {
        if let Some(surface) = &mut self.now_playing {
            surface.set_visible(false);
        }
        if let Some(presenter) = &mut self.notification {
            presenter.stop_foreground();
        }
        self.in_foreground = false;
        for listener in &mut self.transport {
            listener.release_remote_control();
        }
    }

    /// Ask the host to stop the service
    pub(crate) fn request_stop(&mut self) {
        if let Some(lifecycle) = &mut self.lifecycle {
            lifecycle.request_stop();
        }
    }
}
