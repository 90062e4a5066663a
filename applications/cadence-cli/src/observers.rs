//! Terminal observers
//!
//! The CLI has no widgets or system notifications; every surface is
//! rendered as a log line instead.

use cadence_playback::{
    Artwork, CoverArtSource, NotificationContent, NotificationPresenter, NowPlayingSurface,
    PlaybackChange, Result, Scrobbler, ServiceLifecycle, Track, TransportListener, WidgetSurface,
};
use crossbeam_channel::Sender;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Logs every transport change
#[derive(Debug, Default)]
pub struct TransportLog;

impl TransportListener for TransportLog {
    fn playback_changed(&mut self, change: &PlaybackChange) {
        match change.track() {
            Some(track) if change.track_changed => info!(
                state = %change.state,
                "Now on: {} ({}/{})",
                describe(track),
                change.queue_position.unwrap_or(0),
                change.queue_len
            ),
            Some(_) => debug!(state = %change.state, from = %change.previous_state, "Transport"),
            None => debug!(state = %change.state, "Transport without a track"),
        }
    }

    fn release_remote_control(&mut self) {
        debug!("Remote control released");
    }
}

/// One-line status bar
#[derive(Debug, Default)]
pub struct StatusLine;

impl WidgetSurface for StatusLine {
    fn refresh(&mut self, track: Option<&Track>, playing: bool) {
        let symbol = if playing { ">" } else { "||" };
        match track {
            Some(track) => debug!("[{}] {}", symbol, describe(track)),
            None => debug!("[{}] nothing selected", symbol),
        }
    }
}

/// Notification rendered to the log
#[derive(Debug, Default)]
pub struct ConsoleNotification {
    visible: bool,
}

impl ConsoleNotification {
    fn render(content: &NotificationContent) -> String {
        let mut line = content.title.clone();
        if let Some(artist) = &content.artist {
            line.push_str(" - ");
            line.push_str(artist);
        }
        if let Some(rating) = content.rating {
            line.push(' ');
            line.push_str(&"*".repeat(usize::from(rating.min(5))));
        }
        if let Artwork::Image(bytes) = &content.artwork {
            line.push_str(&format!(" [cover {} bytes]", bytes.len()));
        }
        line
    }
}

impl NotificationPresenter for ConsoleNotification {
    fn start_foreground(&mut self, content: &NotificationContent) {
        self.visible = true;
        info!("Notification ({}): {}", content.state, Self::render(content));
    }

    fn update(&mut self, content: &NotificationContent) {
        debug!("Notification ({}): {}", content.state, Self::render(content));
    }

    fn stop_foreground(&mut self) {
        if self.visible {
            self.visible = false;
            debug!("Notification dismissed");
        }
    }
}

#[derive(Debug, Default)]
pub struct NowPlayingBar;

impl NowPlayingSurface for NowPlayingBar {
    fn set_visible(&mut self, visible: bool) {
        debug!(visible, "Now playing bar");
    }
}

/// Scrobbler that only logs what it would submit
#[derive(Debug, Default)]
pub struct ScrobbleLog;

impl Scrobbler for ScrobbleLog {
    fn report(&mut self, track: &Track, submission: bool) {
        if submission {
            info!("Scrobble: {}", describe(track));
        } else {
            debug!("Now playing: {}", describe(track));
        }
    }
}

/// Forwards stop requests to the main loop
#[derive(Debug)]
pub struct StopSignal(pub Sender<()>);

impl ServiceLifecycle for StopSignal {
    fn request_stop(&mut self) {
        info!("Nothing left to play");
        // The main loop may already be gone
        let _ = self.0.try_send(());
    }
}

/// Cover art read from `<dir>/<cover_art>.jpg`
#[derive(Debug)]
pub struct DirectoryCoverArt {
    dir: PathBuf,
}

impl DirectoryCoverArt {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CoverArtSource for DirectoryCoverArt {
    fn cover_art(&mut self, track: &Track, _size: u32) -> Result<Option<Vec<u8>>> {
        let Some(id) = &track.cover_art else {
            return Ok(None);
        };

        let path = self.dir.join(format!("{}.jpg", id));
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn describe(track: &Track) -> String {
    match &track.artist {
        Some(artist) => format!("{} - {}", artist, track.title),
        None => track.title.clone(),
    }
}
