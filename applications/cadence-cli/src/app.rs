//! Wiring of the playback core for the console
use crate::config::AppConfig;
use crate::error::Result;
use crate::observers::{
    ConsoleNotification, DirectoryCoverArt, NowPlayingBar, ScrobbleLog, StatusLine, StopSignal,
    TransportLog,
};
use crate::simulated::SimulatedLocalBackend;
use crate::store::JsonQueueStore;
use cadence_playback::{
    EventBroadcaster, PlaybackManager, PlaybackService, Preferences, ServiceHandle,
};
use crossbeam_channel::Sender;

/// Running playback service plus the preferences the console edits
pub struct App {
    service: PlaybackService,
    prefs: Preferences,
}

impl App {
    /// Build the manager, spawn the service and restore the saved queue
    ///
    /// `stop` receives a message once the service has nothing left to play.
    pub fn start(config: &AppConfig, stop: Sender<()>, autoplay: bool) -> Result<Self> {
        let saved = JsonQueueStore::load(&config.storage.queue_file);
        let store = JsonQueueStore::open(&config.storage.queue_file)?;
        let prefs = Preferences::new(config.playback.clone());

        let mut events = EventBroadcaster::new()
            .with_transport(TransportLog)
            .with_widget(StatusLine)
            .with_notification(ConsoleNotification::default())
            .with_now_playing(NowPlayingBar)
            .with_scrobbler(ScrobbleLog)
            .with_lifecycle(StopSignal(stop));
        if let Some(dir) = &config.storage.cover_art_dir {
            events = events.with_cover_art(DirectoryCoverArt::new(dir));
        }

        let backend = SimulatedLocalBackend::new(
            config.simulation.track_length(),
            config.simulation.tick(),
        );
        let manager = PlaybackManager::builder(backend)
            .store(store)
            .events(events)
            .preferences(prefs.clone())
            .build();

        let service = PlaybackService::spawn(manager, config.service.clone())?;
        let handle = service.handle();
        handle.wait_ready()?;
        tracing::info!("Playback service ready");

        if let Some(snapshot) = saved {
            tracing::info!(
                "Restoring {} queued tracks from {:?}",
                snapshot.tracks.len(),
                config.storage.queue_file
            );
            handle.restore(snapshot, autoplay)?;
        } else if autoplay {
            tracing::debug!("Nothing saved to autoplay");
        }

        Ok(Self { service, prefs })
    }

    pub fn handle(&self) -> ServiceHandle {
        self.service.handle()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn shutdown(mut self) {
        self.service.shutdown();
    }
}
