//! Simulated local backend
//!
//! Stands in for a decoder: a ticker thread advances a playhead through
//! each track and reports transitions through the installed callbacks,
//! so the whole playback core can be driven from a terminal.

use cadence_playback::{
    BackendCallbacks, BackendEvent, LocalBackend, PlaybackError, PlayerState, QueuedTrack, Result,
};
use crossbeam_channel::{bounded, select, tick, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Default)]
struct Playhead {
    track: Option<Arc<QueuedTrack>>,
    next: Option<Arc<QueuedTrack>>,
    position: Duration,
    length: Duration,
    playing: bool,
}

pub struct SimulatedLocalBackend {
    playhead: Arc<Mutex<Playhead>>,
    callbacks: Option<BackendCallbacks>,
    default_length: Duration,
    tick: Duration,
    stop_tx: Option<Sender<()>>,
    ticker: Option<JoinHandle<()>>,
}

impl SimulatedLocalBackend {
    /// `default_length` applies to tracks without a known duration
    pub fn new(default_length: Duration, tick: Duration) -> Self {
        Self {
            playhead: Arc::default(),
            callbacks: None,
            default_length,
            tick,
            stop_tx: None,
            ticker: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Playhead> {
        self.playhead.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, event: BackendEvent) {
        if let Some(callbacks) = &self.callbacks {
            dispatch(callbacks, event);
        }
    }
}

impl LocalBackend for SimulatedLocalBackend {
    fn init(&mut self, callbacks: BackendCallbacks) -> Result<()> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticker = tick(self.tick);
        let playhead = self.playhead.clone();
        let thread_callbacks = callbacks.clone();
        let step = self.tick;
        let default_length = self.default_length;

        let handle = thread::Builder::new()
            .name("cadence-sim".to_string())
            .spawn(move || loop {
                select! {
                    recv(ticker) -> _ => {
                        for event in advance(&playhead, step, default_length) {
                            dispatch(&thread_callbacks, event);
                        }
                    }
                    recv(stop_rx) -> _ => break,
                }
            })?;

        self.callbacks = Some(callbacks);
        self.stop_tx = Some(stop_tx);
        self.ticker = Some(handle);
        tracing::debug!("Simulated backend started (tick {:?})", self.tick);
        Ok(())
    }

    fn play(&mut self, track: &Arc<QueuedTrack>) -> Result<()> {
        if self.ticker.is_none() {
            return Err(PlaybackError::Backend("backend not initialized".to_string()));
        }

        let length = track.track().duration.unwrap_or(self.default_length);
        {
            let mut playhead = self.lock();
            playhead.track = Some(track.clone());
            playhead.position = Duration::ZERO;
            playhead.length = length;
            playhead.playing = false;
        }
        tracing::info!("Playing: {}", track.track().title);

        // Data is always "cached", so the track starts right away
        self.report(BackendEvent::PlayerStateChanged(PlayerState::Preparing));
        self.report(BackendEvent::Prepared);
        self.lock().playing = true;
        self.report(BackendEvent::PlayerStateChanged(PlayerState::Started));
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.lock().playing = false;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        let mut playhead = self.lock();
        if playhead.track.is_some() {
            if playhead.position >= playhead.length {
                playhead.position = Duration::ZERO;
            }
            playhead.playing = true;
        }
        Ok(())
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        let mut playhead = self.lock();
        playhead.position = position.min(playhead.length);
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        let mut playhead = self.lock();
        playhead.track = None;
        playhead.position = Duration::ZERO;
        playhead.playing = false;
        Ok(())
    }

    fn set_current_playing(&mut self, track: Option<&Arc<QueuedTrack>>) {
        tracing::trace!(entry = ?track.map(|t| t.entry_id()), "Selected entry");
    }

    fn set_next_playing(&mut self, track: &Arc<QueuedTrack>) {
        self.lock().next = Some(track.clone());
    }

    fn clear_next_playing(&mut self, _immediate: bool) {
        self.lock().next = None;
    }

    fn release(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.callbacks = None;
        if let Some(ticker) = self.ticker.take() {
            ticker
                .join()
                .map_err(|_| PlaybackError::Backend("simulation thread panicked".to_string()))?;
        }
        Ok(())
    }

    fn position(&self) -> Duration {
        self.lock().position
    }

    fn duration(&self) -> Option<Duration> {
        let playhead = self.lock();
        playhead.track.as_ref().map(|_| playhead.length)
    }
}

impl Drop for SimulatedLocalBackend {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::error!("Failed to release simulated backend: {}", e);
        }
    }
}

/// Move the playhead by `step` and return what the backend should report
fn advance(playhead: &Mutex<Playhead>, step: Duration, default_length: Duration) -> Vec<BackendEvent> {
    let mut playhead = playhead.lock().unwrap_or_else(PoisonError::into_inner);
    if !playhead.playing || playhead.track.is_none() {
        return Vec::new();
    }

    playhead.position += step;
    if playhead.position < playhead.length {
        return Vec::new();
    }

    match playhead.next.take() {
        Some(next) => {
            let entry = next.entry_id();
            playhead.length = next.track().duration.unwrap_or(default_length);
            playhead.position = Duration::ZERO;
            playhead.track = Some(next);
            vec![
                BackendEvent::CurrentPlayingChanged(Some(entry)),
                BackendEvent::NextSongRequested,
            ]
        }
        None => {
            playhead.position = playhead.length;
            playhead.playing = false;
            vec![
                BackendEvent::PlayerStateChanged(PlayerState::Completed),
                BackendEvent::SongCompleted,
            ]
        }
    }
}

fn dispatch(callbacks: &BackendCallbacks, event: BackendEvent) {
    match event {
        BackendEvent::Prepared => callbacks.prepared(),
        BackendEvent::NextSongRequested => callbacks.next_song_requested(),
        BackendEvent::CurrentPlayingChanged(entry) => callbacks.current_playing_changed(entry),
        BackendEvent::PlayerStateChanged(state) => callbacks.player_state_changed(state),
        BackendEvent::SongCompleted => callbacks.song_completed(),
    }
}
