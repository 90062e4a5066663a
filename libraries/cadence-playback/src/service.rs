//! Playback service
//!
//! Runs a [`PlaybackManager`] on a dedicated worker thread. Callers talk to
//! it through a cloneable [`ServiceHandle`]; every command is a message
//! processed strictly in arrival order, so the manager never needs a lock.
//!
//! Backend callbacks travel on their own unbounded channel. Callbacks a
//! backend raises while the worker is inside a manager call are applied
//! before the next command is taken.

use crate::backend::{BackendCallbacks, BackendEvent};
use crate::config::ServiceConfig;
use crate::error::{PlaybackError, Result};
use crate::manager::PlaybackManager;
use crate::queue::EnqueueMode;
use crate::types::{PlaybackStatus, QueueSnapshot, Track};
use crossbeam_channel::{
    bounded, never, select, unbounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender,
    TrySendError,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Commands sent to the playback thread
#[derive(Debug, Clone)]
pub enum PlaybackCommand {
    /// Restart the selected entry, or the first one
    Play,

    /// Select an entry and optionally start it
    PlayIndex { index: usize, start: bool },

    /// Pause when playing, otherwise resume or play
    TogglePlayPause,

    /// Resume or play, never pause
    ResumeOrPlay,

    /// Pause playback
    Pause,

    /// Stop playback
    Stop,

    /// Resume playback
    Start,

    /// Seek inside the current track
    SeekTo(Duration),

    /// Select an entry without starting it
    SetCurrentPlaying(usize),

    /// Re-arm the gapless next entry
    SetNextPlaying,

    /// Empty the queue
    Clear { persist: bool },

    /// Add tracks to the queue
    Enqueue {
        tracks: Vec<Track>,
        mode: EnqueueMode,
        autoplay: bool,
    },

    /// Remove one entry
    Remove(usize),

    /// Move one entry
    Reorder { from: usize, to: usize },

    /// Rebuild the queue from a saved snapshot
    Restore {
        snapshot: QueueSnapshot,
        autoplay: bool,
    },
}

enum Message {
    Command(PlaybackCommand, Sender<Result<()>>),
    Status(Sender<PlaybackStatus>),
    Queue(Sender<Vec<Track>>),
    Ping(Sender<()>),
    Shutdown,
}

/// Running playback service
///
/// Dropping the service shuts it down.
pub struct PlaybackService {
    handle: ServiceHandle,
    worker: Option<JoinHandle<()>>,
}

impl PlaybackService {
    /// Move `manager` onto a new worker thread
    ///
    /// The local backend is initialised on that thread before the first
    /// command is processed. Use [`ServiceHandle::wait_ready`] to wait for it.
    pub fn spawn(manager: PlaybackManager, config: ServiceConfig) -> Result<Self> {
        let (command_tx, command_rx) = bounded(config.queue_capacity.max(1));
        let (event_tx, event_rx) = unbounded();

        let callbacks = BackendCallbacks::new(move |event| {
            if event_tx.send(event).is_err() {
                debug!("Playback service gone, dropping backend event");
            }
        });

        let worker = thread::Builder::new()
            .name("cadence-playback".to_string())
            .spawn(move || run(manager, callbacks, command_rx, event_rx))?;

        let handle = ServiceHandle {
            commands: command_tx,
            command_timeout: config.command_timeout(),
            startup_attempts: config.startup_attempts,
            startup_retry_delay: config.startup_retry_delay(),
        };

        Ok(Self {
            handle,
            worker: Some(worker),
        })
    }

    /// Handle for issuing commands
    pub fn handle(&self) -> ServiceHandle {
        self.handle.clone()
    }

    /// Stop the worker and release the backends
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        if self.handle.commands.send(Message::Shutdown).is_err() {
            debug!("Playback worker already stopped");
        }
        if worker.join().is_err() {
            error!("Playback worker panicked");
        }
    }
}

impl Drop for PlaybackService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(
    mut manager: PlaybackManager,
    callbacks: BackendCallbacks,
    commands: Receiver<Message>,
    mut events: Receiver<BackendEvent>,
) {
    if let Err(e) = manager.init(callbacks) {
        error!("Failed to initialize playback backend: {}", e);
        return;
    }
    info!("Playback service started");

    loop {
        while let Ok(event) = events.try_recv() {
            manager.handle_backend_event(event);
        }

        let mut backend_gone = false;
        select! {
            recv(events) -> event => match event {
                Ok(event) => manager.handle_backend_event(event),
                Err(_) => backend_gone = true,
            },
            recv(commands) -> message => match message {
                Ok(Message::Command(command, reply)) => {
                    let result = process_command(&mut manager, command);
                    if let Err(e) = &result {
                        debug!("Command failed: {}", e);
                    }
                    let _ = reply.send(result);
                }
                Ok(Message::Status(reply)) => {
                    let _ = reply.send(manager.status());
                }
                Ok(Message::Queue(reply)) => {
                    let _ = reply.send(manager.queue().tracks());
                }
                Ok(Message::Ping(reply)) => {
                    let _ = reply.send(());
                }
                Ok(Message::Shutdown) | Err(_) => break,
            },
        }

        // Backend dropped its callbacks
        if backend_gone {
            events = never();
        }
    }

    manager.shutdown();
    info!("Playback service stopped");
}

fn process_command(manager: &mut PlaybackManager, command: PlaybackCommand) -> Result<()> {
    debug!(?command, "Processing command");

    match command {
        PlaybackCommand::Play => manager.play(),
        PlaybackCommand::PlayIndex { index, start } => manager.play_index(index, start),
        PlaybackCommand::TogglePlayPause => manager.toggle_play_pause(),
        PlaybackCommand::ResumeOrPlay => manager.resume_or_play(),
        PlaybackCommand::Pause => manager.pause(),
        PlaybackCommand::Stop => manager.stop(),
        PlaybackCommand::Start => manager.start(),
        PlaybackCommand::SeekTo(position) => manager.seek_to(position),
        PlaybackCommand::SetCurrentPlaying(index) => {
            manager.set_current_playing(index);
            Ok(())
        }
        PlaybackCommand::SetNextPlaying => {
            manager.set_next_playing();
            Ok(())
        }
        PlaybackCommand::Clear { persist } => {
            manager.clear(persist);
            Ok(())
        }
        PlaybackCommand::Enqueue {
            tracks,
            mode,
            autoplay,
        } => manager.enqueue(tracks, mode, autoplay),
        PlaybackCommand::Remove(index) => manager.remove(index),
        PlaybackCommand::Reorder { from, to } => manager.reorder(from, to),
        PlaybackCommand::Restore { snapshot, autoplay } => manager.restore(snapshot, autoplay),
    }
}

/// Cloneable handle to a running [`PlaybackService`]
///
/// Every call waits at most the configured command timeout for the worker
/// to answer.
#[derive(Clone)]
pub struct ServiceHandle {
    commands: Sender<Message>,
    command_timeout: Duration,
    startup_attempts: u32,
    startup_retry_delay: Duration,
}

impl ServiceHandle {
    /// Send a command and wait for its result
    pub fn execute(&self, command: PlaybackCommand) -> Result<()> {
        self.request(|reply| Message::Command(command, reply))?
    }

    /// Bounded readiness wait
    ///
    /// Probes the worker up to `startup_attempts` times, waiting
    /// `startup_retry_delay` for each answer.
    pub fn wait_ready(&self) -> Result<()> {
        for attempt in 1..=self.startup_attempts {
            let (reply_tx, reply_rx) = bounded(1);

            match self.commands.try_send(Message::Ping(reply_tx)) {
                Ok(()) => match reply_rx.recv_timeout(self.startup_retry_delay) {
                    Ok(()) => return Ok(()),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(PlaybackError::ServiceUnavailable);
                    }
                },
                Err(TrySendError::Full(_)) => thread::sleep(self.startup_retry_delay),
                Err(TrySendError::Disconnected(_)) => {
                    return Err(PlaybackError::ServiceUnavailable);
                }
            }

            debug!(attempt, "Playback service not ready yet");
        }

        Err(PlaybackError::Timeout(
            self.startup_retry_delay * self.startup_attempts,
        ))
    }

    /// Run `task` on a helper thread once the service is ready
    ///
    /// Logs an error and drops the task if the service never answers.
    pub fn execute_when_ready<F>(&self, task: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(&ServiceHandle) + Send + 'static,
    {
        let handle = self.clone();
        let helper = thread::Builder::new()
            .name("cadence-ready".to_string())
            .spawn(move || match handle.wait_ready() {
                Ok(()) => task(&handle),
                Err(e) => error!("Playback service never became ready: {}", e),
            })?;
        Ok(helper)
    }

    pub fn play(&self) -> Result<()> {
        self.execute(PlaybackCommand::Play)
    }

    pub fn play_index(&self, index: usize, start: bool) -> Result<()> {
        self.execute(PlaybackCommand::PlayIndex { index, start })
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.execute(PlaybackCommand::TogglePlayPause)
    }

    pub fn resume_or_play(&self) -> Result<()> {
        self.execute(PlaybackCommand::ResumeOrPlay)
    }

    pub fn pause(&self) -> Result<()> {
        self.execute(PlaybackCommand::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.execute(PlaybackCommand::Stop)
    }

    pub fn start(&self) -> Result<()> {
        self.execute(PlaybackCommand::Start)
    }

    pub fn seek_to(&self, position: Duration) -> Result<()> {
        self.execute(PlaybackCommand::SeekTo(position))
    }

    pub fn set_current_playing(&self, index: usize) -> Result<()> {
        self.execute(PlaybackCommand::SetCurrentPlaying(index))
    }

    pub fn set_next_playing(&self) -> Result<()> {
        self.execute(PlaybackCommand::SetNextPlaying)
    }

    pub fn clear(&self, persist: bool) -> Result<()> {
        self.execute(PlaybackCommand::Clear { persist })
    }

    pub fn enqueue(&self, tracks: Vec<Track>, mode: EnqueueMode, autoplay: bool) -> Result<()> {
        self.execute(PlaybackCommand::Enqueue {
            tracks,
            mode,
            autoplay,
        })
    }

    pub fn remove(&self, index: usize) -> Result<()> {
        self.execute(PlaybackCommand::Remove(index))
    }

    pub fn reorder(&self, from: usize, to: usize) -> Result<()> {
        self.execute(PlaybackCommand::Reorder { from, to })
    }

    pub fn restore(&self, snapshot: QueueSnapshot, autoplay: bool) -> Result<()> {
        self.execute(PlaybackCommand::Restore { snapshot, autoplay })
    }

    /// Consistent view of state, queue and position
    pub fn status(&self) -> Result<PlaybackStatus> {
        self.request(Message::Status)
    }

    /// Queued tracks in play order
    pub fn queue(&self) -> Result<Vec<Track>> {
        self.request(Message::Queue)
    }

    /// Position inside the current track
    pub fn position(&self) -> Result<Duration> {
        Ok(self.status()?.position)
    }

    /// Duration of the current track
    pub fn duration(&self) -> Result<Option<Duration>> {
        Ok(self.status()?.duration)
    }

    fn request<T>(&self, message: impl FnOnce(Sender<T>) -> Message) -> Result<T> {
        let (reply_tx, reply_rx) = bounded(1);

        self.commands
            .send_timeout(message(reply_tx), self.command_timeout)
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => {
                    warn!("Playback command queue full");
                    PlaybackError::Timeout(self.command_timeout)
                }
                SendTimeoutError::Disconnected(_) => {
                    error!("Playback service unavailable");
                    PlaybackError::ServiceUnavailable
                }
            })?;

        reply_rx
            .recv_timeout(self.command_timeout)
            .map_err(|e| match e {
                RecvTimeoutError::Timeout => {
                    warn!("Playback service did not answer in time");
                    PlaybackError::Timeout(self.command_timeout)
                }
                RecvTimeoutError::Disconnected => {
                    error!("Playback service stopped before answering");
                    PlaybackError::ServiceUnavailable
                }
            })
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}
