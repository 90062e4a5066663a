//! JSON queue persistence
//!
//! Snapshots are handed to a writer thread so the playback worker never
//! waits on the disk. Bursts are coalesced: only the newest pending
//! snapshot is written.

use cadence_playback::{PlaybackError, QueueSnapshot, QueueStore};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

pub struct JsonQueueStore {
    path: PathBuf,
    tx: Option<Sender<QueueSnapshot>>,
    writer: Option<JoinHandle<()>>,
}

impl JsonQueueStore {
    /// Start the writer thread for `path`
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let (tx, rx) = unbounded();

        let writer_path = path.clone();
        let writer = thread::Builder::new()
            .name("cadence-queue-writer".to_string())
            .spawn(move || write_loop(&writer_path, &rx))?;

        Ok(Self {
            path,
            tx: Some(tx),
            writer: Some(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the last saved snapshot
    ///
    /// A missing file is not an error; an unreadable one is logged and
    /// treated as missing.
    pub fn load(path: &Path) -> Option<QueueSnapshot> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read saved queue {:?}: {}", path, e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Ignoring corrupt saved queue {:?}: {}", path, e);
                None
            }
        }
    }

    /// Flush pending snapshots and stop the writer
    pub fn close(&mut self) {
        self.tx.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                tracing::error!("Queue writer thread panicked");
            }
        }
    }
}

impl QueueStore for JsonQueueStore {
    fn save(&mut self, snapshot: &QueueSnapshot) -> cadence_playback::Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| PlaybackError::Persistence("store is closed".to_string()))?;

        tx.send(snapshot.clone())
            .map_err(|_| PlaybackError::Persistence("queue writer stopped".to_string()))
    }
}

impl Drop for JsonQueueStore {
    fn drop(&mut self) {
        self.close();
    }
}

fn write_loop(path: &Path, rx: &Receiver<QueueSnapshot>) {
    while let Ok(mut snapshot) = rx.recv() {
        // Keep only the newest of a burst
        for newer in rx.try_iter() {
            snapshot = newer;
        }

        match write_atomic(path, &snapshot) {
            Ok(()) => tracing::debug!(
                "Saved queue ({} tracks, index {:?})",
                snapshot.tracks.len(),
                snapshot.current_index
            ),
            Err(e) => tracing::error!("Failed to save queue to {:?}: {}", path, e),
        }
    }
}

fn write_atomic(path: &Path, snapshot: &QueueSnapshot) -> crate::error::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_vec_pretty(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
