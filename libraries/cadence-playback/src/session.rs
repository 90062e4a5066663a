//! Playback session
//!
//! Binds the entry being played and the pre-armed entry that follows it.
//! Entries are shared with the queue, never copied.

use crate::types::{EntryId, QueuedTrack};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct PlaybackSession {
    current: Option<Arc<QueuedTrack>>,
    next: Option<Arc<QueuedTrack>>,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Arc<QueuedTrack>> {
        self.current.as_ref()
    }

    pub fn next(&self) -> Option<&Arc<QueuedTrack>> {
        self.next.as_ref()
    }

    pub fn current_entry(&self) -> Option<EntryId> {
        self.current.as_ref().map(|e| e.entry_id())
    }

    /// Bind a new current entry
    ///
    /// Returns `true` when the entry differs from the previous one.
    pub fn set_current(&mut self, entry: Option<Arc<QueuedTrack>>) -> bool {
        let changed = entry.as_ref().map(|e| e.entry_id()) != self.current_entry();
        self.current = entry;
        changed
    }

    pub fn set_next(&mut self, entry: Option<Arc<QueuedTrack>>) {
        self.next = entry;
    }
}
