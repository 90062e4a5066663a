//! Track queue
//!
//! Ordered list of queue entries plus the index of the selected entry.
//! Insertion order is play order.

use crate::error::{PlaybackError, Result};
use crate::types::{EntryId, QueuedTrack, Track};
use std::sync::Arc;

/// How new tracks are inserted into the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueMode {
    /// Append at the end of the queue
    Append,

    /// Insert right after the selected entry (or at the front if none)
    PlayNext,

    /// Replace the whole queue
    Replace,
}

/// Ordered queue with a current-index pointer
///
/// Structure:
/// ```text
///   0  Track A
///   1  Track B   <- current_index
///   2  Track C
/// ```
///
/// `current_index` is either `None` or a valid index. Every operation
/// that shrinks or reorders the sequence recomputes it so it never dangles.
#[derive(Debug, Default)]
pub struct TrackQueue {
    entries: Vec<Arc<QueuedTrack>>,
    current_index: Option<usize>,
    next_entry_id: u64,
}

impl TrackQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert tracks according to `mode`
    ///
    /// Returns the index of the first inserted entry, or `None` if
    /// `tracks` was empty.
    pub fn enqueue(&mut self, tracks: Vec<Track>, mode: EnqueueMode) -> Option<usize> {
        if mode == EnqueueMode::Replace {
            self.clear();
        }

        if tracks.is_empty() {
            return None;
        }

        let position = match mode {
            EnqueueMode::Append | EnqueueMode::Replace => self.entries.len(),
            EnqueueMode::PlayNext => self.current_index.map_or(0, |i| i + 1),
        };

        let count = tracks.len();
        let new_entries: Vec<_> = tracks.into_iter().map(|t| self.wrap(t)).collect();
        self.entries.splice(position..position, new_entries);

        // Inserting in front of the selected entry shifts it
        if let Some(current) = self.current_index {
            if position <= current {
                self.current_index = Some(current + count);
            }
        }

        Some(position)
    }

    /// Remove entry at `index`
    ///
    /// Returns the removed entry. Removing the selected entry clears the
    /// selection; removing an entry before it shifts the selection down.
    pub fn remove(&mut self, index: usize) -> Result<Arc<QueuedTrack>> {
        if index >= self.entries.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }

        let removed = self.entries.remove(index);

        self.current_index = match self.current_index {
            Some(current) if current == index => None,
            Some(current) if current > index => Some(current - 1),
            other => other,
        };

        Ok(removed)
    }

    /// Move entry from `from` to `to`
    ///
    /// The selection follows the selected entry.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.entries.len();
        if from >= len {
            return Err(PlaybackError::IndexOutOfBounds(from));
        }
        if to >= len {
            return Err(PlaybackError::IndexOutOfBounds(to));
        }
        if from == to {
            return Ok(());
        }

        let selected = self.current().map(|e| e.entry_id());
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);

        if let Some(id) = selected {
            self.current_index = self.index_of(id);
        }

        Ok(())
    }

    /// Clear entire queue
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_index = None;
    }

    /// Select the entry at `index`, or clear the selection with `None`
    pub fn set_current(&mut self, index: Option<usize>) -> Result<()> {
        match index {
            Some(i) if i >= self.entries.len() => Err(PlaybackError::IndexOutOfBounds(i)),
            _ => {
                self.current_index = index;
                Ok(())
            }
        }
    }

    /// Index of the selected entry
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// The selected entry
    pub fn current(&self) -> Option<&Arc<QueuedTrack>> {
        self.current_index.and_then(|i| self.entries.get(i))
    }

    /// Get entry at index
    pub fn get(&self, index: usize) -> Option<&Arc<QueuedTrack>> {
        self.entries.get(index)
    }

    /// Position of the entry with the given identity
    pub fn index_of(&self, entry_id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.entry_id() == entry_id)
    }

    /// All entries in play order
    pub fn entries(&self) -> &[Arc<QueuedTrack>] {
        &self.entries
    }

    /// Track metadata in play order (for persistence)
    pub fn tracks(&self) -> Vec<Track> {
        self.entries.iter().map(|e| e.track().clone()).collect()
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn wrap(&mut self, track: Track) -> Arc<QueuedTrack> {
        self.next_entry_id += 1;
        Arc::new(QueuedTrack::new(EntryId(self.next_entry_id), track))
    }
}
