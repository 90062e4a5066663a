//! Queue advancer
//!
//! Decides which entry follows the current one. Pure functions of the
//! current index, the queue length and the repeat mode, shared by gapless
//! pre-arming and by the end-of-track advance.

use crate::types::RepeatMode;

/// What to do once the current track has played to the end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Play the entry at this index
    Play(usize),

    /// The queue is exhausted
    End,
}

/// Index of the entry that follows `current`
///
/// - `Off`: `current + 1`, `None` past the end
/// - `All`: `(current + 1) % len`
/// - `Single`: `current`
///
/// Returns `None` when nothing is selected or `current` is stale.
pub fn next_index(current: Option<usize>, len: usize, mode: RepeatMode) -> Option<usize> {
    let current = current.filter(|&i| i < len)?;

    match mode {
        RepeatMode::Off => Some(current + 1).filter(|&next| next < len),
        RepeatMode::All => Some((current + 1) % len),
        RepeatMode::Single => Some(current),
    }
}

/// Advance decision for a completed track at `current`
///
/// Returns `None` when nothing was selected, in which case completion
/// is ignored.
pub fn on_completion(current: Option<usize>, len: usize, mode: RepeatMode) -> Option<Advance> {
    current?;
    Some(match next_index(current, len, mode) {
        Some(next) => Advance::Play(next),
        None => Advance::End,
    })
}
