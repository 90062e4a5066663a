//! Playback manager scenarios
//!
//! Drives a manager wired to recording mocks through real command and
//! callback sequences and checks the resulting queue, state, backend calls,
//! persistence and observer fan-out.

mod common;

use cadence_playback::{
    BackendEvent, EnqueueMode, PlaybackError, PlayerState, QueueSnapshot, RepeatMode,
};
use common::{tracks, Harness};
use std::time::Duration;

/// Start `index` and confirm playback the way the local backend would
fn start_playing(manager: &mut cadence_playback::PlaybackManager, index: usize) {
    manager.play_index(index, true).unwrap();
    manager.handle_backend_event(BackendEvent::PlayerStateChanged(PlayerState::Started));
}

fn complete_current(manager: &mut cadence_playback::PlaybackManager) {
    manager.handle_backend_event(BackendEvent::PlayerStateChanged(PlayerState::Completed));
    manager.handle_backend_event(BackendEvent::SongCompleted);
}

// ===== Queue advancer through the manager =====

#[test]
fn repeat_off_has_no_next_after_last_entry() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b", "c"]);

    manager.play_index(2, true).unwrap();

    assert!(manager.next().is_none());
    let calls = harness.calls.entries();
    assert!(calls.contains(&"local.play c".to_string()));
    assert_eq!(calls.last().unwrap(), "local.clear_next true");
}

#[test]
fn repeat_all_wraps_to_first_entry() {
    let harness = Harness::new();
    harness.prefs.set_repeat_mode(RepeatMode::All);
    let mut manager = harness.manager_with(&["a", "b", "c"]);

    manager.play_index(2, true).unwrap();

    assert_eq!(manager.next().unwrap().track().id, "a");
    assert!(harness.calls.contains("local.next a"));
}

#[test]
fn repeat_single_pre_arms_the_same_entry() {
    let harness = Harness::new();
    harness.prefs.set_repeat_mode(RepeatMode::Single);
    let mut manager = harness.manager_with(&["a", "b", "c"]);

    manager.play_index(1, true).unwrap();

    let current = manager.current().unwrap().entry_id();
    assert_eq!(manager.next().unwrap().entry_id(), current);
}

#[test]
fn gapless_disabled_always_clears_pre_arm() {
    let harness = Harness::new();
    harness.prefs.update(|c| c.gapless = false);
    harness.prefs.set_repeat_mode(RepeatMode::All);
    let mut manager = harness.manager_with(&["a", "b", "c"]);

    manager.play_index(0, true).unwrap();
    manager.set_next_playing();
    manager.handle_backend_event(BackendEvent::NextSongRequested);

    assert!(manager.next().is_none());
    let calls = harness.calls.entries();
    assert!(!calls.iter().any(|c| c.starts_with("local.next")));
    assert_eq!(harness.calls.count("local.clear_next true"), 3);
}

#[test]
fn repeat_mode_change_applies_on_next_decision() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b"]);
    manager.play_index(1, true).unwrap();
    assert!(manager.next().is_none());

    harness.prefs.set_repeat_mode(RepeatMode::All);
    manager.handle_backend_event(BackendEvent::NextSongRequested);

    assert_eq!(manager.next().unwrap().track().id, "a");
}

// ===== play(index) =====

#[test]
fn play_index_outside_queue_resets_and_persists() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b", "c"]);
    start_playing(&mut manager, 1);
    harness.reset_logs();

    manager.play_index(3, true).unwrap();

    assert_eq!(manager.queue().len(), 3);
    assert_eq!(manager.queue().current_index(), None);
    assert!(manager.current().is_none());
    assert_eq!(manager.state(), PlayerState::Idle);
    assert!(harness.calls.contains("local.reset"));

    let saved = harness.last_snapshot().unwrap();
    assert_eq!(saved.tracks.len(), 3);
    assert_eq!(saved.current_index, None);
}

#[test]
fn play_on_empty_queue_persists_empty_snapshot() {
    let harness = Harness::new();
    let mut manager = harness.manager();

    manager.play().unwrap();

    assert_eq!(manager.state(), PlayerState::Idle);
    let saved = harness.last_snapshot().unwrap();
    assert!(saved.tracks.is_empty());
    assert_eq!(saved.current_index, None);
}

#[test]
fn play_restarts_selected_entry() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b", "c"]);
    manager.set_current_playing(2);

    manager.play().unwrap();

    assert!(harness.calls.contains("local.play c"));
    assert!(harness.calls.contains("downloads.check 3"));
}

#[test]
fn play_index_without_start_only_selects() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b"]);

    manager.play_index(1, false).unwrap();

    assert_eq!(manager.current().unwrap().track().id, "b");
    assert!(harness.calls.contains("local.current b"));
    assert!(!harness.calls.entries().iter().any(|c| c.starts_with("local.play")));
    assert_eq!(manager.state(), PlayerState::Idle);
}

#[test]
fn backend_failure_is_reported_to_caller() {
    let mut harness = Harness::new();
    harness.fail_play = true;
    let mut manager = harness.manager_with(&["a"]);

    let result = manager.play_index(0, true);

    assert!(matches!(result, Err(PlaybackError::Backend(_))));
    assert_eq!(manager.state(), PlayerState::Idle);
}

#[test]
fn failed_start_still_rearms_next() {
    let mut harness = Harness::new();
    harness.fail_play = true;
    let mut manager = harness.manager_with(&["a", "b", "c"]);
    manager.set_current_playing(0);
    manager.set_next_playing();
    assert_eq!(manager.next().unwrap().track().id, "b");
    harness.reset_logs();

    let result = manager.play_index(2, true);

    assert!(result.is_err());
    assert_eq!(manager.queue().current_index(), Some(2));
    assert!(manager.next().is_none());
    assert!(harness.calls.contains("local.clear_next true"));
    assert!(harness.calls.contains("downloads.check 3"));
}

#[test]
fn stale_selection_is_silently_ignored() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b"]);
    manager.set_current_playing(1);
    harness.reset_logs();

    manager.set_current_playing(2);

    assert_eq!(manager.queue().current_index(), Some(1));
    assert!(harness.calls.entries().is_empty());
    assert!(harness.events.entries().is_empty());
}

// ===== Transport =====

#[test]
fn toggle_alternates_between_started_and_paused() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);
    start_playing(&mut manager, 0);

    for _ in 0..5 {
        manager.toggle_play_pause().unwrap();
        assert_eq!(manager.state(), PlayerState::Paused);
        manager.toggle_play_pause().unwrap();
        assert_eq!(manager.state(), PlayerState::Started);
    }
    assert_eq!(harness.calls.count("local.pause"), 5);
    assert_eq!(harness.calls.count("local.start"), 5);
}

#[test]
fn toggle_from_idle_plays() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b"]);

    manager.toggle_play_pause().unwrap();

    assert!(harness.calls.contains("local.play a"));
}

#[test]
fn toggle_while_preparing_is_ignored() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);
    manager.play_index(0, true).unwrap();
    manager.handle_backend_event(BackendEvent::PlayerStateChanged(PlayerState::Preparing));
    harness.reset_logs();

    manager.toggle_play_pause().unwrap();
    manager.resume_or_play().unwrap();

    assert_eq!(manager.state(), PlayerState::Preparing);
    assert!(harness.calls.entries().is_empty());
}

#[test]
fn resume_or_play_never_pauses() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);
    start_playing(&mut manager, 0);

    manager.resume_or_play().unwrap();
    assert_eq!(manager.state(), PlayerState::Started);

    manager.stop().unwrap();
    manager.resume_or_play().unwrap();
    assert_eq!(manager.state(), PlayerState::Started);
    assert!(harness.calls.contains("local.start"));
}

#[test]
fn stop_from_started_halts_backend() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);
    start_playing(&mut manager, 0);

    manager.stop().unwrap();

    assert_eq!(manager.state(), PlayerState::Stopped);
    assert!(harness.calls.contains("local.pause"));
}

#[test]
fn position_is_zero_until_playback_begins() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);

    manager.play_index(0, true).unwrap();
    manager.handle_backend_event(BackendEvent::PlayerStateChanged(PlayerState::Downloading));
    assert_eq!(manager.position(), Duration::ZERO);
    manager.handle_backend_event(BackendEvent::PlayerStateChanged(PlayerState::Preparing));
    assert_eq!(manager.position(), Duration::ZERO);

    manager.handle_backend_event(BackendEvent::PlayerStateChanged(PlayerState::Started));
    assert_eq!(manager.position(), Duration::from_millis(42_500));
    assert_eq!(manager.duration(), Some(Duration::from_secs(180)));
}

#[test]
fn local_seek_keeps_milliseconds() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);
    start_playing(&mut manager, 0);

    manager.seek_to(Duration::from_millis(61_250)).unwrap();

    assert!(harness.calls.contains("local.seek 61250"));
}

// ===== Remote backend =====

#[test]
fn remote_transport_uses_jukebox() {
    let harness = Harness::new();
    harness
        .remote_enabled
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let mut manager = harness.manager_with(&["a", "b", "c"]);

    manager.play_index(1, true).unwrap();
    assert_eq!(manager.state(), PlayerState::Started);
    assert_eq!(manager.position(), Duration::from_secs(17));

    manager.seek_to(Duration::from_millis(12_900)).unwrap();
    manager.pause().unwrap();
    manager.start().unwrap();

    let calls = harness.calls.entries();
    let remote: Vec<_> = calls.iter().filter(|c| c.starts_with("remote.")).collect();
    assert_eq!(
        remote,
        vec!["remote.skip 1 0", "remote.skip 1 12", "remote.stop", "remote.start"]
    );
    assert!(!calls.iter().any(|c| c.starts_with("local.play")));
}

#[test]
fn backend_choice_is_made_per_operation() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);
    start_playing(&mut manager, 0);

    harness
        .remote_enabled
        .store(true, std::sync::atomic::Ordering::SeqCst);
    manager.pause().unwrap();

    assert!(harness.calls.contains("remote.stop"));
    assert!(!harness.calls.contains("local.pause"));
    assert!(manager.status().remote);
}

#[test]
fn queue_edits_refresh_remote_playlist() {
    let harness = Harness::new();
    harness
        .remote_enabled
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let mut manager = harness.manager_with(&["a", "b"]);

    manager
        .enqueue(tracks(&["c"]), EnqueueMode::Append, false)
        .unwrap();
    manager.remove(0).unwrap();

    assert!(harness.calls.contains("remote.playlist 3"));
    assert!(harness.calls.contains("remote.playlist 2"));
}

// ===== Completion =====

#[test]
fn completion_advances_to_next_entry() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b", "c"]);
    start_playing(&mut manager, 0);

    complete_current(&mut manager);

    assert!(harness.calls.contains("local.play b"));
    assert_eq!(manager.queue().current_index(), Some(1));
}

#[test]
fn completion_with_repeat_all_wraps() {
    let harness = Harness::new();
    harness.prefs.set_repeat_mode(RepeatMode::All);
    let mut manager = harness.manager_with(&["a", "b", "c"]);
    start_playing(&mut manager, 2);
    harness.reset_logs();

    complete_current(&mut manager);

    assert!(harness.calls.contains("local.play a"));
    assert_eq!(manager.queue().current_index(), Some(0));
}

#[test]
fn completion_with_repeat_single_restarts_entry() {
    let harness = Harness::new();
    harness.prefs.set_repeat_mode(RepeatMode::Single);
    let mut manager = harness.manager_with(&["a", "b"]);
    start_playing(&mut manager, 1);
    harness.reset_logs();

    complete_current(&mut manager);

    assert!(harness.calls.contains("local.play b"));
    assert_eq!(manager.queue().current_index(), Some(1));
}

#[test]
fn completion_of_last_entry_resets() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b"]);
    start_playing(&mut manager, 1);

    complete_current(&mut manager);

    assert_eq!(manager.state(), PlayerState::Idle);
    assert_eq!(manager.queue().len(), 2);
    assert_eq!(manager.queue().current_index(), None);
    assert_eq!(harness.last_snapshot().unwrap().current_index, None);
}

#[test]
fn completion_with_clear_on_finish_empties_queue() {
    let harness = Harness::new();
    harness.prefs.update(|c| c.clear_playlist_on_finish = true);
    let mut manager = harness.manager_with(&["a"]);
    start_playing(&mut manager, 0);

    complete_current(&mut manager);

    assert!(manager.queue().is_empty());
    assert_eq!(manager.queue().current_index(), None);
    assert_eq!(manager.state(), PlayerState::Idle);
    assert!(harness.calls.contains("downloads.clear"));
    assert!(harness.last_snapshot().unwrap().tracks.is_empty());
}

#[test]
fn clear_on_finish_refreshes_remote_playlist() {
    let harness = Harness::new();
    harness.prefs.update(|c| c.clear_playlist_on_finish = true);
    harness
        .remote_enabled
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let mut manager = harness.manager_with(&["a"]);
    manager.play_index(0, true).unwrap();

    manager.handle_backend_event(BackendEvent::SongCompleted);

    assert!(harness.calls.contains("remote.playlist 0"));
    assert!(manager.queue().is_empty());
}

#[test]
fn completion_deletes_bookmark_when_enabled() {
    let harness = Harness::new();
    harness.prefs.update(|c| c.clear_bookmark_on_finish = true);
    let mut manager = harness.manager();
    let mut queued = tracks(&["a", "b"]);
    queued[0].bookmark_position = Some(Duration::from_secs(90));
    manager.enqueue(queued, EnqueueMode::Append, false).unwrap();
    start_playing(&mut manager, 0);

    complete_current(&mut manager);

    let calls = harness.calls.entries();
    let deleted = calls.iter().position(|c| c == "bookmark.delete a").unwrap();
    let advanced = calls.iter().position(|c| c == "local.play b").unwrap();
    assert!(deleted < advanced);
}

#[test]
fn failed_bookmark_deletion_does_not_block_advance() {
    let mut harness = Harness::new();
    harness.fail_bookmark = true;
    harness.prefs.update(|c| c.clear_bookmark_on_finish = true);
    let mut manager = harness.manager();
    let mut queued = tracks(&["a", "b"]);
    queued[0].bookmark_position = Some(Duration::from_secs(90));
    manager.enqueue(queued, EnqueueMode::Append, false).unwrap();
    start_playing(&mut manager, 0);

    complete_current(&mut manager);

    assert!(harness.calls.contains("bookmark.delete a"));
    assert_eq!(manager.queue().current_index(), Some(1));
}

#[test]
fn bookmark_kept_when_clearing_disabled() {
    let harness = Harness::new();
    let mut manager = harness.manager();
    let mut queued = tracks(&["a", "b"]);
    queued[0].bookmark_position = Some(Duration::from_secs(90));
    manager.enqueue(queued, EnqueueMode::Append, false).unwrap();
    start_playing(&mut manager, 0);

    complete_current(&mut manager);

    assert!(!harness.calls.contains("bookmark.delete a"));
}

#[test]
fn completion_without_selection_is_ignored() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);

    manager.handle_backend_event(BackendEvent::SongCompleted);

    assert!(harness.calls.entries().is_empty());
    assert_eq!(manager.state(), PlayerState::Idle);
}

#[test]
fn gapless_transition_moves_selection() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b", "c"]);
    start_playing(&mut manager, 0);
    let next = manager.next().unwrap().entry_id();

    manager.handle_backend_event(BackendEvent::CurrentPlayingChanged(Some(next)));
    manager.handle_backend_event(BackendEvent::NextSongRequested);

    assert_eq!(manager.queue().current_index(), Some(1));
    assert_eq!(manager.next().unwrap().track().id, "c");
    assert!(harness.events.contains("scrobble b false"));
}

// ===== Clear and persistence =====

#[test]
fn clear_with_persist_saves_empty_queue() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b", "c"]);
    start_playing(&mut manager, 1);

    manager.clear(true);

    assert_eq!(manager.queue().len(), 0);
    assert_eq!(manager.queue().current_index(), None);
    assert!(manager.next().is_none());
    assert_eq!(manager.state(), PlayerState::Idle);
    let saved = harness.last_snapshot().unwrap();
    assert!(saved.tracks.is_empty());
    assert_eq!(saved.current_index, None);
}

#[test]
fn clear_without_persist_saves_nothing() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b"]);

    manager.clear(false);

    assert!(manager.queue().is_empty());
    assert_eq!(harness.snapshot_count(), 0);
}

#[test]
fn prepared_and_pause_persist_position() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b"]);
    manager.play_index(1, true).unwrap();
    harness.reset_logs();

    manager.handle_backend_event(BackendEvent::Prepared);
    assert_eq!(harness.snapshot_count(), 1);

    manager.handle_backend_event(BackendEvent::PlayerStateChanged(PlayerState::Started));
    manager.pause().unwrap();

    let saved = harness.last_snapshot().unwrap();
    assert_eq!(harness.snapshot_count(), 2);
    assert_eq!(saved.current_index, Some(1));
    assert_eq!(saved.position_ms, 42_500);
}

// ===== Queue editing =====

#[test]
fn enqueue_with_autoplay_starts_first_inserted() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b"]);
    manager.set_current_playing(0);

    manager
        .enqueue(tracks(&["x", "y"]), EnqueueMode::PlayNext, true)
        .unwrap();

    assert!(harness.calls.contains("local.play x"));
    assert_eq!(manager.queue().current_index(), Some(1));
    assert_eq!(manager.next().unwrap().track().id, "y");
    assert_eq!(harness.last_snapshot().unwrap().tracks.len(), 4);
}

#[test]
fn enqueue_replace_resets_playback() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b"]);
    start_playing(&mut manager, 1);

    manager
        .enqueue(tracks(&["x"]), EnqueueMode::Replace, false)
        .unwrap();

    assert_eq!(manager.queue().len(), 1);
    assert_eq!(manager.queue().current_index(), None);
    assert!(manager.current().is_none());
    assert_eq!(manager.state(), PlayerState::Idle);
}

#[test]
fn remove_before_current_keeps_playing_entry() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b", "c"]);
    start_playing(&mut manager, 2);

    manager.remove(0).unwrap();

    assert_eq!(manager.queue().current_index(), Some(1));
    assert_eq!(manager.current().unwrap().track().id, "c");
    assert_eq!(manager.state(), PlayerState::Started);
}

#[test]
fn remove_current_entry_resets_playback() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b", "c"]);
    start_playing(&mut manager, 1);

    manager.remove(1).unwrap();

    assert_eq!(manager.queue().len(), 2);
    assert_eq!(manager.queue().current_index(), None);
    assert_eq!(manager.state(), PlayerState::Idle);
    assert!(harness.calls.contains("local.reset"));
}

#[test]
fn remove_stale_index_is_ignored() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);

    manager.remove(4).unwrap();

    assert_eq!(manager.queue().len(), 1);
    assert_eq!(harness.snapshot_count(), 0);
}

#[test]
fn reorder_re_arms_next_entry() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b", "c"]);
    start_playing(&mut manager, 0);
    assert_eq!(manager.next().unwrap().track().id, "b");

    manager.reorder(2, 1).unwrap();

    assert_eq!(manager.queue().current_index(), Some(0));
    assert_eq!(manager.next().unwrap().track().id, "c");
}

#[test]
fn restore_starts_and_seeks_saved_position() {
    let harness = Harness::new();
    let mut manager = harness.manager();

    let snapshot = QueueSnapshot {
        tracks: tracks(&["x", "y", "z"]),
        current_index: Some(1),
        position_ms: 30_000,
    };
    manager.restore(snapshot, true).unwrap();

    let calls = harness.calls.entries();
    let played = calls.iter().position(|c| c == "local.play y").unwrap();
    let seeked = calls.iter().position(|c| c == "local.seek 30000").unwrap();
    assert!(played < seeked);
    assert_eq!(manager.queue().len(), 3);
}

#[test]
fn restore_with_stale_index_only_rebuilds_queue() {
    let harness = Harness::new();
    let mut manager = harness.manager();

    let snapshot = QueueSnapshot {
        tracks: tracks(&["x"]),
        current_index: Some(5),
        position_ms: 1_000,
    };
    manager.restore(snapshot, true).unwrap();

    assert_eq!(manager.queue().len(), 1);
    assert_eq!(manager.queue().current_index(), None);
    assert!(!harness.calls.entries().iter().any(|c| c.starts_with("local.seek")));
}

// ===== Observers =====

#[test]
fn observers_receive_each_change_once_in_order() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b"]);

    manager.play_index(0, true).unwrap();
    manager.handle_backend_event(BackendEvent::PlayerStateChanged(PlayerState::Started));
    // Repeated state is not a change
    manager.handle_backend_event(BackendEvent::PlayerStateChanged(PlayerState::Started));

    assert_eq!(
        harness.events.entries(),
        vec![
            "transport idle a",
            "widget a false",
            "notification.start idle",
            "now_playing true",
            "transport started a",
            "widget a true",
            "notification.update started",
            "now_playing true",
            "scrobble a false",
        ]
    );
}

#[test]
fn completion_is_scrobbled_as_played() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a", "b"]);
    start_playing(&mut manager, 0);

    manager.handle_backend_event(BackendEvent::PlayerStateChanged(PlayerState::Completed));

    assert!(harness.events.contains("scrobble a true"));
}

#[test]
fn stop_with_nothing_selected_requests_service_stop() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);

    manager.stop().unwrap();

    assert_eq!(
        harness.events.entries(),
        vec![
            "transport stopped none",
            "widget none false",
            "now_playing false",
            "notification.stop",
            "transport.release",
            "lifecycle.stop",
        ]
    );
}

#[test]
fn reset_while_playing_tears_down_without_stopping_service() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);
    start_playing(&mut manager, 0);
    harness.reset_logs();

    manager.clear(true);

    assert!(harness.events.contains("notification.stop"));
    assert!(harness.events.contains("transport.release"));
    assert!(!harness.events.contains("lifecycle.stop"));
}

#[test]
fn stopping_a_selected_track_keeps_service_alive() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);
    start_playing(&mut manager, 0);
    harness.reset_logs();

    manager.stop().unwrap();

    assert!(harness.events.contains("notification.stop"));
    assert!(!harness.events.contains("lifecycle.stop"));
}

#[test]
fn shutdown_swallows_teardown_errors() {
    let harness = Harness::new();
    let mut manager = harness.manager_with(&["a"]);

    manager.shutdown();

    assert!(harness.calls.contains("local.release"));
    assert!(harness.calls.contains("downloads.stop"));
}
