// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for pianola
//!
//! These tests drive the playback core through its public API with a
//! manual clock, the way the terminal UI drives it with the system clock.

use pianola::config::SongFile;
use pianola::playback::{
    PlaybackCore, PlaybackMode, PlaybackSignal, PlaybackStatus, SwitchResolution, TimelineHandoff,
};
use pianola::timeline::{Note, Timeline};
use pianola::timing::{Clock, ManualClock};

const EPS: f64 = 1e-9;

fn long_song() -> Timeline {
    Timeline::from_notes(vec![Note::new(60, 0.0, 1.0), Note::new(72, 100.0, 1.0)])
}

fn count(signals: &[PlaybackSignal], pred: impl Fn(&PlaybackSignal) -> bool) -> usize {
    signals.iter().filter(|s| pred(s)).count()
}

/// One advance over an interval lands where ten smaller ones do
#[test]
fn test_advance_is_frame_rate_independent() {
    for tempo in [0.5, 1.0, 1.5, 2.0] {
        let clock = ManualClock::new(0.0);

        let mut once = PlaybackCore::new(long_song(), PlaybackMode::Presentation);
        let mut often = PlaybackCore::new(long_song(), PlaybackMode::Presentation);
        for core in [&mut once, &mut often] {
            core.set_tempo(tempo, clock.now());
            core.start(clock.now());
        }

        for _ in 0..10 {
            clock.advance(0.2);
            often.advance(clock.now());
        }
        once.advance(clock.now());

        assert!((once.song_time() - often.song_time()).abs() < EPS);
        assert!((once.song_time() - 2.0 * tempo).abs() < EPS);
    }
}

#[test]
fn test_seek_then_advance_is_exact() {
    let clock = ManualClock::new(0.0);
    let mut core = PlaybackCore::new(Timeline::demo(), PlaybackMode::Presentation);
    core.start(clock.now());

    clock.set(5.0);
    for (target, expected) in [(3.0, 3.0), (-1.0, 0.0), (1000.0, 8.0), (f64::NAN, 0.0)] {
        core.seek(target, clock.now());
        core.advance(clock.now());
        assert_eq!(core.song_time(), expected);
    }
}

#[test]
fn test_learning_seek_stays_at_target() {
    let clock = ManualClock::new(0.0);
    let timeline = Timeline::from_notes(vec![
        Note::new(60, 0.0, 1.0),
        Note::new(62, 5.0, 1.0),
        Note::new(64, 9.0, 1.0),
    ]);
    let mut core = PlaybackCore::new(timeline, PlaybackMode::Learning);
    core.start(clock.now());
    core.advance(clock.now());
    core.on_key_press(60, clock.now());
    assert!(!core.is_gated());

    clock.set(0.5);
    core.seek(7.0, clock.now());
    core.advance(clock.now());
    assert_eq!(core.song_time(), 7.0);
    assert!(!core.is_gated());

    clock.set(3.0);
    core.advance(clock.now());
    assert_eq!(core.gate().map(|g| g.gate_time()), Some(9.0));

    // Seeking back gates on the first note after the new position
    core.seek(2.0, clock.now());
    core.advance(clock.now());
    assert_eq!(core.song_time(), 2.0);
    clock.set(6.0);
    core.advance(clock.now());
    assert_eq!(core.gate().map(|g| g.gate_time()), Some(5.0));
}

#[test]
fn test_gate_freezes_time_until_resolved() {
    let clock = ManualClock::new(0.0);
    let timeline = Timeline::from_notes(vec![Note::new(60, 1.0, 1.0), Note::new(62, 3.0, 1.0)]);
    let mut core = PlaybackCore::new(timeline, PlaybackMode::Learning);
    core.start(clock.now());

    clock.set(2.0);
    core.advance(clock.now());
    assert!(core.is_gated());
    assert_eq!(core.song_time(), 1.0);

    for t in [3.0, 4.0, 10.0] {
        clock.set(t);
        core.advance(clock.now());
        assert_eq!(core.song_time(), 1.0);
    }

    // Wrong keys and pause change nothing
    core.on_key_press(61, clock.now());
    core.pause(clock.now());
    core.advance(clock.now());
    assert!(core.is_gated());
    assert_eq!(core.status(), PlaybackStatus::Playing);
    assert_eq!(core.song_time(), 1.0);

    core.on_skip(clock.now());
    assert!(!core.is_gated());

    // Time runs again from the gate instant
    clock.advance(0.5);
    core.advance(clock.now());
    assert!((core.song_time() - 1.5).abs() < EPS);

    let signals = core.drain_signals();
    assert!(signals.contains(&PlaybackSignal::Incorrect(61)));
    assert!(signals.contains(&PlaybackSignal::GateCleared {
        gate_time: 1.0,
        skipped: true
    }));
}

#[test]
fn test_chord_gate_scenario() {
    let clock = ManualClock::new(0.0);
    let timeline = Timeline::from_notes(vec![Note::new(60, 0.0, 0.5), Note::new(64, 0.0, 0.5)]);
    let mut core = PlaybackCore::new(timeline, PlaybackMode::Learning);

    core.start(clock.now());
    core.advance(clock.now());
    let gate = core.gate().expect("gate should open at the chord");
    assert_eq!(gate.expected().iter().copied().collect::<Vec<_>>(), vec![60, 64]);

    core.on_key_press(60, clock.now());
    let gate = core.gate().expect("gate stays open after one key");
    assert_eq!(gate.satisfied().iter().copied().collect::<Vec<_>>(), vec![60]);

    core.on_key_press(64, clock.now());
    assert!(!core.is_gated());
    assert!(core.timeline().notes().iter().all(|n| n.is_consumed()));
    assert_eq!(core.song_time(), 0.0);
}

#[test]
fn test_gate_accepts_any_order_once() {
    let clock = ManualClock::new(0.0);
    let timeline = Timeline::from_notes(vec![
        Note::new(60, 0.0, 1.0),
        Note::new(64, 0.0, 1.0),
        Note::new(67, 0.0, 1.0),
        Note::new(72, 2.0, 1.0),
    ]);
    let mut core = PlaybackCore::new(timeline, PlaybackMode::Learning);
    core.start(clock.now());
    core.advance(clock.now());

    core.on_key_press(67, clock.now());
    core.on_key_press(60, clock.now());
    core.on_key_press(60, clock.now());
    core.on_key_press(50, clock.now());
    assert_eq!(core.gate().map(|g| g.satisfied().len()), Some(2));

    core.on_key_press(64, clock.now());
    core.on_key_press(64, clock.now());

    let signals = core.drain_signals();
    assert_eq!(
        count(&signals, |s| matches!(s, PlaybackSignal::GateCleared { .. })),
        1
    );
    assert_eq!(count(&signals, |s| matches!(s, PlaybackSignal::Correct(_))), 3);
    assert_eq!(count(&signals, |s| matches!(s, PlaybackSignal::Incorrect(_))), 1);
}

#[test]
fn test_presentation_scenario() {
    let timeline = Timeline::from_notes(vec![Note::new(67, 1.0, 0.4)]);

    for i in 0..2000 {
        let t0 = if i == 0 { 0.0 } else { 0.3 + 0.1 * i as f64 };
        let clock = ManualClock::new(t0);
        let mut core = PlaybackCore::new(timeline.clone(), PlaybackMode::Presentation);
        core.set_tempo(2.0, clock.now());
        core.start(clock.now());

        clock.set(t0 + 0.5);
        core.advance(clock.now());
        assert!((core.song_time() - 1.0).abs() < EPS, "t0 = {t0}");
        assert_eq!(core.drain_signals(), vec![PlaybackSignal::NoteOn(67)], "t0 = {t0}");

        clock.set(t0 + 0.7);
        core.advance(clock.now());
        assert_eq!(core.song_time(), 1.4, "t0 = {t0}");
        assert_eq!(
            core.drain_signals(),
            vec![PlaybackSignal::NoteOff(67), PlaybackSignal::Finished],
            "t0 = {t0}"
        );
    }
}

#[test]
fn test_stop_is_idempotent() {
    let clock = ManualClock::new(0.0);
    let mut core = PlaybackCore::new(Timeline::demo(), PlaybackMode::Presentation);
    core.start(clock.now());
    clock.set(0.2);
    core.advance(clock.now());
    core.drain_signals();

    core.stop(clock.now());
    let once = core.snapshot();
    let silenced = core.drain_signals();
    assert!(silenced.iter().all(|s| matches!(s, PlaybackSignal::NoteOff(_))));
    assert!(!silenced.is_empty());

    core.stop(clock.now());
    assert_eq!(core.snapshot(), once);
    assert!(core.drain_signals().is_empty());
    assert_eq!(once.status, PlaybackStatus::Stopped);
    assert_eq!(once.song_time, 0.0);
}

#[test]
fn test_tempo_change_is_continuous() {
    let clock = ManualClock::new(0.0);
    let mut core = PlaybackCore::new(long_song(), PlaybackMode::Presentation);
    core.start(clock.now());

    clock.set(1.0);
    core.advance(clock.now());
    let before = core.song_time();

    core.set_tempo(0.5, clock.now());
    assert_eq!(core.song_time(), before);
    core.advance(clock.now());
    assert_eq!(core.song_time(), before);

    clock.set(3.0);
    core.advance(clock.now());
    assert!((core.song_time() - 2.0).abs() < EPS);

    // Out-of-range requests are clamped, not refused
    core.set_tempo(10.0, clock.now());
    assert_eq!(core.tempo(), 2.0);
}

#[test]
fn test_mode_switch_continue_keeps_position() {
    let clock = ManualClock::new(0.0);
    let mut core = PlaybackCore::new(Timeline::demo(), PlaybackMode::Presentation);
    core.start(clock.now());

    clock.set(1.0);
    assert!(core.propose_mode_switch(PlaybackMode::Learning, clock.now()));
    assert_eq!(core.status(), PlaybackStatus::UserPaused);
    assert_eq!(core.snapshot().pending_mode, Some(PlaybackMode::Learning));

    // Held while the question is open
    clock.set(1.4);
    core.advance(clock.now());
    assert_eq!(core.song_time(), 1.0);

    assert!(core.resolve_mode_switch(SwitchResolution::Continue, clock.now()));
    assert_eq!(core.mode(), PlaybackMode::Learning);
    assert_eq!(core.status(), PlaybackStatus::Playing);
    assert_eq!(core.song_time(), 1.0);

    // Notes already played are not asked for; the next one is
    clock.set(2.0);
    core.advance(clock.now());
    assert_eq!(core.gate().map(|g| g.gate_time()), Some(1.5));
    assert_eq!(
        core.gate().map(|g| g.expected().iter().copied().collect::<Vec<_>>()),
        Some(vec![67])
    );
}

#[test]
fn test_mode_switch_reset_and_cancel() {
    let clock = ManualClock::new(0.0);
    let mut core = PlaybackCore::new(Timeline::demo(), PlaybackMode::Learning);
    core.start(clock.now());
    core.advance(clock.now());
    assert!(core.is_gated());

    assert!(core.propose_mode_switch(PlaybackMode::Presentation, clock.now()));
    assert!(!core.propose_mode_switch(PlaybackMode::Presentation, clock.now()));
    assert!(core.resolve_mode_switch(SwitchResolution::Cancel, clock.now()));
    assert_eq!(core.mode(), PlaybackMode::Learning);
    assert!(core.is_gated());

    assert!(core.propose_mode_switch(PlaybackMode::Presentation, clock.now()));
    assert!(core.resolve_mode_switch(SwitchResolution::Reset, clock.now()));
    assert_eq!(core.mode(), PlaybackMode::Presentation);
    assert_eq!(core.status(), PlaybackStatus::Stopped);
    assert!(!core.is_gated());
    assert!(!core.resolve_mode_switch(SwitchResolution::Reset, clock.now()));
}

#[test]
fn test_song_file_plays_to_finish() {
    let yaml = r#"
song:
  name: "Two Notes"
notes:
  - { pitch: C4, start: 0, duration: 0.5 }
  - { pitch: 62, start: 0.5, duration: 0.5 }
"#;
    let timeline = SongFile::from_yaml(yaml).unwrap().to_timeline().unwrap();
    let clock = ManualClock::new(0.0);
    let mut core = PlaybackCore::new(timeline, PlaybackMode::Presentation);
    core.start(clock.now());

    let mut signals = Vec::new();
    for _ in 0..33 {
        clock.advance(1.0 / 60.0);
        core.advance(clock.now());
        signals.extend(core.drain_signals());
    }

    assert_eq!(
        signals,
        vec![
            PlaybackSignal::NoteOn(60),
            PlaybackSignal::NoteOff(60),
            PlaybackSignal::NoteOn(62),
        ]
    );

    for _ in 0..40 {
        clock.advance(1.0 / 60.0);
        core.advance(clock.now());
        signals.extend(core.drain_signals());
    }
    assert_eq!(core.song_time(), 1.0);
    assert_eq!(
        count(&signals, |s| *s == PlaybackSignal::Finished),
        1
    );
}

#[test]
fn test_handoff_replaces_timeline() {
    let clock = ManualClock::new(0.0);
    let mut core = PlaybackCore::new(Timeline::demo(), PlaybackMode::Learning);
    let (sender, handoff) = TimelineHandoff::channel();
    core.attach_handoff(handoff);
    core.start(clock.now());

    assert!(sender.send(Timeline::from_notes(vec![Note::new(50, 0.0, 1.0)])));
    assert!(sender.send(Timeline::from_notes(vec![Note::new(52, 0.0, 2.0)])));

    clock.set(0.5);
    core.advance(clock.now());
    assert_eq!(core.status(), PlaybackStatus::Stopped);
    assert_eq!(core.timeline().len(), 1);
    assert_eq!(core.timeline().notes()[0].pitch(), 52);
    assert_eq!(core.total_duration(), 2.0);
}

#[test]
fn test_empty_timeline_is_harmless() {
    let clock = ManualClock::new(0.0);
    let mut core = PlaybackCore::new(Timeline::new(), PlaybackMode::Learning);
    core.start(clock.now());
    clock.set(3.0);
    core.advance(clock.now());
    core.seek(5.0, clock.now());
    core.on_skip(clock.now());

    assert_eq!(core.song_time(), 0.0);
    assert_eq!(core.total_duration(), 0.0);
    assert!(!core.is_gated());
    assert!(core.drain_signals().is_empty());
}

#[test]
fn test_bundled_files_load() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));

    let song = pianola::config::validate_song(root.join("songs/twinkle.yaml")).unwrap();
    let timeline = song.to_timeline().unwrap();
    assert_eq!(timeline.len(), 10);
    assert!((timeline.total_duration() - 3.9).abs() < EPS);
    assert_eq!(song.song.mode, Some(PlaybackMode::Learning));

    let config = pianola::config::PlayerConfig::load(root.join("pianola.toml")).unwrap();
    assert_eq!(config, pianola::config::PlayerConfig::default());
}
