// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song clock and playback state machine.
//!
//! Song time is never accumulated frame by frame. It is projected from
//! an anchor pair `(anchor_song_time, anchor_wall_time)`:
//!
//! ```text
//! song_time = anchor_song_time + (now - anchor_wall_time) * tempo
//! ```
//!
//! The anchor is re-taken whenever the relationship between song time
//! and wall time changes (start, resume, tempo change, seek, gate exit),
//! so variable frame rates cannot cause drift.

use std::collections::BTreeSet;

use tracing::{debug, info, trace};

use super::{
    GatePress, LearningGate, ModeSwitch, PlaybackMode, PlaybackSignal, PlaybackSnapshot,
    PlaybackStatus, SwitchResolution, TimelineHandoff,
};
use crate::timeline::{Pitch, Timeline};
use crate::timing::{TempoRange, WallTime};

/// Slack when comparing projected song time against note boundaries.
///
/// `now - anchor_wall_time` loses low bits once wall time is large, so a
/// projection that should land on a boundary can fall just short of it.
const BOUNDARY_EPS: f64 = 1e-9;

/// Owner of the song timeline and all playback state
#[derive(Debug)]
pub struct PlaybackCore {
    timeline: Timeline,
    /// Cached `timeline.total_duration()`
    total_duration: f64,
    mode: PlaybackMode,
    status: PlaybackStatus,
    song_time: f64,
    tempo: f64,
    tempo_range: TempoRange,
    anchor_song_time: f64,
    anchor_wall_time: WallTime,
    gate: Option<LearningGate>,
    pending_switch: Option<ModeSwitch>,
    handoff: Option<TimelineHandoff>,
    signals: Vec<PlaybackSignal>,
    /// `Finished` already emitted for this pass through the song
    finished: bool,
}

impl PlaybackCore {
    /// Create a stopped core at time 0
    pub fn new(timeline: Timeline, mode: PlaybackMode) -> Self {
        let total_duration = timeline.total_duration();
        Self {
            timeline,
            total_duration,
            mode,
            status: PlaybackStatus::Stopped,
            song_time: 0.0,
            tempo: 1.0,
            tempo_range: TempoRange::default(),
            anchor_song_time: 0.0,
            anchor_wall_time: 0.0,
            gate: None,
            pending_switch: None,
            handoff: None,
            signals: Vec::new(),
            finished: false,
        }
    }

    /// Use a custom tempo range; the current tempo is re-clamped
    pub fn with_tempo_range(mut self, range: TempoRange) -> Self {
        self.tempo_range = range;
        self.tempo = range.clamp(self.tempo);
        self
    }

    /// Poll `handoff` for replacement timelines on every tick
    pub fn attach_handoff(&mut self, handoff: TimelineHandoff) {
        self.handoff = Some(handoff);
    }

    // Accessors

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn song_time(&self) -> f64 {
        self.song_time
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn tempo_range(&self) -> TempoRange {
        self.tempo_range
    }

    pub fn gate(&self) -> Option<&LearningGate> {
        self.gate.as_ref()
    }

    pub fn is_gated(&self) -> bool {
        self.gate.is_some()
    }

    pub fn pending_switch(&self) -> Option<&ModeSwitch> {
        self.pending_switch.as_ref()
    }

    /// Signals emitted since the last drain
    pub fn pending_signals(&self) -> &[PlaybackSignal] {
        &self.signals
    }

    /// Take all signals emitted since the last drain
    pub fn drain_signals(&mut self) -> Vec<PlaybackSignal> {
        std::mem::take(&mut self.signals)
    }

    /// Per-frame view for the render sink
    pub fn snapshot(&self) -> PlaybackSnapshot {
        let (gate_time, expected, satisfied) = match &self.gate {
            Some(gate) => (
                Some(gate.gate_time()),
                gate.expected().iter().copied().collect(),
                gate.satisfied().iter().copied().collect(),
            ),
            None => (None, Vec::new(), Vec::new()),
        };

        PlaybackSnapshot {
            song_time: self.song_time,
            total_duration: self.total_duration,
            status: self.status,
            mode: self.mode,
            tempo: self.tempo,
            gate_time,
            expected,
            satisfied,
            pending_mode: self.pending_switch.map(|s| s.target),
        }
    }

    // Transport

    /// Start from the top when stopped, or resume when paused.
    ///
    /// Ignored while already playing or while a mode switch awaits
    /// confirmation.
    pub fn start(&mut self, now: WallTime) {
        if self.pending_switch.is_some() {
            debug!("start ignored: mode switch pending");
            return;
        }

        match self.status {
            PlaybackStatus::Playing => return,
            PlaybackStatus::Stopped => {
                self.rewind(now);
                info!(mode = self.mode.label(), notes = self.timeline.len(), "playback started");
            }
            PlaybackStatus::UserPaused => {
                self.set_anchor(self.song_time, now);
                debug!(song_time = self.song_time, "playback resumed");
            }
        }

        self.status = PlaybackStatus::Playing;
        if self.mode == PlaybackMode::Learning {
            self.gate = None;
        }
    }

    /// Pause playback.
    ///
    /// No-op unless playing and ungated: a learning gate already holds
    /// time and takes precedence.
    pub fn pause(&mut self, now: WallTime) {
        if self.status != PlaybackStatus::Playing
            || self.gate.is_some()
            || self.pending_switch.is_some()
        {
            return;
        }

        // Bring the playhead up to date; this may open a gate
        self.advance_playhead(now);
        if self.gate.is_some() {
            return;
        }

        self.status = PlaybackStatus::UserPaused;
        debug!(song_time = self.song_time, "playback paused");
    }

    /// Toggle between playing and paused; starts when stopped
    pub fn toggle_play(&mut self, now: WallTime) {
        match self.status {
            PlaybackStatus::Playing => self.pause(now),
            PlaybackStatus::Stopped | PlaybackStatus::UserPaused => self.start(now),
        }
    }

    /// Stop and rewind to time 0. Idempotent.
    pub fn stop(&mut self, now: WallTime) {
        if self.status != PlaybackStatus::Stopped {
            info!(song_time = self.song_time, "playback stopped");
        }
        self.status = PlaybackStatus::Stopped;
        self.rewind(now);
    }

    /// Move the playhead; the target is clamped to the song.
    ///
    /// All notes become unconsumed again, so in presentation mode notes
    /// before the target replay their signals on the next tick. In
    /// learning mode notes starting before the target count as resolved,
    /// so the next gate is the first note at or after the target.
    pub fn seek(&mut self, target_time: f64, now: WallTime) {
        let target = if target_time.is_finite() {
            target_time.clamp(0.0, self.total_duration)
        } else {
            0.0
        };

        self.silence_sounding();
        self.timeline.reset_progress();
        if self.mode == PlaybackMode::Learning {
            self.timeline.resolve_before(target - BOUNDARY_EPS);
        }
        self.gate = None;
        self.finished = false;
        self.song_time = target;
        self.set_anchor(target, now);
        info!(target, "seek");
    }

    /// Seek relative to the current position
    pub fn seek_by(&mut self, delta: f64, now: WallTime) {
        self.seek(self.song_time + delta, now);
    }

    /// Change the tempo multiplier without moving the playhead
    pub fn set_tempo(&mut self, multiplier: f64, now: WallTime) {
        let tempo = self.tempo_range.clamp(multiplier);

        if self.status == PlaybackStatus::Playing {
            self.advance_playhead(now);
        }
        self.set_anchor(self.song_time, now);
        self.tempo = tempo;
        debug!(tempo, song_time = self.song_time, "tempo changed");
    }

    /// Adjust the tempo multiplier by `delta`
    pub fn nudge_tempo(&mut self, delta: f64, now: WallTime) {
        self.set_tempo(self.tempo + delta, now);
    }

    /// Advance song time to `now`. Call once per frame.
    ///
    /// Replacement timelines queued on the hand-off are applied first.
    pub fn advance(&mut self, now: WallTime) {
        self.poll_handoff(now);
        if self.status == PlaybackStatus::Playing {
            self.advance_playhead(now);
        }
    }

    // Input

    /// A key went down.
    ///
    /// Only meaningful while a learning gate is open.
    pub fn on_key_press(&mut self, pitch: Pitch, now: WallTime) {
        if self.mode != PlaybackMode::Learning {
            return;
        }
        let Some(gate) = self.gate.as_mut() else {
            return;
        };

        match gate.press(pitch) {
            GatePress::Accepted => {
                self.signals.push(PlaybackSignal::Correct(pitch));
                trace!(pitch, "correct key");
                if gate.is_satisfied() {
                    self.close_gate(now, false);
                }
            }
            GatePress::Repeated => {}
            GatePress::Wrong => {
                self.signals.push(PlaybackSignal::Incorrect(pitch));
                trace!(pitch, "wrong key");
            }
        }
    }

    /// A key went up. Key-up only matters to the sink's key display.
    pub fn on_key_release(&mut self, pitch: Pitch) {
        trace!(pitch, "key released");
    }

    /// Give up on the current gate and move on
    pub fn on_skip(&mut self, now: WallTime) {
        if self.gate.is_some() {
            self.close_gate(now, true);
        }
    }

    // Mode switching

    /// Propose switching to `target`.
    ///
    /// Holds playback at the current position until
    /// [`resolve_mode_switch`](Self::resolve_mode_switch) is called.
    /// Returns false if a proposal is already pending or `target` is the
    /// current mode.
    pub fn propose_mode_switch(&mut self, target: PlaybackMode, now: WallTime) -> bool {
        if self.pending_switch.is_some() || target == self.mode {
            return false;
        }

        let previous_status = self.status;
        if self.status == PlaybackStatus::Playing {
            self.advance_playhead(now);
            self.status = PlaybackStatus::UserPaused;
        }

        self.pending_switch = Some(ModeSwitch::new(target, previous_status));
        debug!(target = target.label(), "mode switch proposed");
        true
    }

    /// Confirm or cancel the pending proposal.
    ///
    /// Returns false if nothing was pending.
    pub fn resolve_mode_switch(&mut self, resolution: SwitchResolution, now: WallTime) -> bool {
        let Some(switch) = self.pending_switch.take() else {
            return false;
        };

        match resolution {
            SwitchResolution::Reset => {
                self.silence_sounding();
                self.mode = switch.target;
                self.gate = None;
                self.stop(now);
            }
            SwitchResolution::Continue => {
                self.silence_sounding();
                self.mode = switch.target;
                self.gate = None;
                self.status = switch.status_after_continue();
                self.set_anchor(self.song_time, now);
            }
            SwitchResolution::Cancel => {
                self.status = switch.status_after_cancel();
                self.set_anchor(self.song_time, now);
                debug!("mode switch cancelled");
                return true;
            }
        }

        info!(
            mode = self.mode.label(),
            resolution = resolution.label(),
            "mode switch applied"
        );
        true
    }

    // Timeline

    /// Replace the whole timeline and stop
    pub fn load_timeline(&mut self, timeline: Timeline, now: WallTime) {
        self.silence_sounding();
        self.timeline = timeline;
        self.total_duration = self.timeline.total_duration();
        self.gate = None;
        self.stop(now);
        info!(
            notes = self.timeline.len(),
            duration = self.total_duration,
            "timeline loaded"
        );
    }

    fn poll_handoff(&mut self, now: WallTime) {
        let latest = self.handoff.as_ref().and_then(TimelineHandoff::latest);
        if let Some(timeline) = latest {
            self.load_timeline(timeline, now);
        }
    }

    // Internals

    fn set_anchor(&mut self, song_time: f64, now: WallTime) {
        self.anchor_song_time = song_time;
        self.anchor_wall_time = now;
    }

    /// Reset to time 0 with all notes unplayed
    fn rewind(&mut self, now: WallTime) {
        self.silence_sounding();
        self.timeline.reset_progress();
        self.gate = None;
        self.finished = false;
        self.song_time = 0.0;
        self.set_anchor(0.0, now);
    }

    /// Project song time to `now` and react to it. Assumes PLAYING.
    fn advance_playhead(&mut self, now: WallTime) {
        if self.gate.is_some() {
            return;
        }

        let elapsed = (now - self.anchor_wall_time).max(0.0);
        let projected = self.anchor_song_time + elapsed * self.tempo;
        self.song_time = if projected + BOUNDARY_EPS >= self.total_duration {
            self.total_duration
        } else {
            projected
        };

        match self.mode {
            PlaybackMode::Presentation => self.trigger_notes(),
            PlaybackMode::Learning => self.open_gate_if_due(now),
        }

        self.check_finished();
    }

    /// Presentation mode: fire note-on and note-off signals up to song time
    fn trigger_notes(&mut self) {
        let horizon = self.song_time + BOUNDARY_EPS;

        // Release notes from earlier frames first, so a note that ends
        // where the next one on the same pitch starts leaves the key down
        for note in self.timeline.notes_mut() {
            if note.is_consumed() && !note.is_released() && note.end_time() <= horizon {
                note.release();
                trace!(pitch = note.pitch(), "note off");
                self.signals.push(PlaybackSignal::NoteOff(note.pitch()));
            }
        }

        for note in self.timeline.notes_mut() {
            if note.start_time() > horizon {
                break;
            }
            if note.is_consumed() {
                continue;
            }

            note.consume();
            trace!(pitch = note.pitch(), "note on");
            self.signals.push(PlaybackSignal::NoteOn(note.pitch()));

            // Started and ended within this frame
            if note.end_time() <= horizon {
                note.release();
                self.signals.push(PlaybackSignal::NoteOff(note.pitch()));
            }
        }
    }

    /// Learning mode: freeze at the earliest unresolved note once reached
    fn open_gate_if_due(&mut self, now: WallTime) {
        let Some(gate_time) = self.timeline.next_unconsumed_start() else {
            return;
        };
        if gate_time > self.song_time + BOUNDARY_EPS {
            return;
        }

        let expected: BTreeSet<Pitch> = self
            .timeline
            .notes()
            .iter()
            .filter(|n| !n.is_consumed() && n.start_time() == gate_time)
            .map(|n| n.pitch())
            .collect();

        self.song_time = gate_time;
        self.set_anchor(gate_time, now);

        let pitches: Vec<Pitch> = expected.iter().copied().collect();
        debug!(gate_time, ?pitches, "learning gate opened");
        self.signals.push(PlaybackSignal::GateOpened { gate_time, pitches });
        self.gate = Some(LearningGate::new(gate_time, expected));
    }

    /// Resolve the gated notes and let time run from the gate instant
    fn close_gate(&mut self, now: WallTime, skipped: bool) {
        let Some(gate) = self.gate.take() else {
            return;
        };
        let gate_time = gate.gate_time();

        for note in self.timeline.notes_mut() {
            if !note.is_consumed() && note.start_time() == gate_time {
                note.consume();
            }
        }

        self.song_time = gate_time;
        self.set_anchor(gate_time, now);
        self.signals.push(PlaybackSignal::GateCleared { gate_time, skipped });
        debug!(gate_time, skipped, "learning gate cleared");
    }

    /// Emit note-off for every note still sounding
    fn silence_sounding(&mut self) {
        for note in self.timeline.notes_mut() {
            if note.is_consumed() && !note.is_released() {
                note.release();
                if self.mode == PlaybackMode::Presentation {
                    self.signals.push(PlaybackSignal::NoteOff(note.pitch()));
                }
            }
        }
    }

    fn check_finished(&mut self) {
        if self.finished || self.timeline.is_empty() || self.song_time < self.total_duration {
            return;
        }

        let resolved = self.timeline.notes().iter().all(|n| {
            n.is_consumed() && (self.mode == PlaybackMode::Learning || n.is_released())
        });
        if resolved {
            self.finished = true;
            self.signals.push(PlaybackSignal::Finished);
            info!("song finished");
        }
    }
}
