// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback core for the virtual piano.
//!
//! This module owns the authoritative song time and everything that
//! depends on it:
//! - Anchor-based song clock with tempo scaling
//! - Presentation mode (auto-play with note-on/note-off signals)
//! - Learning mode gate that freezes time until the right keys are pressed
//! - Confirmed mode switching
//! - Thread-safe hand-off of new timelines from background producers

pub mod engine;
pub mod gate;
pub mod handoff;
pub mod mode_switch;

pub use engine::PlaybackCore;
pub use gate::{GatePress, LearningGate};
pub use handoff::{TimelineHandoff, TimelineSender};
pub use mode_switch::{ModeSwitch, SwitchResolution};

use serde::{Deserialize, Serialize};

use crate::timeline::Pitch;

/// How the song is played back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Time stops at every note until the player presses it
    #[default]
    Learning,
    /// Notes play themselves
    Presentation,
}

impl PlaybackMode {
    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            PlaybackMode::Learning => PlaybackMode::Presentation,
            PlaybackMode::Presentation => PlaybackMode::Learning,
        }
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            PlaybackMode::Learning => "Learning",
            PlaybackMode::Presentation => "Presentation",
        }
    }
}

/// Transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    /// Paused by the user (or by a pending mode switch)
    UserPaused,
}

/// Transient event for the render/audio sink.
///
/// Each signal is emitted exactly once by the call that caused it and
/// collected with [`PlaybackCore::drain_signals`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackSignal {
    /// A note started sounding (presentation mode)
    NoteOn(Pitch),
    /// A note stopped sounding
    NoteOff(Pitch),
    /// The player pressed a pitch the gate was waiting for
    Correct(Pitch),
    /// The player pressed a pitch the gate was not waiting for
    Incorrect(Pitch),
    /// Learning mode froze time at `gate_time` waiting for `pitches`
    GateOpened { gate_time: f64, pitches: Vec<Pitch> },
    /// The gate was satisfied, or skipped, and time runs again
    GateCleared { gate_time: f64, skipped: bool },
    /// The playhead reached the end of a non-empty song
    Finished,
}

impl PlaybackSignal {
    /// Pitch carried by the signal, if any
    pub fn pitch(&self) -> Option<Pitch> {
        match self {
            PlaybackSignal::NoteOn(p)
            | PlaybackSignal::NoteOff(p)
            | PlaybackSignal::Correct(p)
            | PlaybackSignal::Incorrect(p) => Some(*p),
            _ => None,
        }
    }
}

/// Per-frame view of the core for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub song_time: f64,
    pub total_duration: f64,
    pub status: PlaybackStatus,
    pub mode: PlaybackMode,
    pub tempo: f64,
    /// Song time the learning gate froze at
    pub gate_time: Option<f64>,
    /// Pitches the gate waits for (sorted)
    pub expected: Vec<Pitch>,
    /// Expected pitches already pressed (sorted)
    pub satisfied: Vec<Pitch>,
    /// Target of an unconfirmed mode switch
    pub pending_mode: Option<PlaybackMode>,
}

impl PlaybackSnapshot {
    /// Fraction of the song played, 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        if self.total_duration > 0.0 {
            (self.song_time / self.total_duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn is_gated(&self) -> bool {
        self.gate_time.is_some()
    }
}
