// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Control system for computer-keyboard input.
//!
//! This module provides:
//! - Transport, tempo and mode-switch actions
//! - Keyboard shortcut handling
//! - A two-octave computer-keyboard piano

pub mod keyboard;

pub use keyboard::{format_shortcut, KeyBinding, KeyInput, KeyboardController, PianoKeys, Shortcut};

use crate::playback::{PlaybackCore, SwitchResolution};
use crate::timing::WallTime;

/// Action that can be triggered by controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    // Transport
    /// Toggle play/pause
    TogglePlay,
    /// Start or resume playback
    Play,
    /// Pause playback
    Pause,
    /// Stop and rewind
    Stop,

    // Tempo
    /// Set tempo multiplier
    SetTempo(f64),
    /// Adjust tempo multiplier by delta
    AdjustTempo(f64),

    // Position
    /// Move the playhead by a number of seconds
    SeekBy(f64),
    /// Move the playhead to an absolute time
    SeekTo(f64),
    /// Skip the notes the learning gate waits for
    Skip,

    // Mode
    /// Ask to switch to the other mode
    ProposeModeSwitch,
    /// Answer a pending mode switch
    ResolveModeSwitch(SwitchResolution),

    // Keyboard
    /// Move the computer-keyboard piano up an octave
    OctaveUp,
    /// Move the computer-keyboard piano down an octave
    OctaveDown,

    // UI
    /// Toggle help display
    ToggleHelp,
    /// Quit application
    Quit,
}

impl ControlAction {
    /// Check if this is a transport action
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ControlAction::TogglePlay
                | ControlAction::Play
                | ControlAction::Pause
                | ControlAction::Stop
                | ControlAction::SeekBy(_)
                | ControlAction::SeekTo(_)
                | ControlAction::Skip
        )
    }

    /// Check if this is a tempo action
    pub fn is_tempo(&self) -> bool {
        matches!(self, ControlAction::SetTempo(_) | ControlAction::AdjustTempo(_))
    }

    /// Apply the action to the playback core.
    ///
    /// Returns false for actions the core does not handle (UI and
    /// keyboard-layout actions).
    pub fn apply(&self, core: &mut PlaybackCore, now: WallTime) -> bool {
        match *self {
            ControlAction::TogglePlay => core.toggle_play(now),
            ControlAction::Play => core.start(now),
            ControlAction::Pause => core.pause(now),
            ControlAction::Stop => core.stop(now),
            ControlAction::SetTempo(multiplier) => core.set_tempo(multiplier, now),
            ControlAction::AdjustTempo(delta) => core.nudge_tempo(delta, now),
            ControlAction::SeekBy(delta) => core.seek_by(delta, now),
            ControlAction::SeekTo(time) => core.seek(time, now),
            ControlAction::Skip => core.on_skip(now),
            ControlAction::ProposeModeSwitch => {
                let target = core.mode().toggled();
                core.propose_mode_switch(target, now);
            }
            ControlAction::ResolveModeSwitch(resolution) => {
                core.resolve_mode_switch(resolution, now);
            }
            ControlAction::OctaveUp
            | ControlAction::OctaveDown
            | ControlAction::ToggleHelp
            | ControlAction::Quit => return false,
        }
        true
    }
}
