// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Confirmed mode switching.
//!
//! Asking for a new mode only records a proposal and holds playback.
//! The switch takes effect once the player picks a resolution.

use super::{PlaybackMode, PlaybackStatus};

/// How a pending mode switch is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchResolution {
    /// Apply the new mode and rewind to the beginning
    Reset,
    /// Apply the new mode and keep playing from the current position
    Continue,
    /// Keep the current mode and restore the previous status
    Cancel,
}

impl SwitchResolution {
    pub fn label(self) -> &'static str {
        match self {
            SwitchResolution::Reset => "Reset",
            SwitchResolution::Continue => "Continue",
            SwitchResolution::Cancel => "Cancel",
        }
    }
}

/// An unconfirmed request to change mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSwitch {
    /// Requested mode
    pub target: PlaybackMode,
    /// Status before playback was held for the proposal
    pub previous_status: PlaybackStatus,
}

impl ModeSwitch {
    pub fn new(target: PlaybackMode, previous_status: PlaybackStatus) -> Self {
        Self {
            target,
            previous_status,
        }
    }

    /// Status to restore when the proposal is cancelled
    pub fn status_after_cancel(&self) -> PlaybackStatus {
        self.previous_status
    }

    /// Status after applying the switch without a reset
    pub fn status_after_continue(&self) -> PlaybackStatus {
        match self.previous_status {
            PlaybackStatus::Stopped => PlaybackStatus::Stopped,
            PlaybackStatus::Playing | PlaybackStatus::UserPaused => PlaybackStatus::Playing,
        }
    }
}
