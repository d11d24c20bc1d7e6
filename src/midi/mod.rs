// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI keyboard input.
//!
//! Raw bytes from an external keyboard are parsed into [`MidiMessage`]s
//! and reduced to the key presses and releases the playback core reacts
//! to.

pub mod input;

pub use input::{list_sources, print_sources, MidiKeyboard};

use crate::timeline::Pitch;

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;

    // System Real-Time Messages
    pub const TIMING_CLOCK: u8 = 0xF8;
    pub const ACTIVE_SENSING: u8 = 0xFE;
}

/// Parsed MIDI message types
#[derive(Debug, Clone, PartialEq)]
pub enum MidiMessage {
    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },
    /// Control Change: channel (0-15), controller (0-127), value (0-127)
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Anything else, kept for logging
    Other(Vec<u8>),
}

impl MidiMessage {
    /// Parse raw MIDI bytes into a MidiMessage
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;

        let msg_type = status & 0xF0;
        let channel = status & 0x0F;

        match (msg_type, rest) {
            (messages::NOTE_OFF, [note, velocity, ..]) => Some(MidiMessage::NoteOff {
                channel,
                note: note & 0x7F,
                velocity: velocity & 0x7F,
            }),
            (messages::NOTE_ON, [note, velocity, ..]) => {
                let velocity = velocity & 0x7F;
                // Note On with velocity 0 is equivalent to Note Off
                if velocity == 0 {
                    Some(MidiMessage::NoteOff {
                        channel,
                        note: note & 0x7F,
                        velocity: 0,
                    })
                } else {
                    Some(MidiMessage::NoteOn {
                        channel,
                        note: note & 0x7F,
                        velocity,
                    })
                }
            }
            (messages::CONTROL_CHANGE, [controller, value, ..]) => {
                Some(MidiMessage::ControlChange {
                    channel,
                    controller: controller & 0x7F,
                    value: value & 0x7F,
                })
            }
            _ => Some(MidiMessage::Other(data.to_vec())),
        }
    }

    /// Reduce to a piano key event, if this message is one
    pub fn key_event(&self) -> Option<KeyEvent> {
        match *self {
            MidiMessage::NoteOn { note, .. } => Some(KeyEvent::Press(note)),
            MidiMessage::NoteOff { note, .. } => Some(KeyEvent::Release(note)),
            _ => None,
        }
    }

    /// Clock and active-sensing bytes that arrive constantly
    pub fn is_realtime(&self) -> bool {
        matches!(
            self,
            MidiMessage::Other(data)
                if matches!(data.first(), Some(&messages::TIMING_CLOCK) | Some(&messages::ACTIVE_SENSING))
        )
    }
}

/// A key going down or up on an external keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Press(Pitch),
    Release(Pitch),
}
