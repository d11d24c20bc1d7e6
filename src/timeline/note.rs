// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scheduled notes and pitch naming.

/// MIDI note number (0-127)
pub type Pitch = u8;

/// Highest valid MIDI pitch
pub const MAX_PITCH: Pitch = 127;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// One scheduled musical event on the song timeline.
///
/// Timing values are in seconds of song time. Construction clamps
/// malformed input: negative or non-finite starts become 0, negative or
/// non-finite durations become 0, and pitches above 127 saturate.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pitch: Pitch,
    start_time: f64,
    duration: f64,
    /// Triggered or resolved (played, satisfied, or skipped)
    consumed: bool,
    /// Note-off already signalled (presentation mode)
    released: bool,
}

impl Note {
    /// Create a new unconsumed note
    pub fn new(pitch: Pitch, start_time: f64, duration: f64) -> Self {
        Self {
            pitch: pitch.min(MAX_PITCH),
            start_time: non_negative(start_time),
            duration: non_negative(duration),
            consumed: false,
            released: false,
        }
    }

    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Song time at which the note ends
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// A note is active on the half-open interval `[start, end)`
    pub fn is_active_at(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time()
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) fn consume(&mut self) {
        self.consumed = true;
    }

    pub(crate) fn release(&mut self) {
        self.released = true;
    }

    pub(crate) fn reset(&mut self) {
        self.consumed = false;
        self.released = false;
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Convert MIDI note number to name (60 = "C4")
pub fn note_name(pitch: Pitch) -> String {
    let octave = (pitch / 12) as i8 - 1;
    let name = NOTE_NAMES[(pitch % 12) as usize];
    format!("{}{}", name, octave)
}

/// Parse a scientific pitch name such as `C4`, `F#3` or `Bb-1`.
///
/// Returns `None` for unknown letters, missing octave, or a result
/// outside 0-127.
pub fn pitch_from_name(name: &str) -> Option<Pitch> {
    let name = name.trim();
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let base: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (accidental, octave_str) = match rest.chars().next() {
        Some('#') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest),
    };

    let octave: i32 = octave_str.parse().ok()?;
    let midi = (octave + 1) * 12 + base + accidental;
    if (0..=MAX_PITCH as i32).contains(&midi) {
        Some(midi as Pitch)
    } else {
        None
    }
}

/// Whether a pitch falls on a black key
pub fn is_black_key(pitch: Pitch) -> bool {
    matches!(pitch % 12, 1 | 3 | 6 | 8 | 10)
}
