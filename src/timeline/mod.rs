// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song timeline.
//!
//! A timeline is the set of notes a song is made of. Notes are kept
//! ordered by start time so that the playback core and the piano roll
//! can scan them front to back.

pub mod note;

pub use note::{is_black_key, note_name, pitch_from_name, Note, Pitch, MAX_PITCH};

/// Ordered collection of scheduled notes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    notes: Vec<Note>,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a timeline from notes in any order
    pub fn from_notes(mut notes: Vec<Note>) -> Self {
        // Stable, so simultaneous notes keep their relative order
        notes.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
        Self { notes }
    }

    /// Insert a note at its sorted position
    pub fn push(&mut self, note: Note) {
        let index = self
            .notes
            .partition_point(|n| n.start_time() <= note.start_time());
        self.notes.insert(index, note);
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Notes sorted by start time
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub(crate) fn notes_mut(&mut self) -> &mut [Note] {
        &mut self.notes
    }

    /// Latest end time over all notes, 0 when empty
    pub fn total_duration(&self) -> f64 {
        self.notes
            .iter()
            .map(Note::end_time)
            .fold(0.0, f64::max)
    }

    /// Notes sounding at the given time
    pub fn active_at(&self, time: f64) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(move |n| n.is_active_at(time))
    }

    /// Notes overlapping the window `[time, time + window)`.
    ///
    /// Used by the piano roll to draw what is about to fall onto the keys.
    pub fn upcoming(&self, time: f64, window: f64) -> impl Iterator<Item = &Note> {
        let horizon = time + window.max(0.0);
        self.notes
            .iter()
            .take_while(move |n| n.start_time() < horizon)
            .filter(move |n| n.end_time() > time || n.start_time() >= time)
    }

    /// Earliest start time among unconsumed notes
    pub fn next_unconsumed_start(&self) -> Option<f64> {
        // Sorted, so the first unconsumed note has the minimum start
        self.notes
            .iter()
            .find(|n| !n.is_consumed())
            .map(Note::start_time)
    }

    /// Lowest and highest pitch used
    pub fn pitch_range(&self) -> Option<(Pitch, Pitch)> {
        let low = self.notes.iter().map(Note::pitch).min()?;
        let high = self.notes.iter().map(Note::pitch).max()?;
        Some((low, high))
    }

    /// Clear consumed/released bookkeeping on every note
    pub(crate) fn reset_progress(&mut self) {
        for note in &mut self.notes {
            note.reset();
        }
    }

    /// Mark every note starting before `time` as played and released
    pub(crate) fn resolve_before(&mut self, time: f64) {
        for note in self.notes.iter_mut().take_while(|n| n.start_time() < time) {
            note.consume();
            note.release();
        }
    }

    /// Built-in practice song (opening phrase of "Ode to Joy")
    pub fn demo() -> Self {
        const PHRASE: [(Pitch, f64); 15] = [
            (64, 1.0), (64, 1.0), (65, 1.0), (67, 1.0),
            (67, 1.0), (65, 1.0), (64, 1.0), (62, 1.0),
            (60, 1.0), (60, 1.0), (62, 1.0), (64, 1.0),
            (64, 1.5), (62, 0.5), (62, 2.0),
        ];
        const BEAT: f64 = 0.5;

        let mut notes = Vec::with_capacity(PHRASE.len() + 2);
        let mut time = 0.0;
        for (pitch, beats) in PHRASE {
            notes.push(Note::new(pitch, time, beats * BEAT * 0.9));
            time += beats * BEAT;
        }
        // Left-hand support on the downbeats of the first and last bar
        notes.push(Note::new(48, 0.0, 4.0 * BEAT));
        notes.push(Note::new(43, 12.0 * BEAT, 4.0 * BEAT));

        Self::from_notes(notes)
    }
}

impl FromIterator<Note> for Timeline {
    fn from_iter<I: IntoIterator<Item = Note>>(iter: I) -> Self {
        Self::from_notes(iter.into_iter().collect())
    }
}
