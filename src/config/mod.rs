// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for pianola.
//!
//! This module provides data structures for loading songs (YAML) and
//! player settings (TOML), plus a watcher that hot-reloads the song
//! being practised.

pub mod settings;
pub mod watcher;

pub use settings::{MidiSettings, PlaybackSettings, PlayerConfig, TempoSettings, UiSettings};
pub use watcher::{validate_song, SongEvent, SongWatcher};

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::playback::PlaybackMode;
use crate::timeline::{note_name, pitch_from_name, Note, Pitch, Timeline, MAX_PITCH};

/// Domain errors in songs and settings
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid note name: {0:?}")]
    InvalidNoteName(String),

    #[error("Pitch {0} is out of range (0-127)")]
    PitchOutOfRange(i64),

    #[error("Invalid tempo range: min {min}, max {max}")]
    InvalidTempoRange { min: f64, max: f64 },

    #[error("Song {0:?} has no notes")]
    EmptySong(String),
}

/// Root of a song file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongFile {
    /// Song metadata and settings
    pub song: SongConfig,
    /// Notes in any order
    #[serde(default)]
    pub notes: Vec<NoteEntry>,
}

impl SongFile {
    /// Load a song from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read song file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a song from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse song YAML")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize song to YAML")
    }

    /// Save the song to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write song file: {:?}", path.as_ref()))
    }

    /// Describe a timeline as a song file, pitches written as names
    pub fn from_timeline(name: impl Into<String>, timeline: &Timeline) -> Self {
        Self {
            song: SongConfig {
                name: name.into(),
                ..SongConfig::default()
            },
            notes: timeline
                .notes()
                .iter()
                .map(|n| NoteEntry {
                    pitch: PitchValue::Name(note_name(n.pitch())),
                    start: n.start_time(),
                    duration: n.duration(),
                })
                .collect(),
        }
    }

    /// Build the playable timeline.
    ///
    /// Fails on unresolvable pitches. Negative times are clamped by
    /// [`Note::new`].
    pub fn to_timeline(&self) -> Result<Timeline, ConfigError> {
        self.notes
            .iter()
            .map(NoteEntry::to_note)
            .collect::<Result<Vec<_>, _>>()
            .map(Timeline::from_notes)
    }

    /// Check that the song is playable and non-empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notes.is_empty() {
            return Err(ConfigError::EmptySong(self.song.name.clone()));
        }
        self.to_timeline().map(|_| ())
    }
}

/// Song-level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongConfig {
    /// Song name
    pub name: String,
    /// Initial tempo multiplier
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Preferred mode (overrides the player setting)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<PlaybackMode>,
}

fn default_tempo() -> f64 {
    1.0
}

impl Default for SongConfig {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            tempo: default_tempo(),
            mode: None,
        }
    }
}

/// One note as written in a song file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteEntry {
    /// MIDI number or note name
    pub pitch: PitchValue,
    /// Start in seconds
    #[serde(default)]
    pub start: f64,
    /// Length in seconds
    pub duration: f64,
}

impl NoteEntry {
    pub fn to_note(&self) -> Result<Note, ConfigError> {
        Ok(Note::new(self.pitch.resolve()?, self.start, self.duration))
    }
}

/// A pitch given as a MIDI number (`60`) or a name (`"C4"`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PitchValue {
    Number(i64),
    Name(String),
}

impl PitchValue {
    /// Resolve to a MIDI note number
    pub fn resolve(&self) -> Result<Pitch, ConfigError> {
        match self {
            PitchValue::Number(n) if (0..=MAX_PITCH as i64).contains(n) => Ok(*n as Pitch),
            PitchValue::Number(n) => Err(ConfigError::PitchOutOfRange(*n)),
            PitchValue::Name(name) => {
                pitch_from_name(name).ok_or_else(|| ConfigError::InvalidNoteName(name.clone()))
            }
        }
    }
}
