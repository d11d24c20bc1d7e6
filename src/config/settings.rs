// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Player settings (TOML).
//!
//! ```toml
//! [tempo]
//! min = 0.5
//! max = 2.0
//! initial = 1.0
//! step = 0.1
//!
//! [playback]
//! mode = "learning"
//! seek_step = 5.0
//!
//! [ui]
//! frame_rate = 60
//! lookahead = 4.0
//! base_pitch = 60
//!
//! [midi]
//! input = 0
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::playback::PlaybackMode;
use crate::timeline::Pitch;
use crate::timing::{TempoRange, MAX_TEMPO, MIN_TEMPO};

/// Root of the settings file; every section is optional
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlayerConfig {
    #[serde(default)]
    pub tempo: TempoSettings,
    #[serde(default)]
    pub playback: PlaybackSettings,
    #[serde(default)]
    pub ui: UiSettings,
    #[serde(default)]
    pub midi: MidiSettings,
}

impl PlayerConfig {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate settings from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse settings TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize settings to TOML")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let TempoSettings { min, max, .. } = self.tempo;
        if !(min > 0.0 && min <= max && max.is_finite()) {
            return Err(ConfigError::InvalidTempoRange { min, max });
        }
        Ok(())
    }

    pub fn tempo_range(&self) -> TempoRange {
        TempoRange::new(self.tempo.min, self.tempo.max)
    }
}

/// Tempo multiplier limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TempoSettings {
    pub min: f64,
    pub max: f64,
    /// Multiplier used when a song does not set one
    pub initial: f64,
    /// Amount the tempo keys change the multiplier by
    pub step: f64,
}

impl Default for TempoSettings {
    fn default() -> Self {
        Self {
            min: MIN_TEMPO,
            max: MAX_TEMPO,
            initial: 1.0,
            step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Mode at startup
    pub mode: PlaybackMode,
    /// Seconds moved by the seek keys
    pub seek_step: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::Learning,
            seek_step: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiSettings {
    pub frame_rate: u32,
    /// Seconds of upcoming notes shown in the piano roll
    pub lookahead: f64,
    /// Pitch of the computer keyboard's lowest key
    pub base_pitch: Pitch,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            lookahead: 4.0,
            base_pitch: 60,
        }
    }
}

/// External MIDI keyboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MidiSettings {
    /// Input port index to connect at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<usize>,
}
