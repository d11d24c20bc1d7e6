// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! pianola: a virtual piano that plays songs or waits for you to play them.
//!
//! The [`playback::PlaybackCore`] owns the song clock and the two
//! playback modes. Everything else feeds it (songs, settings, keyboard
//! and MIDI input) or renders what it reports.

pub mod config;
pub mod control;
pub mod midi;
pub mod playback;
pub mod timeline;
pub mod timing;
pub mod ui;
