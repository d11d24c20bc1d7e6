// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing and clock module.
//!
//! This module provides the wall clock sources that drive song time
//! and the tempo multiplier range.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock, TempoRange, WallTime, MAX_TEMPO, MIN_TEMPO};
