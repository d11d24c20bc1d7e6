// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Wall clock sources and tempo range.
//!
//! The playback core never samples time itself. The frame loop reads a
//! [`Clock`] once per tick and passes the value into every call.

use std::cell::Cell;
use std::time::Instant;

/// Slowest tempo multiplier allowed by default
pub const MIN_TEMPO: f64 = 0.5;

/// Fastest tempo multiplier allowed by default
pub const MAX_TEMPO: f64 = 2.0;

/// Monotonic wall time in seconds since a clock-specific origin
pub type WallTime = f64;

/// Source of monotonic wall time
pub trait Clock {
    /// Current time in seconds since the clock's origin
    fn now(&self) -> WallTime;
}

/// Real clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the moment of creation
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Convert an `Instant` (e.g. an input event timestamp) to clock time
    pub fn at(&self, instant: Instant) -> WallTime {
        instant.saturating_duration_since(self.origin).as_secs_f64()
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> WallTime {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock for tests and offline rendering
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<WallTime>,
}

impl ManualClock {
    /// Create a clock reading `start`
    pub fn new(start: WallTime) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Jump to an absolute time. Going backwards is ignored.
    pub fn set(&self, time: WallTime) {
        if time > self.now.get() {
            self.now.set(time);
        }
    }

    /// Move forward by `seconds`
    pub fn advance(&self, seconds: f64) {
        self.set(self.now.get() + seconds.max(0.0));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> WallTime {
        self.now.get()
    }
}

/// Inclusive range a tempo multiplier is clamped to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoRange {
    pub min: f64,
    pub max: f64,
}

impl TempoRange {
    /// Create a range; bounds are swapped if given in the wrong order
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Clamp a requested multiplier; non-finite input maps to 1.0 first
    pub fn clamp(&self, multiplier: f64) -> f64 {
        let multiplier = if multiplier.is_finite() { multiplier } else { 1.0 };
        multiplier.clamp(self.min, self.max)
    }

    pub fn contains(&self, multiplier: f64) -> bool {
        multiplier >= self.min && multiplier <= self.max
    }
}

impl Default for TempoRange {
    fn default() -> Self {
        Self::new(MIN_TEMPO, MAX_TEMPO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        thread::sleep(Duration::from_millis(5));
        let b = clock.now();
        assert!(b > a);
        assert!(b - a >= 0.004);
    }

    #[test]
    fn test_system_clock_at() {
        let clock = SystemClock::new();
        let later = Instant::now();
        assert!(clock.at(later) >= 0.0);
        assert!(clock.at(later) <= clock.now());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10.0);
        assert_eq!(clock.now(), 10.0);

        clock.advance(0.5);
        assert_eq!(clock.now(), 10.5);

        clock.set(12.0);
        assert_eq!(clock.now(), 12.0);

        // Never runs backwards
        clock.set(11.0);
        assert_eq!(clock.now(), 12.0);
        clock.advance(-1.0);
        assert_eq!(clock.now(), 12.0);
    }

    #[test]
    fn test_tempo_range_clamp() {
        let range = TempoRange::default();
        assert_eq!(range.clamp(1.0), 1.0);
        assert_eq!(range.clamp(0.1), MIN_TEMPO);
        assert_eq!(range.clamp(10.0), MAX_TEMPO);
        assert_eq!(range.clamp(f64::NAN), 1.0);
        assert!(range.contains(1.5));
        assert!(!range.contains(2.5));
    }

    #[test]
    fn test_tempo_range_swapped_bounds() {
        let range = TempoRange::new(3.0, 0.25);
        assert_eq!(range.min, 0.25);
        assert_eq!(range.max, 3.0);
    }
}
