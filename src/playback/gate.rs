// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Learning mode gate.

use std::collections::BTreeSet;

use crate::timeline::Pitch;

/// Outcome of pressing a key while gated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePress {
    /// Expected and newly satisfied
    Accepted,
    /// Expected but already satisfied
    Repeated,
    /// Not expected
    Wrong,
}

/// Frozen-time state waiting for a set of pitches
#[derive(Debug, Clone, PartialEq)]
pub struct LearningGate {
    gate_time: f64,
    expected: BTreeSet<Pitch>,
    satisfied: BTreeSet<Pitch>,
}

impl LearningGate {
    /// Open a gate at `gate_time` requiring every pitch in `expected`
    pub fn new(gate_time: f64, expected: impl IntoIterator<Item = Pitch>) -> Self {
        Self {
            gate_time,
            expected: expected.into_iter().collect(),
            satisfied: BTreeSet::new(),
        }
    }

    pub fn gate_time(&self) -> f64 {
        self.gate_time
    }

    pub fn expected(&self) -> &BTreeSet<Pitch> {
        &self.expected
    }

    pub fn satisfied(&self) -> &BTreeSet<Pitch> {
        &self.satisfied
    }

    /// Expected pitches not yet pressed
    pub fn remaining(&self) -> impl Iterator<Item = Pitch> + '_ {
        self.expected.difference(&self.satisfied).copied()
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied == self.expected
    }

    /// Register a key press
    pub fn press(&mut self, pitch: Pitch) -> GatePress {
        if !self.expected.contains(&pitch) {
            GatePress::Wrong
        } else if self.satisfied.insert(pitch) {
            GatePress::Accepted
        } else {
            GatePress::Repeated
        }
    }
}
