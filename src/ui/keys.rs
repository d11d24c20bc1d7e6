// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyboard strip under the piano roll.

use std::collections::BTreeSet;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

use crate::control::PianoKeys;
use crate::playback::PlaybackSnapshot;
use crate::timeline::{is_black_key, note_name, Pitch};

/// Display state of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyState {
    pub pitch: Pitch,
    pub black: bool,
    /// Sounding from playback
    pub lit: bool,
    /// Held by the player
    pub held: bool,
    /// Waited for by the learning gate
    pub expected: bool,
    /// Waited for and already pressed
    pub satisfied: bool,
}

/// Key states for every pitch from `low` to `high`
pub fn key_states(
    low: Pitch,
    high: Pitch,
    snapshot: &PlaybackSnapshot,
    lit: &BTreeSet<Pitch>,
    held: &BTreeSet<Pitch>,
) -> Vec<KeyState> {
    (low..=high)
        .map(|pitch| KeyState {
            pitch,
            black: is_black_key(pitch),
            lit: lit.contains(&pitch),
            held: held.contains(&pitch),
            expected: snapshot.expected.contains(&pitch),
            satisfied: snapshot.satisfied.contains(&pitch),
        })
        .collect()
}

impl KeyState {
    fn style(&self) -> Style {
        let base = if self.black {
            Style::default().fg(Color::White).bg(Color::Black)
        } else {
            Style::default().fg(Color::Black).bg(Color::White)
        };

        if self.satisfied {
            base.bg(Color::Green)
        } else if self.expected {
            base.bg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if self.held {
            base.bg(Color::Magenta)
        } else if self.lit {
            base.bg(Color::Cyan)
        } else {
            base
        }
    }
}

/// Keyboard widget: key colours, then octave marks, then the computer
/// keys that play each pitch
pub struct KeysWidget<'a> {
    keys: &'a [KeyState],
    piano: &'a PianoKeys,
    block: Option<Block<'a>>,
}

impl<'a> KeysWidget<'a> {
    pub fn new(keys: &'a [KeyState], piano: &'a PianoKeys) -> Self {
        Self {
            keys,
            piano,
            block: None,
        }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for KeysWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let keys: Vec<Span> = self
            .keys
            .iter()
            .map(|key| Span::styled("▕▏", key.style()))
            .collect();

        let octaves: Vec<Span> = self
            .keys
            .iter()
            .map(|key| {
                if key.pitch % 12 == 0 {
                    Span::styled(
                        format!("{:<2}", note_name(key.pitch)),
                        Style::default().fg(Color::Gray),
                    )
                } else {
                    Span::raw("  ")
                }
            })
            .collect();

        let labels: Vec<Span> = self
            .keys
            .iter()
            .map(|key| match self.piano.key_for(key.pitch) {
                Some(c) => Span::styled(format!("{} ", c), Style::default().fg(Color::DarkGray)),
                None => Span::raw("  "),
            })
            .collect();

        Paragraph::new(vec![
            Line::from(keys.clone()),
            Line::from(keys),
            Line::from(octaves),
            Line::from(labels),
        ])
        .render(area, buf);
    }
}
