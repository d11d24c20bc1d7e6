// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Transport display widget.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Gauge, Paragraph, Widget},
};

use crate::playback::{PlaybackMode, PlaybackSnapshot, PlaybackStatus};
use crate::timeline::note_name;

/// Transport widget for displaying playback state
pub struct TransportWidget<'a> {
    snapshot: &'a PlaybackSnapshot,
    song_name: &'a str,
    block: Option<Block<'a>>,
}

impl<'a> TransportWidget<'a> {
    /// Create a new transport widget
    pub fn new(snapshot: &'a PlaybackSnapshot, song_name: &'a str) -> Self {
        Self {
            snapshot,
            song_name,
            block: None,
        }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for TransportWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(10), // Status
                Constraint::Length(16), // Mode
                Constraint::Length(17), // Position
                Constraint::Length(10), // Tempo
                Constraint::Min(0),     // Gate / song name
            ])
            .split(rows[0]);

        let snapshot = self.snapshot;

        let (indicator, style) = status_indicator(snapshot);
        Paragraph::new(indicator).style(style).render(chunks[0], buf);

        let mode_style = match snapshot.mode {
            PlaybackMode::Learning => Style::default().fg(Color::Yellow),
            PlaybackMode::Presentation => Style::default().fg(Color::Cyan),
        };
        Paragraph::new(format!("[{}]", snapshot.mode.label()))
            .style(mode_style.add_modifier(Modifier::BOLD))
            .render(chunks[1], buf);

        Paragraph::new(format!(
            "{} / {}",
            format_time(snapshot.song_time),
            format_time(snapshot.total_duration)
        ))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .render(chunks[2], buf);

        Paragraph::new(format!("x{:.2}", snapshot.tempo))
            .style(Style::default().fg(Color::Magenta))
            .render(chunks[3], buf);

        gate_line(snapshot, self.song_name).render(chunks[4], buf);

        Gauge::default()
            .gauge_style(Style::default().fg(Color::Blue))
            .ratio(snapshot.progress())
            .label("")
            .render(rows[1], buf);
    }
}

fn status_indicator(snapshot: &PlaybackSnapshot) -> (&'static str, Style) {
    match snapshot.status {
        PlaybackStatus::Playing if snapshot.is_gated() => (
            "◆ WAIT",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        PlaybackStatus::Playing => (
            "▶ PLAY",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        PlaybackStatus::UserPaused => ("‖ PAUSE", Style::default().fg(Color::Yellow)),
        PlaybackStatus::Stopped => ("■ STOP", Style::default().fg(Color::DarkGray)),
    }
}

/// Pitches the gate waits for, or the song name when not gated
fn gate_line<'a>(snapshot: &PlaybackSnapshot, song_name: &'a str) -> Paragraph<'a> {
    if !snapshot.is_gated() {
        return Paragraph::new(song_name).style(Style::default().fg(Color::White));
    }

    let mut spans = vec![Span::styled("Play: ", Style::default().fg(Color::Gray))];
    for pitch in &snapshot.expected {
        let style = if snapshot.satisfied.contains(pitch) {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        };
        spans.push(Span::styled(format!("{} ", note_name(*pitch)), style));
    }
    Paragraph::new(Line::from(spans))
}

/// Format seconds as `m:ss.t`
pub fn format_time(seconds: f64) -> String {
    let tenths = (seconds.max(0.0) * 10.0).round() as u64;
    format!("{}:{:02}.{}", tenths / 600, (tenths / 10) % 60, tenths % 10)
}
