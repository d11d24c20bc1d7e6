// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Falling-note piano roll.
//!
//! Notes fall from the top of the panel toward the keyboard strip. The
//! bottom row is the current song time; the top row is `lookahead`
//! seconds ahead.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

use crate::timeline::{is_black_key, Pitch, Timeline};

/// What one cell of the roll shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollCell {
    Empty,
    /// A note still to be played
    Upcoming,
    /// A note the learning gate is waiting for
    Waiting,
    /// A note already played or skipped
    Played,
}

/// Window of the song shown by the roll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollView {
    pub song_time: f64,
    /// Seconds shown above the now line
    pub lookahead: f64,
    pub low: Pitch,
    pub high: Pitch,
    pub gate_time: Option<f64>,
}

/// Lay out the roll as `rows` rows of one cell per pitch, top row first.
pub fn roll_rows(timeline: &Timeline, view: &RollView, rows: usize) -> Vec<Vec<RollCell>> {
    let columns = view.high.saturating_sub(view.low) as usize + 1;
    let mut grid = vec![vec![RollCell::Empty; columns]; rows];
    if rows == 0 || view.high < view.low || view.lookahead <= 0.0 {
        return grid;
    }

    let slice = view.lookahead / rows as f64;
    for note in timeline.upcoming(view.song_time, view.lookahead) {
        if note.pitch() < view.low || note.pitch() > view.high {
            continue;
        }
        let cell = if note.is_consumed() {
            RollCell::Played
        } else if view.gate_time == Some(note.start_time()) {
            RollCell::Waiting
        } else {
            RollCell::Upcoming
        };
        let column = (note.pitch() - view.low) as usize;

        for from_bottom in 0..rows {
            let slice_start = view.song_time + from_bottom as f64 * slice;
            let slice_end = slice_start + slice;
            let overlaps = note.start_time() < slice_end
                && (note.end_time() > slice_start || note.start_time() >= slice_start);
            if overlaps {
                grid[rows - 1 - from_bottom][column] = cell;
            }
        }
    }
    grid
}

/// Piano roll widget
pub struct RollWidget<'a> {
    timeline: &'a Timeline,
    view: RollView,
    block: Option<Block<'a>>,
}

impl<'a> RollWidget<'a> {
    pub fn new(timeline: &'a Timeline, view: RollView) -> Self {
        Self {
            timeline,
            view,
            block: None,
        }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for RollWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if self.timeline.is_empty() {
            Paragraph::new("No notes loaded")
                .style(Style::default().fg(Color::DarkGray))
                .render(area, buf);
            return;
        }

        let grid = roll_rows(self.timeline, &self.view, area.height as usize);
        let lines: Vec<Line> = grid
            .iter()
            .map(|row| {
                Line::from(
                    row.iter()
                        .enumerate()
                        .map(|(i, cell)| {
                            let pitch = self.view.low + i as Pitch;
                            render_cell(*cell, is_black_key(pitch))
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        Paragraph::new(lines).render(area, buf);
    }
}

fn render_cell(cell: RollCell, black: bool) -> Span<'static> {
    match cell {
        RollCell::Empty if black => Span::styled("··", Style::default().fg(Color::DarkGray)),
        RollCell::Empty => Span::raw("  "),
        RollCell::Upcoming => Span::styled("██", Style::default().fg(Color::Cyan)),
        RollCell::Waiting => Span::styled("██", Style::default().fg(Color::Yellow)),
        RollCell::Played => Span::styled("░░", Style::default().fg(Color::DarkGray)),
    }
}
