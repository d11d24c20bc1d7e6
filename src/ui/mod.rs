// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal UI for pianola.
//!
//! Provides a ratatui-based terminal interface with a transport bar, a
//! falling-note piano roll and a keyboard strip. The frame loop samples
//! the clock once per frame, feeds keyboard and MIDI input to the
//! playback core, advances it and renders what it reports.

mod keys;
mod roll;
mod transport;

pub use keys::{key_states, KeyState, KeysWidget};
pub use roll::{roll_rows, RollCell, RollView, RollWidget};
pub use transport::{format_time, TransportWidget};

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tracing::{info, warn};

use crate::config::{SongEvent, SongWatcher};
use crate::control::{format_shortcut, ControlAction, KeyInput, KeyboardController, PianoKeys};
use crate::midi::{KeyEvent, MidiKeyboard};
use crate::playback::{PlaybackCore, PlaybackSignal, PlaybackSnapshot};
use crate::timeline::{note_name, Pitch, Timeline};
use crate::timing::{Clock, WallTime};

/// Seconds a computer key counts as held; terminals report no release
const COMPUTER_KEY_HOLD: f64 = 0.2;

/// Keys on the computer-keyboard piano
const PIANO_SPAN: Pitch = 17;

/// Everything the frame loop drives
pub struct Session<C: Clock> {
    pub core: PlaybackCore,
    pub clock: C,
    pub keyboard: KeyboardController,
    pub midi: Option<MidiKeyboard>,
    pub watcher: Option<SongWatcher>,
    pub song_name: String,
    /// Seconds of upcoming notes shown in the roll
    pub lookahead: f64,
}

impl<C: Clock> Session<C> {
    pub fn new(core: PlaybackCore, clock: C, keyboard: KeyboardController) -> Self {
        Self {
            core,
            clock,
            keyboard,
            midi: None,
            watcher: None,
            song_name: "Untitled".to_string(),
            lookahead: 4.0,
        }
    }
}

/// UI state derived from the core's snapshots and signals
#[derive(Debug, Clone)]
pub struct UiState {
    pub snapshot: PlaybackSnapshot,
    pub song_name: String,
    /// Pitches sounding from playback
    pub lit: BTreeSet<Pitch>,
    /// Pitches held by the player
    pub held: BTreeSet<Pitch>,
    /// Release times for computer keys
    key_release_at: BTreeMap<Pitch, WallTime>,
    /// Help text visible
    pub show_help: bool,
    /// Status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
}

impl UiState {
    pub fn new(snapshot: PlaybackSnapshot, song_name: impl Into<String>) -> Self {
        Self {
            snapshot,
            song_name: song_name.into(),
            lit: BTreeSet::new(),
            held: BTreeSet::new(),
            key_release_at: BTreeMap::new(),
            show_help: false,
            status_message: None,
            status_time: None,
        }
    }

    /// Set a status message that will be displayed temporarily
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_time = Some(Instant::now());
    }

    /// Clear expired status message
    pub fn clear_expired_status(&mut self) {
        if let Some(time) = self.status_time {
            if time.elapsed() > Duration::from_secs(3) {
                self.status_message = None;
                self.status_time = None;
            }
        }
    }

    /// Fold the core's signals into the display
    pub fn apply_signals(&mut self, signals: &[PlaybackSignal]) {
        for signal in signals {
            match signal {
                PlaybackSignal::NoteOn(pitch) => {
                    self.lit.insert(*pitch);
                }
                PlaybackSignal::NoteOff(pitch) => {
                    self.lit.remove(pitch);
                }
                PlaybackSignal::Correct(pitch) => {
                    self.set_status(format!("✓ {}", note_name(*pitch)));
                }
                PlaybackSignal::Incorrect(pitch) => {
                    self.set_status(format!("✗ {} is not in this chord", note_name(*pitch)));
                }
                PlaybackSignal::GateOpened { pitches, .. } => {
                    let names: Vec<String> = pitches.iter().map(|p| note_name(*p)).collect();
                    self.set_status(format!("Waiting for {}", names.join(" ")));
                }
                PlaybackSignal::GateCleared { skipped: true, .. } => {
                    self.set_status("Skipped");
                }
                PlaybackSignal::GateCleared { skipped: false, .. } => {}
                PlaybackSignal::Finished => {
                    self.set_status("Finished. Home to play again, Esc to stop");
                }
            }
        }
    }

    /// Mark a computer key held until `release_at`
    pub fn hold_until(&mut self, pitch: Pitch, release_at: WallTime) {
        self.held.insert(pitch);
        self.key_release_at.insert(pitch, release_at);
    }

    /// Release computer keys whose hold ran out, returning their pitches
    pub fn expire_held(&mut self, now: WallTime) -> Vec<Pitch> {
        let expired: Vec<Pitch> = self
            .key_release_at
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(pitch, _)| *pitch)
            .collect();
        for pitch in &expired {
            self.key_release_at.remove(pitch);
            self.held.remove(pitch);
        }
        expired
    }
}

/// Pitches to draw: the song's range and the computer piano's, starting
/// on a C and cut to fit `width` columns of two cells per key.
pub fn display_range(song: Option<(Pitch, Pitch)>, piano: &PianoKeys, width: u16) -> (Pitch, Pitch) {
    let base = piano.base_pitch();
    let (mut low, mut high) = (base, base.saturating_add(PIANO_SPAN));
    if let Some((song_low, song_high)) = song {
        low = low.min(song_low);
        high = high.max(song_high);
    }
    low -= low % 12;

    let max_keys = (width / 2).clamp(1, 128) as u8;
    if high - low + 1 > max_keys {
        high = low + max_keys - 1;
    }
    (low, high)
}

/// Terminal UI application
pub struct App {
    state: UiState,
    /// Terminal handle
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Target frame rate
    frame_rate: u32,
    /// Whether to continue running
    running: bool,
}

impl App {
    /// Take over the terminal
    pub fn new(state: UiState) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            state,
            terminal,
            frame_rate: 60,
            running: true,
        })
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Set frame rate
    pub fn set_frame_rate(&mut self, fps: u32) {
        self.frame_rate = fps.clamp(1, 120);
    }

    /// Check if running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop the app
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Run frames until the player quits
    pub fn run<C: Clock>(&mut self, session: &mut Session<C>) -> Result<()> {
        info!(song = %session.song_name, "player started");

        while self.running {
            let event = self.poll_event()?;
            let now = session.clock.now();

            if let Some(Event::Key(key)) = event {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(session, key.code, key.modifiers, now);
                }
            }

            self.frame(session, now);
            self.draw(session)?;
        }

        info!("player closed");
        Ok(())
    }

    /// One frame of input, playback and bookkeeping at wall time `now`
    fn frame<C: Clock>(&mut self, session: &mut Session<C>, now: WallTime) {
        for pitch in self.state.expire_held(now) {
            session.core.on_key_release(pitch);
        }

        if let Some(midi) = &session.midi {
            for event in midi.key_events() {
                match event {
                    KeyEvent::Press(pitch) => {
                        self.state.held.insert(pitch);
                        session.core.on_key_press(pitch, now);
                    }
                    KeyEvent::Release(pitch) => {
                        self.state.held.remove(&pitch);
                        session.core.on_key_release(pitch);
                    }
                }
            }
        }

        if let Some(watcher) = &session.watcher {
            for event in watcher.recv_all() {
                match event {
                    SongEvent::Reloaded(song) => {
                        session.song_name = song.song.name.clone();
                        self.state.song_name = song.song.name.clone();
                        self.state.lit.clear();
                        self.state.set_status(format!("Reloaded {}", song.song.name));
                    }
                    SongEvent::Error(message) => {
                        warn!(%message, "song not reloaded");
                        self.state.set_status(message);
                    }
                }
            }
        }

        session.core.advance(now);
        let signals = session.core.drain_signals();
        self.state.apply_signals(&signals);
        self.state.snapshot = session.core.snapshot();
        self.state.clear_expired_status();
    }

    /// Handle a key event
    fn handle_key<C: Clock>(
        &mut self,
        session: &mut Session<C>,
        code: KeyCode,
        modifiers: KeyModifiers,
        now: WallTime,
    ) {
        let prompting = session.core.pending_switch().is_some();
        match session.keyboard.process_key(code, modifiers, prompting) {
            Some(KeyInput::Note(pitch)) => {
                self.state.hold_until(pitch, now + COMPUTER_KEY_HOLD);
                session.core.on_key_press(pitch, now);
            }
            Some(KeyInput::Action(action)) => {
                if action.apply(&mut session.core, now) {
                    if let ControlAction::ResolveModeSwitch(resolution) = action {
                        self.state
                            .set_status(format!("Mode switch: {}", resolution.label()));
                    }
                    return;
                }
                match action {
                    ControlAction::Quit => self.quit(),
                    ControlAction::ToggleHelp => self.state.show_help = !self.state.show_help,
                    ControlAction::OctaveUp | ControlAction::OctaveDown => {
                        let base = session.keyboard.piano().base_pitch();
                        self.state
                            .set_status(format!("Keyboard starts at {}", note_name(base)));
                    }
                    _ => {}
                }
            }
            None => {}
        }
    }

    /// Poll for events with timeout
    pub fn poll_event(&self) -> io::Result<Option<Event>> {
        let timeout = Duration::from_millis(1000 / self.frame_rate as u64);
        if event::poll(timeout)? {
            Ok(Some(event::read()?))
        } else {
            Ok(None)
        }
    }

    /// Draw the UI
    pub fn draw<C: Clock>(&mut self, session: &Session<C>) -> io::Result<()> {
        let state = &self.state;
        let timeline = session.core.timeline();
        let keyboard = &session.keyboard;
        let lookahead = session.lookahead;

        self.terminal.draw(|frame| {
            let area = frame.area();

            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(4), // Transport
                    Constraint::Min(6),    // Piano roll
                    Constraint::Length(6), // Keyboard
                    Constraint::Length(1), // Status bar
                ])
                .split(area);

            frame.render_widget(
                TransportWidget::new(&state.snapshot, &state.song_name)
                    .block(Block::default().borders(Borders::ALL).title(" Transport ")),
                chunks[0],
            );

            let range = display_range(
                timeline.pitch_range(),
                keyboard.piano(),
                chunks[1].width.saturating_sub(2),
            );
            render_roll(frame, chunks[1], timeline, state, range, lookahead);
            render_keys(frame, chunks[2], state, keyboard.piano(), range);
            render_status_bar(frame, chunks[3], state, session.midi.as_ref());

            if state.snapshot.pending_mode.is_some() {
                render_switch_prompt(frame, area, state, keyboard);
            } else if state.show_help {
                render_help_overlay(frame, area, keyboard);
            }
        })?;

        Ok(())
    }

    /// Cleanup terminal on drop
    fn cleanup(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Render the piano roll
fn render_roll(
    frame: &mut Frame,
    area: Rect,
    timeline: &Timeline,
    state: &UiState,
    (low, high): (Pitch, Pitch),
    lookahead: f64,
) {
    let view = RollView {
        song_time: state.snapshot.song_time,
        lookahead,
        low,
        high,
        gate_time: state.snapshot.gate_time,
    };
    frame.render_widget(
        RollWidget::new(timeline, view).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

/// Render the keyboard strip
fn render_keys(
    frame: &mut Frame,
    area: Rect,
    state: &UiState,
    piano: &PianoKeys,
    (low, high): (Pitch, Pitch),
) {
    let keys = key_states(low, high, &state.snapshot, &state.lit, &state.held);
    frame.render_widget(
        KeysWidget::new(&keys, piano).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

/// Render status bar
fn render_status_bar(frame: &mut Frame, area: Rect, state: &UiState, midi: Option<&MidiKeyboard>) {
    let text = if let Some(ref msg) = state.status_message {
        Span::styled(format!(" {}", msg), Style::default().fg(Color::Yellow))
    } else {
        let midi = midi
            .map(|m| format!(" | MIDI: {}", m.port_name()))
            .unwrap_or_default();
        Span::styled(
            format!(
                " Space: Play/Pause | Tab: Skip | m: Mode | ?: Help | q: Quit{}",
                midi
            ),
            Style::default().fg(Color::DarkGray),
        )
    };

    frame.render_widget(Paragraph::new(text), area);
}

/// Centered rectangle of at most `width` by `height`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// Render the mode-switch confirmation
fn render_switch_prompt(frame: &mut Frame, area: Rect, state: &UiState, keyboard: &KeyboardController) {
    let Some(target) = state.snapshot.pending_mode else {
        return;
    };

    let mut answers: Vec<_> = keyboard.prompt_bindings().collect();
    answers.sort_by_key(|b| format_shortcut(&b.shortcut));

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Switch to {} mode?", target.label()),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(answers.iter().map(|b| {
        Line::from(format!("  {:<6} {}", format_shortcut(&b.shortcut), b.description))
    }));

    let prompt_area = centered(area, 40, lines.len() as u16 + 2);
    frame.render_widget(Clear, prompt_area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Mode ")
                .style(Style::default().bg(Color::Black)),
        ),
        prompt_area,
    );
}

/// Help sections in display order
const HELP_CATEGORIES: [&str; 6] = [
    "Transport",
    "Tempo",
    "Learning",
    "Keyboard",
    "Mode switch",
    "General",
];

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, area: Rect, keyboard: &KeyboardController) {
    let grouped = keyboard.bindings_by_category();

    let mut lines = Vec::new();
    for category in HELP_CATEGORIES {
        let Some(bindings) = grouped.get(category) else {
            continue;
        };
        let mut bindings = bindings.clone();
        bindings.sort_by_key(|b| format_shortcut(&b.shortcut));

        lines.push(Line::from(Span::styled(
            category,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for binding in bindings {
            lines.push(Line::from(format!(
                "  {:<10} {}",
                format_shortcut(&binding.shortcut),
                binding.description
            )));
        }
    }
    lines.push(Line::from(Span::styled(
        "Piano",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from("  A S D F G H J K L ;   white keys"));
    lines.push(Line::from("   W E   T Y U   O P    black keys"));

    let help_area = centered(area, 50, lines.len() as u16 + 2);
    frame.render_widget(Clear, help_area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .style(Style::default().bg(Color::Black)),
        ),
        help_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlaybackMode;

    fn state() -> UiState {
        let core = PlaybackCore::new(Timeline::demo(), PlaybackMode::Presentation);
        UiState::new(core.snapshot(), "Demo")
    }

    #[test]
    fn test_ui_state_status() {
        let mut state = state();
        assert!(state.status_message.is_none());

        state.set_status("Test message");
        assert_eq!(state.status_message, Some("Test message".to_string()));
    }

    #[test]
    fn test_signals_light_keys() {
        let mut state = state();
        state.apply_signals(&[PlaybackSignal::NoteOn(60), PlaybackSignal::NoteOn(64)]);
        assert_eq!(state.lit, BTreeSet::from([60, 64]));

        state.apply_signals(&[PlaybackSignal::NoteOff(60)]);
        assert_eq!(state.lit, BTreeSet::from([64]));
    }

    #[test]
    fn test_signals_set_status() {
        let mut state = state();
        state.apply_signals(&[PlaybackSignal::GateOpened {
            gate_time: 0.0,
            pitches: vec![60, 64],
        }]);
        assert_eq!(state.status_message.as_deref(), Some("Waiting for C4 E4"));

        state.apply_signals(&[PlaybackSignal::Incorrect(62)]);
        assert!(state.status_message.as_deref().unwrap().contains("D4"));

        state.apply_signals(&[PlaybackSignal::GateCleared {
            gate_time: 0.0,
            skipped: true,
        }]);
        assert_eq!(state.status_message.as_deref(), Some("Skipped"));
    }

    #[test]
    fn test_computer_keys_expire() {
        let mut state = state();
        state.hold_until(60, 1.0);
        state.hold_until(62, 2.0);

        assert!(state.expire_held(0.5).is_empty());
        assert_eq!(state.expire_held(1.0), vec![60]);
        assert_eq!(state.held, BTreeSet::from([62]));
        assert_eq!(state.expire_held(5.0), vec![62]);
        assert!(state.held.is_empty());
    }

    #[test]
    fn test_display_range() {
        let piano = PianoKeys::new(60);

        // Song inside the piano's range: start on C4, cover the piano
        assert_eq!(display_range(Some((62, 70)), &piano, 200), (60, 77));

        // Demo reaches down to G2
        assert_eq!(display_range(Some((43, 67)), &piano, 200), (36, 77));

        // Narrow terminals cut the top
        assert_eq!(display_range(Some((43, 67)), &piano, 20), (36, 45));

        assert_eq!(display_range(None, &piano, 0), (60, 60));
    }

    #[test]
    fn test_centered() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered(area, 50, 10);
        assert_eq!(rect, Rect::new(25, 15, 50, 10));
    }
}
