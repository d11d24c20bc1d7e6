// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyboard shortcut handling.
//!
//! Maps terminal key events to transport actions, mode-switch answers,
//! and the pitches of a computer-keyboard piano laid out like a tracker:
//! the home row holds the white keys and the row above the black keys.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyModifiers};

use super::ControlAction;
use crate::playback::SwitchResolution;
use crate::timeline::{Pitch, MAX_PITCH};

/// A keyboard shortcut definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    /// Key code
    pub code: KeyCode,
    /// Required modifiers
    pub modifiers: KeyModifiers,
}

impl Shortcut {
    /// Create a new shortcut
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a shortcut with no modifiers
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Create a shortcut with Ctrl modifier
    pub fn ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CONTROL)
    }

    /// Shortcut for a key event.
    ///
    /// Shift is dropped for character keys since the character already
    /// carries it (`?` arrives as Shift+`?` on most terminals).
    pub fn from_event(code: KeyCode, modifiers: KeyModifiers) -> Self {
        match code {
            KeyCode::Char(_) => Self::new(code, modifiers - KeyModifiers::SHIFT),
            _ => Self::new(code, modifiers),
        }
    }

    /// Check if this shortcut matches a key event
    pub fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        *self == Self::from_event(code, modifiers)
    }
}

/// A keyboard binding (shortcut to action)
#[derive(Debug, Clone)]
pub struct KeyBinding {
    /// The shortcut
    pub shortcut: Shortcut,
    /// The action to perform
    pub action: ControlAction,
    /// Description for help display
    pub description: String,
    /// Category for grouping in help
    pub category: String,
}

impl KeyBinding {
    /// Create a new key binding
    pub fn new(shortcut: Shortcut, action: ControlAction, description: impl Into<String>) -> Self {
        Self {
            shortcut,
            action,
            description: description.into(),
            category: "General".to_string(),
        }
    }

    /// Set the category
    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }
}

/// Piano keys on the computer keyboard, as semitone offsets from the
/// lowest key.
const PIANO_LAYOUT: [(char, u8); 18] = [
    ('a', 0),
    ('w', 1),
    ('s', 2),
    ('e', 3),
    ('d', 4),
    ('f', 5),
    ('t', 6),
    ('g', 7),
    ('y', 8),
    ('h', 9),
    ('u', 10),
    ('j', 11),
    ('k', 12),
    ('o', 13),
    ('l', 14),
    ('p', 15),
    (';', 16),
    ('\'', 17),
];

/// Highest semitone offset in the layout
const PIANO_SPAN: u8 = 17;

/// Computer-keyboard piano with a movable octave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PianoKeys {
    base_pitch: Pitch,
}

impl PianoKeys {
    /// Create a piano whose `a` key plays `base_pitch`
    pub fn new(base_pitch: Pitch) -> Self {
        Self {
            base_pitch: base_pitch.min(MAX_PITCH - PIANO_SPAN),
        }
    }

    pub fn base_pitch(&self) -> Pitch {
        self.base_pitch
    }

    /// Pitch played by a character key
    pub fn pitch_for(&self, key: char) -> Option<Pitch> {
        let key = key.to_ascii_lowercase();
        PIANO_LAYOUT
            .iter()
            .find(|(c, _)| *c == key)
            .map(|(_, offset)| self.base_pitch + offset)
    }

    /// Character key that plays a pitch, if it is in range
    pub fn key_for(&self, pitch: Pitch) -> Option<char> {
        let offset = pitch.checked_sub(self.base_pitch)?;
        PIANO_LAYOUT
            .iter()
            .find(|(_, o)| *o == offset)
            .map(|(c, _)| *c)
    }

    /// Move up one octave. Returns false at the top of the MIDI range.
    pub fn octave_up(&mut self) -> bool {
        if self.base_pitch + 12 + PIANO_SPAN > MAX_PITCH {
            return false;
        }
        self.base_pitch += 12;
        true
    }

    /// Move down one octave. Returns false at the bottom of the MIDI range.
    pub fn octave_down(&mut self) -> bool {
        match self.base_pitch.checked_sub(12) {
            Some(base) => {
                self.base_pitch = base;
                true
            }
            None => false,
        }
    }
}

impl Default for PianoKeys {
    fn default() -> Self {
        Self::new(60)
    }
}

/// Result of processing one key event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyInput {
    /// A bound shortcut
    Action(ControlAction),
    /// A piano key
    Note(Pitch),
}

/// Keyboard controller with configurable bindings
pub struct KeyboardController {
    bindings: HashMap<Shortcut, KeyBinding>,
    /// Answers to a pending mode switch; these shadow `bindings`
    prompt_bindings: HashMap<Shortcut, KeyBinding>,
    piano: PianoKeys,
}

impl KeyboardController {
    /// Create an empty keyboard controller
    pub fn new(piano: PianoKeys) -> Self {
        Self {
            bindings: HashMap::new(),
            prompt_bindings: HashMap::new(),
            piano,
        }
    }

    /// Create a keyboard controller with default bindings
    pub fn with_defaults() -> Self {
        Self::with_steps(PianoKeys::default(), 0.1, 5.0)
    }

    /// Default bindings with the given tempo and seek increments
    pub fn with_steps(piano: PianoKeys, tempo_step: f64, seek_step: f64) -> Self {
        let mut controller = Self::new(piano);
        controller.add_default_bindings(tempo_step, seek_step);
        controller
    }

    fn add_default_bindings(&mut self, tempo_step: f64, seek_step: f64) {
        // Transport
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Char(' ')),
                ControlAction::TogglePlay,
                "Play/Pause",
            )
            .category("Transport"),
        );
        self.add(
            KeyBinding::new(Shortcut::key(KeyCode::Esc), ControlAction::Stop, "Stop")
                .category("Transport"),
        );
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Left),
                ControlAction::SeekBy(-seek_step),
                "Seek back",
            )
            .category("Transport"),
        );
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Right),
                ControlAction::SeekBy(seek_step),
                "Seek forward",
            )
            .category("Transport"),
        );
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Home),
                ControlAction::SeekTo(0.0),
                "Back to start",
            )
            .category("Transport"),
        );

        // Tempo
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Up),
                ControlAction::AdjustTempo(tempo_step),
                "Tempo up",
            )
            .category("Tempo"),
        );
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Down),
                ControlAction::AdjustTempo(-tempo_step),
                "Tempo down",
            )
            .category("Tempo"),
        );
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Char('=')),
                ControlAction::SetTempo(1.0),
                "Normal tempo",
            )
            .category("Tempo"),
        );

        // Learning
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Tab),
                ControlAction::Skip,
                "Skip waiting notes",
            )
            .category("Learning"),
        );
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Char('m')),
                ControlAction::ProposeModeSwitch,
                "Switch mode",
            )
            .category("Learning"),
        );

        // Keyboard
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Char('z')),
                ControlAction::OctaveDown,
                "Octave down",
            )
            .category("Keyboard"),
        );
        self.add(
            KeyBinding::new(
                Shortcut::key(KeyCode::Char('x')),
                ControlAction::OctaveUp,
                "Octave up",
            )
            .category("Keyboard"),
        );

        // General
        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char('?')),
            ControlAction::ToggleHelp,
            "Help",
        ));
        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char('q')),
            ControlAction::Quit,
            "Quit",
        ));
        self.add(KeyBinding::new(
            Shortcut::ctrl(KeyCode::Char('c')),
            ControlAction::Quit,
            "Quit",
        ));

        // Mode switch prompt
        for (key, resolution, description) in [
            ('r', SwitchResolution::Reset, "Switch and restart"),
            ('c', SwitchResolution::Continue, "Switch and keep position"),
        ] {
            self.add_prompt(
                KeyBinding::new(
                    Shortcut::key(KeyCode::Char(key)),
                    ControlAction::ResolveModeSwitch(resolution),
                    description,
                )
                .category("Mode switch"),
            );
        }
        self.add_prompt(
            KeyBinding::new(
                Shortcut::key(KeyCode::Esc),
                ControlAction::ResolveModeSwitch(SwitchResolution::Cancel),
                "Keep current mode",
            )
            .category("Mode switch"),
        );
    }

    /// Add a key binding
    pub fn add(&mut self, binding: KeyBinding) {
        self.bindings.insert(binding.shortcut.clone(), binding);
    }

    /// Add a binding that is only active while a mode switch is pending
    pub fn add_prompt(&mut self, binding: KeyBinding) {
        self.prompt_bindings.insert(binding.shortcut.clone(), binding);
    }

    /// Remove a key binding
    pub fn remove(&mut self, shortcut: &Shortcut) -> Option<KeyBinding> {
        self.bindings.remove(shortcut)
    }

    /// Get action for a key event
    pub fn get_action(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<&ControlAction> {
        self.bindings
            .get(&Shortcut::from_event(code, modifiers))
            .map(|b| &b.action)
    }

    /// Process a key event.
    ///
    /// With `prompting` set, mode-switch answers take precedence. Octave
    /// actions are applied to the piano here and still reported.
    pub fn process_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        prompting: bool,
    ) -> Option<KeyInput> {
        let shortcut = Shortcut::from_event(code, modifiers);

        let binding = prompting
            .then(|| self.prompt_bindings.get(&shortcut))
            .flatten()
            .or_else(|| self.bindings.get(&shortcut));

        if let Some(binding) = binding {
            let action = binding.action;
            match action {
                ControlAction::OctaveUp => {
                    self.piano.octave_up();
                }
                ControlAction::OctaveDown => {
                    self.piano.octave_down();
                }
                _ => {}
            }
            return Some(KeyInput::Action(action));
        }

        match shortcut.code {
            KeyCode::Char(c) if shortcut.modifiers.is_empty() => {
                self.piano.pitch_for(c).map(KeyInput::Note)
            }
            _ => None,
        }
    }

    pub fn piano(&self) -> &PianoKeys {
        &self.piano
    }

    /// Get all bindings for help display
    pub fn bindings(&self) -> impl Iterator<Item = &KeyBinding> {
        self.bindings.values()
    }

    /// Get bindings grouped by category, prompt answers included
    pub fn bindings_by_category(&self) -> HashMap<String, Vec<&KeyBinding>> {
        let mut grouped: HashMap<String, Vec<&KeyBinding>> = HashMap::new();
        for binding in self.bindings.values().chain(self.prompt_bindings.values()) {
            grouped
                .entry(binding.category.clone())
                .or_default()
                .push(binding);
        }
        grouped
    }

    /// Bindings that answer a pending mode switch
    pub fn prompt_bindings(&self) -> impl Iterator<Item = &KeyBinding> {
        self.prompt_bindings.values()
    }
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Format a shortcut for display
pub fn format_shortcut(shortcut: &Shortcut) -> String {
    let mut parts = Vec::new();

    if shortcut.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("Ctrl".to_string());
    }
    if shortcut.modifiers.contains(KeyModifiers::ALT) {
        parts.push("Alt".to_string());
    }

    let key = match shortcut.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        _ => "?".to_string(),
    };
    parts.push(key);

    parts.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_matches() {
        let s = Shortcut::ctrl(KeyCode::Char('c'));
        assert!(s.matches(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!s.matches(KeyCode::Char('c'), KeyModifiers::NONE));
        assert!(!s.matches(KeyCode::Char('x'), KeyModifiers::CONTROL));

        // Shift is ignored on characters
        let s = Shortcut::key(KeyCode::Char('?'));
        assert!(s.matches(KeyCode::Char('?'), KeyModifiers::SHIFT));
    }

    #[test]
    fn test_keyboard_controller_defaults() {
        let controller = KeyboardController::with_defaults();

        let action = controller.get_action(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::TogglePlay));

        let action = controller.get_action(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::Stop));

        let action = controller.get_action(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::AdjustTempo(0.1)));

        let action = controller.get_action(KeyCode::Left, KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::SeekBy(-5.0)));
    }

    #[test]
    fn test_custom_steps() {
        let controller = KeyboardController::with_steps(PianoKeys::default(), 0.25, 2.0);
        let action = controller.get_action(KeyCode::Down, KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::AdjustTempo(-0.25)));
        let action = controller.get_action(KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::SeekBy(2.0)));
    }

    #[test]
    fn test_piano_keys() {
        let mut controller = KeyboardController::with_defaults();

        let input = controller.process_key(KeyCode::Char('a'), KeyModifiers::NONE, false);
        assert_eq!(input, Some(KeyInput::Note(60)));
        let input = controller.process_key(KeyCode::Char('w'), KeyModifiers::NONE, false);
        assert_eq!(input, Some(KeyInput::Note(61)));
        let input = controller.process_key(KeyCode::Char(';'), KeyModifiers::NONE, false);
        assert_eq!(input, Some(KeyInput::Note(76)));

        // Caps lock still plays
        let input = controller.process_key(KeyCode::Char('K'), KeyModifiers::SHIFT, false);
        assert_eq!(input, Some(KeyInput::Note(72)));

        let input = controller.process_key(KeyCode::Char('b'), KeyModifiers::NONE, false);
        assert_eq!(input, None);
    }

    #[test]
    fn test_octave_shift() {
        let mut controller = KeyboardController::with_defaults();

        let input = controller.process_key(KeyCode::Char('x'), KeyModifiers::NONE, false);
        assert_eq!(input, Some(KeyInput::Action(ControlAction::OctaveUp)));
        assert_eq!(controller.piano().base_pitch(), 72);

        controller.process_key(KeyCode::Char('z'), KeyModifiers::NONE, false);
        controller.process_key(KeyCode::Char('z'), KeyModifiers::NONE, false);
        let input = controller.process_key(KeyCode::Char('a'), KeyModifiers::NONE, false);
        assert_eq!(input, Some(KeyInput::Note(48)));
    }

    #[test]
    fn test_octave_limits() {
        let mut piano = PianoKeys::new(0);
        assert!(!piano.octave_down());
        assert_eq!(piano.base_pitch(), 0);

        let mut piano = PianoKeys::new(127);
        assert_eq!(piano.base_pitch(), 110);
        assert!(!piano.octave_up());
        assert_eq!(piano.pitch_for('\''), Some(127));

        let mut piano = PianoKeys::new(96);
        assert!(piano.octave_up());
        assert_eq!(piano.base_pitch(), 108);
    }

    #[test]
    fn test_key_for_pitch() {
        let piano = PianoKeys::new(60);
        assert_eq!(piano.key_for(60), Some('a'));
        assert_eq!(piano.key_for(61), Some('w'));
        assert_eq!(piano.key_for(59), None);
        assert_eq!(piano.key_for(90), None);
    }

    #[test]
    fn test_prompt_bindings_take_precedence() {
        let mut controller = KeyboardController::with_defaults();

        let input = controller.process_key(KeyCode::Esc, KeyModifiers::NONE, true);
        assert_eq!(
            input,
            Some(KeyInput::Action(ControlAction::ResolveModeSwitch(
                SwitchResolution::Cancel
            )))
        );

        let input = controller.process_key(KeyCode::Char('c'), KeyModifiers::NONE, true);
        assert_eq!(
            input,
            Some(KeyInput::Action(ControlAction::ResolveModeSwitch(
                SwitchResolution::Continue
            )))
        );

        // Outside the prompt the same keys mean something else
        let input = controller.process_key(KeyCode::Esc, KeyModifiers::NONE, false);
        assert_eq!(input, Some(KeyInput::Action(ControlAction::Stop)));
        let input = controller.process_key(KeyCode::Char('r'), KeyModifiers::NONE, false);
        assert_eq!(input, None);
    }

    #[test]
    fn test_add_remove_binding() {
        let mut controller = KeyboardController::new(PianoKeys::default());

        controller.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char('b')),
            ControlAction::Stop,
            "Custom Stop",
        ));
        assert!(controller
            .get_action(KeyCode::Char('b'), KeyModifiers::NONE)
            .is_some());

        controller.remove(&Shortcut::key(KeyCode::Char('b')));
        assert!(controller
            .get_action(KeyCode::Char('b'), KeyModifiers::NONE)
            .is_none());
    }

    #[test]
    fn test_bindings_by_category() {
        let controller = KeyboardController::with_defaults();
        let grouped = controller.bindings_by_category();
        assert_eq!(grouped["Tempo"].len(), 3);
        assert_eq!(grouped["Mode switch"].len(), 3);
        assert!(grouped.contains_key("Transport"));
    }

    #[test]
    fn test_format_shortcut() {
        assert_eq!(format_shortcut(&Shortcut::key(KeyCode::Char(' '))), "Space");
        assert_eq!(format_shortcut(&Shortcut::ctrl(KeyCode::Char('c'))), "Ctrl+C");
        assert_eq!(format_shortcut(&Shortcut::key(KeyCode::Up)), "↑");
    }
}
