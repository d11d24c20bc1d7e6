// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! External MIDI keyboard input through midir.
//!
//! The midir callback runs on a driver thread; parsed messages cross to
//! the UI thread over a channel and are drained once per frame.

use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::{anyhow, Result};
use midir::{Ignore, MidiInput, MidiInputConnection};
use tracing::{info, trace};

use super::{KeyEvent, MidiMessage};

const CLIENT_NAME: &str = "pianola";

/// Connection to an external MIDI keyboard
pub struct MidiKeyboard {
    _connection: MidiInputConnection<()>,
    receiver: Receiver<MidiMessage>,
    port_name: String,
}

impl MidiKeyboard {
    /// Connect to the input port at `source_index`
    pub fn connect(source_index: usize) -> Result<Self> {
        let mut input = MidiInput::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;
        input.ignore(Ignore::All);

        let ports = input.ports();
        let port = ports
            .get(source_index)
            .ok_or_else(|| anyhow!("MIDI source {} not found", source_index))?;
        let port_name = input
            .port_name(port)
            .unwrap_or_else(|_| format!("Unknown {}", source_index));

        let (tx, rx): (Sender<MidiMessage>, Receiver<MidiMessage>) = mpsc::channel();

        let connection = input
            .connect(
                port,
                "pianola-in",
                move |_stamp, data, _| {
                    if let Some(msg) = MidiMessage::parse(data) {
                        let _ = tx.send(msg);
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("Failed to connect to source: {}", e))?;

        info!(port = %port_name, "MIDI keyboard connected");

        Ok(Self {
            _connection: connection,
            receiver: rx,
            port_name,
        })
    }

    /// Try to receive the next MIDI message (non-blocking)
    pub fn try_recv(&self) -> Option<MidiMessage> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending MIDI messages
    pub fn recv_all(&self) -> Vec<MidiMessage> {
        let mut messages = Vec::new();
        while let Some(msg) = self.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Drain pending messages down to key presses and releases
    pub fn key_events(&self) -> Vec<KeyEvent> {
        self.recv_all()
            .into_iter()
            .filter_map(|msg| {
                if !msg.is_realtime() {
                    trace!(?msg, "MIDI in");
                }
                msg.key_event()
            })
            .collect()
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// List all available MIDI sources
pub fn list_sources() -> Result<Vec<(usize, String)>> {
    let input = MidiInput::new(CLIENT_NAME)
        .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;

    Ok(input
        .ports()
        .iter()
        .enumerate()
        .map(|(i, port)| {
            let name = input
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown {}", i));
            (i, name)
        })
        .collect())
}

/// Print all available MIDI sources to stdout
pub fn print_sources() -> Result<()> {
    let sources = list_sources()?;
    if sources.is_empty() {
        println!("No MIDI sources found.");
    } else {
        println!("Available MIDI sources (inputs):");
        for (i, name) in sources {
            println!("  {}: {}", i, name);
        }
    }
    Ok(())
}
