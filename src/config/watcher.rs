// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File watcher for hot-reloading the song being practised.
//!
//! The watcher runs on its own thread. Successfully parsed songs are
//! reported as events and, if a [`TimelineSender`] is attached, handed
//! to the playback core as a fresh timeline. Broken edits never reach
//! the core.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::SongFile;
use crate::playback::TimelineSender;

/// Events emitted by the song watcher
#[derive(Debug, Clone)]
pub enum SongEvent {
    /// Song file was modified and successfully reloaded
    Reloaded(Box<SongFile>),
    /// Song file was modified but failed to load
    Error(String),
}

/// Song file watcher with debouncing and validation
pub struct SongWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<SongEvent>,
    watched_path: PathBuf,
}

impl SongWatcher {
    /// Watch a song file
    ///
    /// The parent directory is watched so that editors that save by
    /// replacing the file are still noticed.
    ///
    /// # Arguments
    /// * `path` - Song file to watch
    /// * `debounce_ms` - Debounce duration in milliseconds (default: 300)
    /// * `timelines` - Where to send reloaded timelines, if anywhere
    pub fn new<P: AsRef<Path>>(
        path: P,
        debounce_ms: Option<u64>,
        timelines: Option<TimelineSender>,
    ) -> Result<Self> {
        let watched_path = path.as_ref().to_path_buf();
        let file_name: OsString = watched_path
            .file_name()
            .ok_or_else(|| anyhow!("Not a file path: {:?}", watched_path))?
            .to_os_string();
        let directory = match watched_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let debounce_duration = Duration::from_millis(debounce_ms.unwrap_or(300));

        let (event_tx, event_rx): (Sender<SongEvent>, Receiver<SongEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", directory, e))?;

        let song_path = watched_path.clone();
        std::thread::spawn(move || {
            let mut last_event_time: Option<Instant> = None;

            loop {
                match notify_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(event) => {
                        let relevant = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
                            && event
                                .paths
                                .iter()
                                .any(|p| p.file_name() == Some(file_name.as_os_str()));
                        if relevant {
                            last_event_time = Some(Instant::now());
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let Some(last_time) = last_event_time else {
                            continue;
                        };
                        if last_time.elapsed() < debounce_duration {
                            continue;
                        }
                        last_event_time = None;

                        let event = reload(&song_path, timelines.as_ref());
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        // Watcher was dropped, exit thread
                        break;
                    }
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            event_receiver: event_rx,
            watched_path,
        })
    }

    /// Try to receive the next song event (non-blocking)
    pub fn try_recv(&self) -> Option<SongEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Receive all pending song events
    pub fn recv_all(&self) -> Vec<SongEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Get the path being watched
    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}

/// Load, validate, and forward a changed song
fn reload(path: &Path, timelines: Option<&TimelineSender>) -> SongEvent {
    let song = match validate_song(path) {
        Ok(song) => song,
        Err(e) => {
            warn!(path = ?path, error = %e, "song reload failed");
            return SongEvent::Error(format!("Failed to load {:?}: {:#}", path, e));
        }
    };

    if let Some(sender) = timelines {
        // validate_song already proved the timeline builds
        if let Ok(timeline) = song.to_timeline() {
            if !sender.send(timeline) {
                debug!("playback core gone, reload not delivered");
            }
        }
    }

    debug!(name = %song.song.name, "song reloaded");
    SongEvent::Reloaded(Box::new(song))
}

/// Load a song and check it is playable, without applying it
pub fn validate_song<P: AsRef<Path>>(path: P) -> Result<SongFile> {
    let song = SongFile::load(path)?;
    song.validate()?;
    Ok(song)
}
