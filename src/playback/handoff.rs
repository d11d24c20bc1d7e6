// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timeline hand-off from background producers.
//!
//! Importers and the song watcher run on their own threads and must not
//! touch the playback core. They send finished timelines through this
//! channel; the core picks up the newest one at the start of its next
//! tick and drops anything it superseded.

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::debug;

use crate::timeline::Timeline;

/// Producer side, cloneable across threads
#[derive(Debug, Clone)]
pub struct TimelineSender {
    tx: Sender<Timeline>,
}

impl TimelineSender {
    /// Queue a timeline for the core.
    ///
    /// Returns false if the core side has been dropped.
    pub fn send(&self, timeline: Timeline) -> bool {
        self.tx.send(timeline).is_ok()
    }
}

/// Consumer side, owned by the playback core
#[derive(Debug)]
pub struct TimelineHandoff {
    rx: Receiver<Timeline>,
}

impl TimelineHandoff {
    /// Create a connected sender/handoff pair
    pub fn channel() -> (TimelineSender, TimelineHandoff) {
        let (tx, rx) = mpsc::channel();
        (TimelineSender { tx }, TimelineHandoff { rx })
    }

    /// Take the most recently sent timeline, discarding older ones
    pub fn latest(&self) -> Option<Timeline> {
        let mut latest = None;
        while let Ok(timeline) = self.rx.try_recv() {
            if latest.is_some() {
                debug!("discarding superseded timeline");
            }
            latest = Some(timeline);
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Note;
    use std::thread;

    #[test]
    fn test_empty_handoff() {
        let (_tx, handoff) = TimelineHandoff::channel();
        assert!(handoff.latest().is_none());
    }

    #[test]
    fn test_latest_wins() {
        let (tx, handoff) = TimelineHandoff::channel();
        assert!(tx.send(Timeline::from_notes(vec![Note::new(60, 0.0, 1.0)])));
        assert!(tx.send(Timeline::from_notes(vec![Note::new(72, 0.0, 1.0)])));

        let latest = handoff.latest().unwrap();
        assert_eq!(latest.notes()[0].pitch(), 72);
        assert!(handoff.latest().is_none());
    }

    #[test]
    fn test_send_from_thread() {
        let (tx, handoff) = TimelineHandoff::channel();
        let worker = thread::spawn(move || tx.send(Timeline::demo()));
        assert!(worker.join().unwrap());

        assert_eq!(handoff.latest().unwrap(), Timeline::demo());
    }

    #[test]
    fn test_send_after_consumer_dropped() {
        let (tx, handoff) = TimelineHandoff::channel();
        drop(handoff);
        assert!(!tx.send(Timeline::new()));
    }
}
