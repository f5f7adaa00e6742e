//! Collaborator interfaces the engine reports through.
//!
//! The engine never touches UI state. Every visible effect goes through a
//! [`Reporter`]; hosts that run the engine on a worker thread use
//! [`ChannelReporter`] and apply the resulting [`Event`]s on the thread that
//! owns the UI.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

/// Sink for progress, status and notifications.
pub trait Reporter {
    /// Percent complete of the current phase, `0.0..=100.0`.
    fn progress(&self, percent: f64);

    /// Coarse phase transition ("reading", "substituting", ...).
    fn status(&self, text: &str);

    /// Informational message for the user; nothing is read back.
    fn notify(&self, title: &str, message: &str);
}

/// A single reported effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Progress(f64),
    Status(String),
    Notify { title: String, message: String },
}

/// Reporter that forwards every call over an mpsc channel.
///
/// A closed receiver is not an error for the engine: events are dropped.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: Sender<Event>,
}

impl ChannelReporter {
    pub fn new() -> (Self, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

impl Reporter for ChannelReporter {
    fn progress(&self, percent: f64) {
        self.send(Event::Progress(percent));
    }

    fn status(&self, text: &str) {
        self.send(Event::Status(text.to_string()));
    }

    fn notify(&self, title: &str, message: &str) {
        self.send(Event::Notify {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn progress(&self, _percent: f64) {}
    fn status(&self, _text: &str) {}
    fn notify(&self, _title: &str, _message: &str) {}
}

/// Reporter that keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn progress_values(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Notify { title, message } => Some((title, message)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Reporter for RecordingReporter {
    fn progress(&self, percent: f64) {
        self.push(Event::Progress(percent));
    }

    fn status(&self, text: &str) {
        self.push(Event::Status(text.to_string()));
    }

    fn notify(&self, title: &str, message: &str) {
        self.push(Event::Notify {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

/// Progress for one phase: clamped to `0..=100`, never decreasing, and
/// always ends at `100`.
pub struct PhaseProgress<'a> {
    reporter: &'a dyn Reporter,
    total: u64,
    last: f64,
}

impl<'a> PhaseProgress<'a> {
    pub fn new(reporter: &'a dyn Reporter, total: u64) -> Self {
        Self {
            reporter,
            total,
            last: 0.0,
        }
    }

    /// Report `done` units out of the phase total.
    pub fn advance_to(&mut self, done: u64) {
        let percent = if self.total == 0 {
            100.0
        } else {
            (done as f64 / self.total as f64 * 100.0).min(100.0)
        };
        if percent >= self.last {
            self.last = percent;
            self.reporter.progress(percent);
        }
    }

    pub fn finish(self) {
        self.reporter.progress(100.0);
    }
}
