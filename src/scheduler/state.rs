//! Per-session scheduler state. One value per editing session, never shared
//! and never persisted.

use crate::intervention::delta::word_count;
use chrono::{DateTime, Utc};

/// The one "previous" text a session keeps.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSnapshot {
    pub content: String,
    pub word_count: usize,
    pub captured_at: DateTime<Utc>,
}

impl TextSnapshot {
    pub fn capture(content: impl Into<String>, at: DateTime<Utc>) -> Self {
        let content = content.into();
        Self {
            word_count: word_count(&content),
            content,
            captured_at: at,
        }
    }
}

/// Explicit-mode state: the last committed snapshot.
#[derive(Debug, Clone)]
pub struct SchedulerState {
    snapshot: TextSnapshot,
}

impl SchedulerState {
    pub fn new(initial: TextSnapshot) -> Self {
        Self { snapshot: initial }
    }

    pub fn snapshot(&self) -> &TextSnapshot {
        &self.snapshot
    }

    /// Replace the snapshot, returning the one it superseded.
    pub fn commit(&mut self, next: TextSnapshot) -> TextSnapshot {
        std::mem::replace(&mut self.snapshot, next)
    }
}

/// Ambient-mode trackers.
#[derive(Debug, Clone)]
pub struct AmbientState {
    pub last_checked_word_count: usize,
    pub last_checked_at: DateTime<Utc>,
    pub last_checked_text: String,
}

impl AmbientState {
    pub fn new(initial_text: &str, at: DateTime<Utc>) -> Self {
        Self {
            last_checked_word_count: word_count(initial_text),
            last_checked_at: at,
            last_checked_text: initial_text.to_string(),
        }
    }

    pub fn reset(&mut self, text: &str, word_count: usize, at: DateTime<Utc>) {
        self.last_checked_word_count = word_count;
        self.last_checked_at = at;
        self.last_checked_text = text.to_string();
    }
}
