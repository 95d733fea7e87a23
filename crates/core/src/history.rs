//! Conversation history shown to the user.
//!
//! Unlike [`crate::message::Conversation`], which is the scratch transcript
//! of a single agent run, `ChatHistory` is the two-party log a session keeps
//! across turns. It is append-only: the only way to remove entries is to
//! drop or clear the whole history (session reset).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    DispatchAgent,
    /// Reserved for a comparison answer from a tool-less model.
    Baseline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: Sender,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_error: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatHistory {
    entries: Vec<HistoryEntry>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, sender: Sender, message: impl Into<String>, is_error: bool) {
        self.entries.push(HistoryEntry {
            sender,
            message: message.into(),
            timestamp: Utc::now(),
            is_error,
        });
    }

    pub fn push_user(&mut self, message: impl Into<String>) {
        self.push(Sender::User, message, false);
    }

    pub fn push_agent(&mut self, message: impl Into<String>) {
        self.push(Sender::DispatchAgent, message, false);
    }

    /// Record a failed turn as a visible agent-side entry.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.push(Sender::DispatchAgent, message, true);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
