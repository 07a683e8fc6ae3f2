//! Rolling conversation history.
//!
//! The history is owned by the client session and resent with every turn.
//! It only ever keeps the most recent [`HISTORY_LIMIT`] entries so the
//! payload sent to the completion service stays bounded.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use tracing::warn;

/// Maximum number of retained entries (ten user/assistant exchanges).
pub const HISTORY_LIMIT: usize = 20;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only history truncated to the most recent entries.
///
/// Serializes as a plain JSON array. Deserialization is lenient: entries that
/// are not a valid `{role, content}` pair are dropped, anything other than an
/// array reads as an empty history, and arrays longer than the limit are
/// clamped to their tail.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(into = "Vec<HistoryEntry>")]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > HISTORY_LIMIT {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl From<Vec<HistoryEntry>> for History {
    fn from(entries: Vec<HistoryEntry>) -> Self {
        let mut history = History::new();
        for entry in entries {
            history.push(entry);
        }
        history
    }
}

impl<'de> Deserialize<'de> for History {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = match Value::deserialize(deserializer)? {
            Value::Array(raw) => raw,
            Value::Null => Vec::new(),
            other => {
                warn!(kind = ?other, "History is not an array; ignoring it.");
                Vec::new()
            }
        };

        let mut history = History::new();
        for (index, entry) in raw.into_iter().enumerate() {
            match serde_json::from_value::<HistoryEntry>(entry) {
                Ok(entry) => history.push(entry),
                Err(e) => warn!(index, error = %e, "Dropping malformed history entry."),
            }
        }
        Ok(history)
    }
}

impl From<History> for Vec<HistoryEntry> {
    fn from(history: History) -> Self {
        history.entries.into()
    }
}
