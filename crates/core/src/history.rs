//! Session history: an explicit log of entries with a cursor.
//!
//! Mirrors how a browser tab behaves. Pushing drops any forward entries;
//! back and forward move the cursor and hand back the entry landed on.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::query::Query;

pub const ROOT_LOCATION: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Query that produced the view; `None` when nothing was recorded.
    pub state: Option<Query>,
    pub location: String,
}

impl HistoryEntry {
    pub fn new(state: Option<Query>, location: impl Into<String>) -> Self {
        Self {
            state,
            location: location.into(),
        }
    }

    /// The query part of the location, without `?`.
    pub fn search(&self) -> &str {
        self.location
            .split_once('?')
            .map(|(_, query)| query)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: usize,
}

impl History {
    /// History holding a single stateless entry at `location`.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            entries: vec![HistoryEntry::new(None, location)],
            cursor: 0,
        }
    }

    pub fn push(&mut self, state: Option<Query>, location: impl Into<String>) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(HistoryEntry::new(state, location));
        self.cursor = self.entries.len() - 1;
        debug!(location = %self.location(), depth = self.entries.len(), "History push");
    }

    /// Overwrite the current entry's state, keeping its location.
    pub fn replace(&mut self, state: Option<Query>) {
        self.entries[self.cursor].state = state;
    }

    pub fn back(&mut self) -> Option<&HistoryEntry> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        debug!(location = %self.location(), "History back");
        self.entries.get(self.cursor)
    }

    pub fn forward(&mut self) -> Option<&HistoryEntry> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        debug!(location = %self.location(), "History forward");
        self.entries.get(self.cursor)
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.cursor]
    }

    pub fn location(&self) -> &str {
        &self.current().location
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(ROOT_LOCATION)
    }
}
