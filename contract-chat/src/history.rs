//! Append-only chat history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::answer::QueryResult;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The question as asked.
    pub question: String,
    /// Per-document answers, in retrieval order.
    pub answers: QueryResult,
    /// When the answers were recorded.
    pub asked_at: DateTime<Utc>,
}

/// Chronological log of questions and their answers.
///
/// Entries can be appended and read but never modified or removed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatHistory {
    entries: Vec<HistoryEntry>,
}

impl ChatHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a question with its answers and return the new entry.
    pub fn record(&mut self, question: impl Into<String>, answers: QueryResult) -> &HistoryEntry {
        self.entries.push(HistoryEntry { question: question.into(), answers, asked_at: Utc::now() });
        &self.entries[self.entries.len() - 1]
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
