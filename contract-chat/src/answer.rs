//! Per-document answer aggregation.
//!
//! The [`AnswerAggregator`] issues one generation call per source document
//! represented in a [`GroupedChunks`], using only that document's chunks as
//! context. Calls run concurrently and each is bounded by a timeout. A failed
//! or timed-out call becomes [`Answer::Failed`] for that document alone.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::generation::Generator;
use crate::retrieval::{GroupedChunks, SourceGroup};

/// Displayed when generation produced nothing usable for a document.
pub const NO_RELEVANT_CONTENT: &str = "no relevant content found";

/// The outcome of answering a question against one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// A generated answer with the prompt echo removed.
    Text(String),
    /// The generator returned only whitespace or echo.
    NoRelevantContent,
    /// Generation failed or timed out; carries the reason.
    Failed(String),
}

impl Answer {
    /// The answer text, if generation produced one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether generation failed for this document.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::NoRelevantContent => f.write_str(NO_RELEVANT_CONTENT),
            Self::Failed(reason) => write!(f, "answer unavailable: {reason}"),
        }
    }
}

/// Answers for one question, keyed by document ID in retrieval order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    answers: Vec<(String, Answer)>,
}

impl QueryResult {
    /// The answer recorded for `document_id`.
    pub fn get(&self, document_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|(id, _)| id == document_id).map(|(_, answer)| answer)
    }

    /// Iterate over `(document_id, answer)` pairs in retrieval order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.answers.iter().map(|(id, answer)| (id.as_str(), answer))
    }

    /// Document IDs in retrieval order.
    pub fn document_ids(&self) -> impl Iterator<Item = &str> {
        self.answers.iter().map(|(id, _)| id.as_str())
    }

    /// Number of documents answered.
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Whether no document was answered.
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// Keep only the text after the last `marker`, trimmed.
///
/// Generators often return the prompt followed by the completion. When the
/// marker does not occur, the whole text is trimmed and returned.
///
/// # Example
///
/// ```
/// use contract_chat::strip_prompt_echo;
///
/// let raw = "Question: Who pays?\nAnswer: The tenant.";
/// assert_eq!(strip_prompt_echo(raw, "Answer:"), "The tenant.");
/// ```
pub fn strip_prompt_echo<'a>(raw: &'a str, marker: &str) -> &'a str {
    raw.rsplit_once(marker).map_or(raw, |(_, answer)| answer).trim()
}

/// Build the grounded-answer prompt for one document.
pub fn build_answer_prompt(question: &str, context: &str, marker: &str) -> String {
    format!(
        "You are a legal expert. Answer the following question strictly based on the \
         contract content below. Do not use any outside knowledge.\n\n\
         Contract Content:\n{context}\n\n\
         Question: {question}\n\
         {marker}\n"
    )
}

/// Asks a [`Generator`] for one answer per retrieved source document.
pub struct AnswerAggregator {
    generator: Arc<dyn Generator>,
    timeout: Duration,
    marker: String,
}

impl AnswerAggregator {
    /// Create an aggregator with the given per-call timeout and answer marker.
    pub fn new(generator: Arc<dyn Generator>, timeout: Duration, marker: impl Into<String>) -> Self {
        Self { generator, timeout, marker: marker.into() }
    }

    /// Answer `question` once per document in `grouped`.
    ///
    /// Never fails as a whole: each document's outcome is recorded in the
    /// returned [`QueryResult`], in group order.
    pub async fn answer(&self, question: &str, grouped: &GroupedChunks) -> QueryResult {
        let calls = grouped.groups().iter().map(|group| self.answer_group(question, group));
        let outcomes = join_all(calls).await;

        let answers: Vec<(String, Answer)> = grouped
            .document_ids()
            .map(str::to_string)
            .zip(outcomes)
            .collect();

        let failed = answers.iter().filter(|(_, a)| a.is_failure()).count();
        info!(source_count = answers.len(), failed, "answers aggregated");

        QueryResult { answers }
    }

    async fn answer_group(&self, question: &str, group: &SourceGroup) -> Answer {
        let prompt = build_answer_prompt(question, &group.context(), &self.marker);
        debug!(
            document.id = %group.document_id,
            chunk_count = group.chunks.len(),
            prompt_len = prompt.len(),
            "requesting answer"
        );

        match tokio::time::timeout(self.timeout, self.generator.generate(&prompt)).await {
            Ok(Ok(raw)) => {
                let answer = strip_prompt_echo(&raw, &self.marker);
                if answer.is_empty() {
                    Answer::NoRelevantContent
                } else {
                    Answer::Text(answer.to_string())
                }
            }
            Ok(Err(e)) => {
                warn!(
                    document.id = %group.document_id,
                    generator = self.generator.name(),
                    error = %e,
                    "generation failed"
                );
                Answer::Failed(e.to_string())
            }
            Err(_) => {
                warn!(
                    document.id = %group.document_id,
                    timeout_secs = self.timeout.as_secs(),
                    "generation timed out"
                );
                Answer::Failed(format!("generation timed out after {:?}", self.timeout))
            }
        }
    }
}
