//! Configuration for a chat session.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Configuration parameters for ingestion, retrieval, and answering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum chunk size in words.
    pub chunk_size: usize,
    /// Number of words shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question, across all documents.
    pub top_k: usize,
    /// Upper bound on a single generation call, in seconds.
    pub generation_timeout_secs: u64,
    /// Marker after which the generated answer starts.
    pub answer_marker: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 9,
            generation_timeout_secs: 120,
            answer_marker: "Answer:".to_string(),
        }
    }
}

impl ChatConfig {
    /// Create a new builder for constructing a [`ChatConfig`].
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// The generation timeout as a [`Duration`].
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Check that the parameters are consistent.
    ///
    /// Configurations deserialized from external sources bypass the builder,
    /// so the session calls this again before using one.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidConfiguration`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `generation_timeout_secs == 0`
    /// - `answer_marker` is empty
    pub fn validate(&self) -> Result<()> {
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChatError::InvalidConfiguration(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(ChatError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if self.generation_timeout_secs == 0 {
            return Err(ChatError::InvalidConfiguration(
                "generation_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.answer_marker.trim().is_empty() {
            return Err(ChatError::InvalidConfiguration(
                "answer_marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`ChatConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    /// Set the maximum chunk size in words.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in words.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the timeout applied to each generation call, in whole seconds.
    pub fn generation_timeout_secs(mut self, secs: u64) -> Self {
        self.config.generation_timeout_secs = secs;
        self
    }

    /// Set the marker that precedes the answer in generated text.
    pub fn answer_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.answer_marker = marker.into();
        self
    }

    /// Build the [`ChatConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`ChatConfig::validate`].
    pub fn build(self) -> Result<ChatConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
