//! Error types for the `contract-chat` crate.

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Chunking, retrieval, or session parameters are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The document was already ingested into this session.
    #[error("Document '{document_id}' has already been ingested")]
    DuplicateDocument {
        /// The identifier that was seen before.
        document_id: String,
    },

    /// A query was issued before any chunk was indexed.
    #[error("The index is empty; ingest at least one document before asking questions")]
    EmptyIndex,

    /// The embedding capability failed during ingestion or query.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingFailure {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation capability failed.
    #[error("Generation error ({provider}): {message}")]
    GenerationFailure {
        /// The generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Text could not be extracted from a source document.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The generator answered, but not in the expected shape.
    #[error("Malformed model response")]
    MalformedResponse {
        /// The raw generated text, kept so callers can display it.
        raw: String,
    },
}

impl ChatError {
    pub(crate) fn embedding(provider: &str, message: impl Into<String>) -> Self {
        Self::EmbeddingFailure { provider: provider.to_string(), message: message.into() }
    }

    pub(crate) fn generation(provider: &str, message: impl Into<String>) -> Self {
        Self::GenerationFailure { provider: provider.to_string(), message: message.into() }
    }
}

/// A convenience result type for contract-chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;
