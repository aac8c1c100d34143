//! Data types for documents, chunks, and retrieved chunks.

use serde::{Deserialize, Serialize};

/// A source document, identified by a unique name such as its file name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The extracted text content of the document.
    pub text: String,
}

impl Document {
    /// Create a document from its name and extracted text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// A word-bounded slice of a [`Document`]'s text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// The text content of the chunk.
    pub text: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Zero-based position of this chunk within its document.
    pub position: usize,
}

/// A chunk selected by the retriever, paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    /// Position of the chunk in the index (its insertion order).
    pub index_position: usize,
    /// The chunk text.
    pub text: String,
    /// The ID of the document the chunk came from.
    pub document_id: String,
    /// Cosine similarity against the query (higher is more relevant).
    pub score: f32,
}
