//! Word-window chunking.
//!
//! Text is tokenized on whitespace and cut into windows of `chunk_size`
//! words. Each window starts `chunk_size - overlap` words after the previous
//! one, so consecutive chunks share exactly `overlap` words.

use crate::document::{Chunk, Document};
use crate::error::{ChatError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations tag each chunk with its document ID and position.
/// Embeddings are attached later by the index.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no words.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Split `text` into overlapping windows of at most `chunk_size` words.
///
/// Words are re-joined with single spaces. The final window may be shorter
/// than `chunk_size`.
///
/// # Errors
///
/// Returns [`ChatError::InvalidConfiguration`] unless `chunk_size > overlap`.
///
/// # Example
///
/// ```
/// use contract_chat::chunking::split;
///
/// let chunks = split("a b c d e", 3, 1).unwrap();
/// assert_eq!(chunks, vec!["a b c", "c d e", "e"]);
/// ```
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    check_window(chunk_size, overlap)?;

    let words: Vec<&str> = text.split_whitespace().collect();
    let step = chunk_size - overlap;

    Ok((0..words.len())
        .step_by(step)
        .map(|start| {
            let end = start.saturating_add(chunk_size).min(words.len());
            words[start..end].join(" ")
        })
        .collect())
}

fn check_window(chunk_size: usize, overlap: usize) -> Result<()> {
    if chunk_size <= overlap {
        return Err(ChatError::InvalidConfiguration(format!(
            "chunk_size ({chunk_size}) must be greater than overlap ({overlap})"
        )));
    }
    Ok(())
}

/// Splits documents into fixed word-count windows with overlap.
///
/// Parameters are validated at construction, so [`Chunker::chunk`] never
/// fails.
///
/// # Example
///
/// ```
/// use contract_chat::{Chunker, Document, WordWindowChunker};
///
/// let chunker = WordWindowChunker::new(500, 50).unwrap();
/// let chunks = chunker.chunk(&Document::new("lease.pdf", "The tenant shall pay rent."));
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].document_id, "lease.pdf");
/// ```
#[derive(Debug, Clone)]
pub struct WordWindowChunker {
    chunk_size: usize,
    overlap: usize,
}

impl WordWindowChunker {
    /// Create a new `WordWindowChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of words per chunk
    /// * `overlap` — number of words shared by consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidConfiguration`] unless `chunk_size > overlap`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        check_window(chunk_size, overlap)?;
        Ok(Self { chunk_size, overlap })
    }

    /// Maximum number of words per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of words shared by consecutive chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Chunker for WordWindowChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        // Parameters were checked in `new`.
        let Ok(texts) = split(&document.text, self.chunk_size, self.overlap) else {
            return Vec::new();
        };

        texts
            .into_iter()
            .enumerate()
            .map(|(position, text)| Chunk {
                text,
                document_id: document.id.clone(),
                position,
            })
            .collect()
    }
}
