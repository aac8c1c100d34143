//! In-memory embedding index using cosine similarity.
//!
//! [`EmbeddingIndex`] keeps chunk texts, source tags, and embeddings in three
//! parallel vectors. Position `i` in each vector refers to the same chunk, and
//! a document's chunks are appended to all three only after every embedding
//! for that document has been obtained.

use std::collections::HashSet;

use tracing::{debug, error, info};

use crate::document::{Chunk, RetrievedChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{ChatError, Result};

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the result is not
/// finite. Vectors of different lengths are compared over their common
/// prefix. Sums are accumulated in `f64`, so large components do not
/// overflow.
///
/// # Example
///
/// ```
/// use contract_chat::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum();
    let norm_a: f64 = a.iter().map(|&x| f64::from(x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|&x| f64::from(x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() { similarity as f32 } else { 0.0 }
}

/// An appendable in-memory store of chunk embeddings.
///
/// Mutation requires `&mut self`, so ingestion can never interleave with a
/// query that borrows the index.
#[derive(Debug, Default)]
pub struct EmbeddingIndex {
    texts: Vec<String>,
    sources: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    known: HashSet<String>,
    documents: Vec<String>,
}

impl EmbeddingIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed and append all chunks of one document.
    ///
    /// Returns the number of chunks appended. A document with no chunks is
    /// still recorded as known.
    ///
    /// # Errors
    ///
    /// - [`ChatError::DuplicateDocument`] if `document_id` was ingested before.
    /// - [`ChatError::EmbeddingFailure`] if the provider fails, returns the
    ///   wrong number of vectors, or returns a vector whose length differs
    ///   from the index dimension. The index is left unchanged.
    pub async fn ingest(
        &mut self,
        document_id: &str,
        chunks: &[Chunk],
        provider: &dyn EmbeddingProvider,
    ) -> Result<usize> {
        if self.is_known(document_id) {
            return Err(ChatError::DuplicateDocument { document_id: document_id.to_string() });
        }

        if chunks.is_empty() {
            self.mark_known(document_id);
            info!(document.id = document_id, chunk_count = 0, "ingested document (empty)");
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = provider.embed_batch(&texts).await.map_err(|e| {
            error!(document.id = document_id, error = %e, "embedding failed during ingestion");
            match e {
                ChatError::EmbeddingFailure { .. } => e,
                other => ChatError::embedding(provider.name(), other.to_string()),
            }
        })?;

        if embeddings.len() != chunks.len() {
            error!(
                document.id = document_id,
                expected = chunks.len(),
                received = embeddings.len(),
                "embedding count mismatch"
            );
            return Err(ChatError::embedding(
                provider.name(),
                format!(
                    "expected {} embeddings for document '{document_id}', received {}",
                    chunks.len(),
                    embeddings.len()
                ),
            ));
        }

        let expected = self.expected_dimensions(provider, &embeddings);
        if let Some(mismatch) = embeddings.iter().find(|e| e.is_empty() || e.len() != expected) {
            error!(
                document.id = document_id,
                expected,
                received = mismatch.len(),
                "embedding dimension mismatch"
            );
            return Err(ChatError::embedding(
                provider.name(),
                format!(
                    "expected {expected}-dimensional embeddings for document '{document_id}', \
                     received {}",
                    mismatch.len()
                ),
            ));
        }

        // Every fallible step is done; append all three columns together.
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            self.texts.push(chunk.text.clone());
            self.sources.push(document_id.to_string());
            self.embeddings.push(embedding);
        }
        self.mark_known(document_id);

        let chunk_count = chunks.len();
        info!(document.id = document_id, chunk_count, index_size = self.size(), "ingested document");
        Ok(chunk_count)
    }

    /// The length new embeddings must have: the indexed length once a chunk
    /// is stored, otherwise the provider's declared length, otherwise the
    /// length of the first new embedding.
    fn expected_dimensions(
        &self,
        provider: &dyn EmbeddingProvider,
        embeddings: &[Vec<f32>],
    ) -> usize {
        self.dimensions()
            .or_else(|| Some(provider.dimensions()).filter(|&d| d > 0))
            .unwrap_or_else(|| embeddings.first().map_or(0, Vec::len))
    }

    fn mark_known(&mut self, document_id: &str) {
        if self.known.insert(document_id.to_string()) {
            self.documents.push(document_id.to_string());
        }
    }

    /// Number of chunks currently indexed.
    pub fn size(&self) -> usize {
        self.texts.len()
    }

    /// Length shared by every stored embedding, or `None` while empty.
    pub fn dimensions(&self) -> Option<usize> {
        self.embeddings.first().map(Vec::len)
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Whether `document_id` has been ingested.
    pub fn is_known(&self, document_id: &str) -> bool {
        self.known.contains(document_id)
    }

    /// Ingested document IDs, in ingestion order.
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Text of the chunk at `position`.
    pub fn chunk_text(&self, position: usize) -> Option<&str> {
        self.texts.get(position).map(String::as_str)
    }

    /// Source document of the chunk at `position`.
    pub fn source(&self, position: usize) -> Option<&str> {
        self.sources.get(position).map(String::as_str)
    }

    /// Embedding of the chunk at `position`.
    pub fn embedding(&self, position: usize) -> Option<&[f32]> {
        self.embeddings.get(position).map(Vec::as_slice)
    }

    /// Rank every chunk against `query` and keep the best `top_k`.
    ///
    /// Results are ordered by descending score. Equal scores keep insertion
    /// order.
    pub fn rank(&self, query: &[f32], top_k: usize) -> Vec<RetrievedChunk> {
        if top_k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(position, embedding)| (position, cosine_similarity(embedding, query)))
            .collect();

        // `sort_by` is stable, so ties stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        debug!(candidates = self.size(), selected = scored.len(), "ranked chunks");

        scored
            .into_iter()
            .map(|(position, score)| RetrievedChunk {
                index_position: position,
                text: self.texts[position].clone(),
                document_id: self.sources[position].clone(),
                score,
            })
            .collect()
    }
}
