//! Query-time retrieval: embed the question, rank chunks, group by source.

use serde::Serialize;
use tracing::{error, info};

use crate::document::RetrievedChunk;
use crate::embedding::EmbeddingProvider;
use crate::error::{ChatError, Result};
use crate::index::EmbeddingIndex;

/// The retrieved chunks of one source document, in rank order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceGroup {
    /// The document the chunks came from.
    pub document_id: String,
    /// Retrieved chunks, best match first.
    pub chunks: Vec<RetrievedChunk>,
}

impl SourceGroup {
    /// Chunk texts joined by newlines, best match first.
    pub fn context(&self) -> String {
        self.chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n")
    }
}

/// Top-k chunks grouped by source document.
///
/// Groups are ordered by the rank of each document's best chunk.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GroupedChunks {
    groups: Vec<SourceGroup>,
}

impl GroupedChunks {
    /// Group ranked chunks by document, keeping first-seen order.
    pub fn from_ranked(ranked: Vec<RetrievedChunk>) -> Self {
        let mut groups: Vec<SourceGroup> = Vec::new();
        for chunk in ranked {
            match groups.iter_mut().find(|g| g.document_id == chunk.document_id) {
                Some(group) => group.chunks.push(chunk),
                None => groups.push(SourceGroup {
                    document_id: chunk.document_id.clone(),
                    chunks: vec![chunk],
                }),
            }
        }
        Self { groups }
    }

    /// All groups in order.
    pub fn groups(&self) -> &[SourceGroup] {
        &self.groups
    }

    /// The group for `document_id`, if it was retrieved.
    pub fn get(&self, document_id: &str) -> Option<&SourceGroup> {
        self.groups.iter().find(|g| g.document_id == document_id)
    }

    /// Represented document IDs, in group order.
    pub fn document_ids(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.document_id.as_str())
    }

    /// Number of represented documents.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no document is represented.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of retrieved chunks across all groups.
    pub fn total_chunks(&self) -> usize {
        self.groups.iter().map(|g| g.chunks.len()).sum()
    }
}

/// Ranks indexed chunks against a question.
#[derive(Debug, Clone, Copy, Default)]
pub struct Retriever;

impl Retriever {
    /// Embed `question`, select the `top_k` most similar chunks, and group
    /// them by source document.
    ///
    /// Returns an empty grouping when `top_k` is zero.
    ///
    /// # Errors
    ///
    /// - [`ChatError::EmptyIndex`] if nothing has been ingested.
    /// - [`ChatError::EmbeddingFailure`] if the question cannot be embedded,
    ///   or its embedding is empty or differs in length from the index.
    pub async fn query(
        index: &EmbeddingIndex,
        provider: &dyn EmbeddingProvider,
        question: &str,
        top_k: usize,
    ) -> Result<GroupedChunks> {
        if top_k == 0 {
            return Ok(GroupedChunks::default());
        }
        if index.is_empty() {
            return Err(ChatError::EmptyIndex);
        }

        let query_embedding = provider.embed(question).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            match e {
                ChatError::EmbeddingFailure { .. } => e,
                other => ChatError::embedding(provider.name(), other.to_string()),
            }
        })?;
        if query_embedding.is_empty() {
            error!("provider returned an empty query embedding");
            return Err(ChatError::embedding(provider.name(), "empty query embedding"));
        }
        let expected = index.dimensions().unwrap_or(query_embedding.len());
        if query_embedding.len() != expected {
            error!(expected, received = query_embedding.len(), "query embedding dimension mismatch");
            return Err(ChatError::embedding(
                provider.name(),
                format!(
                    "expected a {expected}-dimensional query embedding, received {}",
                    query_embedding.len()
                ),
            ));
        }

        let ranked = index.rank(&query_embedding, top_k);
        let grouped = GroupedChunks::from_ranked(ranked);

        info!(
            chunk_count = grouped.total_chunks(),
            source_count = grouped.len(),
            "retrieval completed"
        );
        Ok(grouped)
    }
}
