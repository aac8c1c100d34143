//! Chat session orchestrator.
//!
//! A [`ChatSession`] owns the embedding index and the chat history for one
//! interactive run, and composes an [`EmbeddingProvider`], a [`Generator`],
//! and a [`Chunker`] into the ingest-and-ask workflow.
//!
//! # Example
//!
//! ```rust,ignore
//! use contract_chat::{ChatConfig, ChatSession, Document};
//!
//! let mut session = ChatSession::builder()
//!     .config(ChatConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .generator(Arc::new(my_generator))
//!     .build()?;
//!
//! session.ingest_document(&Document::new("lease.pdf", text)).await?;
//! let entry = session.ask("When does the lease terminate?").await?;
//! for (source, answer) in entry.answers.iter() {
//!     println!("{source}: {answer}");
//! }
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::answer::AnswerAggregator;
use crate::chunking::{Chunker, WordWindowChunker};
use crate::config::ChatConfig;
use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{ChatError, Result};
use crate::extract::TextExtractor;
use crate::generation::Generator;
use crate::history::{ChatHistory, HistoryEntry};
use crate::index::EmbeddingIndex;
use crate::retrieval::Retriever;

/// Summary of one document ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// The ingested document.
    pub document_id: String,
    /// Number of chunks added to the index. Zero when the document had no text.
    pub chunk_count: usize,
}

/// In-memory state and collaborators for one interactive run.
///
/// Ingestion and asking both take `&mut self`, so a question never observes
/// a partially ingested document.
pub struct ChatSession {
    config: ChatConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
    aggregator: AnswerAggregator,
    index: EmbeddingIndex,
    history: ChatHistory,
}

impl ChatSession {
    /// Create a new [`ChatSessionBuilder`].
    pub fn builder() -> ChatSessionBuilder {
        ChatSessionBuilder::default()
    }

    /// Return a reference to the session configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Return a reference to the embedding index.
    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Return a reference to the chat history.
    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    /// Ingest a document: chunk → embed → append.
    ///
    /// A document whose text has no words is recorded as known with zero
    /// chunks.
    ///
    /// # Errors
    ///
    /// - [`ChatError::DuplicateDocument`] if the document ID was seen before.
    /// - [`ChatError::EmbeddingFailure`] if embedding fails; nothing is indexed.
    pub async fn ingest_document(&mut self, document: &Document) -> Result<IngestReport> {
        if self.index.is_known(&document.id) {
            info!(document.id = %document.id, "document already ingested");
            return Err(ChatError::DuplicateDocument { document_id: document.id.clone() });
        }

        let chunks = self.chunker.chunk(document);
        let chunk_count =
            self.index.ingest(&document.id, &chunks, self.embedding_provider.as_ref()).await?;

        Ok(IngestReport { document_id: document.id.clone(), chunk_count })
    }

    /// Extract text from raw bytes, then ingest it under `document_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Extraction`] if the extractor fails, plus every
    /// error of [`ingest_document`](Self::ingest_document).
    pub async fn ingest_bytes(
        &mut self,
        document_id: &str,
        bytes: &[u8],
        extractor: &dyn TextExtractor,
    ) -> Result<IngestReport> {
        if self.index.is_known(document_id) {
            return Err(ChatError::DuplicateDocument { document_id: document_id.to_string() });
        }

        let text = extractor.extract_text(bytes).map_err(|e| {
            error!(document.id = document_id, error = %e, "text extraction failed");
            match e {
                ChatError::Extraction(_) => e,
                other => ChatError::Extraction(other.to_string()),
            }
        })?;

        if text.trim().is_empty() {
            info!(document.id = document_id, "no extractable text");
        }

        self.ingest_document(&Document::new(document_id, text)).await
    }

    /// Answer `question` from the indexed documents and record it in history.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::EmptyIndex`] or [`ChatError::EmbeddingFailure`]
    /// from retrieval. Nothing is recorded in that case. Generation failures
    /// are reported per document inside the entry instead.
    pub async fn ask(&mut self, question: &str) -> Result<&HistoryEntry> {
        let grouped = Retriever::query(
            &self.index,
            self.embedding_provider.as_ref(),
            question,
            self.config.top_k,
        )
        .await?;

        let answers = self.aggregator.answer(question, &grouped).await;
        info!(source_count = answers.len(), history_len = self.history.len() + 1, "question answered");

        Ok(self.history.record(question, answers))
    }
}

/// Builder for constructing a [`ChatSession`].
///
/// `config`, `embedding_provider`, and `generator` are required. The chunker
/// defaults to a [`WordWindowChunker`] built from the config.
#[derive(Default)]
pub struct ChatSessionBuilder {
    config: Option<ChatConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn Generator>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl ChatSessionBuilder {
    /// Set the session configuration.
    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generator used to answer questions.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`ChatSession`], validating the config and required parts.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidConfiguration`] if a required part is
    /// missing or the config is inconsistent.
    pub fn build(self) -> Result<ChatSession> {
        let config = self
            .config
            .ok_or_else(|| ChatError::InvalidConfiguration("config is required".to_string()))?;
        config.validate()?;

        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            ChatError::InvalidConfiguration("embedding_provider is required".to_string())
        })?;
        let generator = self
            .generator
            .ok_or_else(|| ChatError::InvalidConfiguration("generator is required".to_string()))?;

        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(WordWindowChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        let aggregator =
            AnswerAggregator::new(generator, config.generation_timeout(), config.answer_marker.clone());

        Ok(ChatSession {
            config,
            embedding_provider,
            chunker,
            aggregator,
            index: EmbeddingIndex::new(),
            history: ChatHistory::new(),
        })
    }
}
