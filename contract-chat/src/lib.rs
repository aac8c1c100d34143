//! # contract-chat
//!
//! Multi-document question answering over contracts.
//!
//! Documents are split into overlapping word windows, embedded through an
//! [`EmbeddingProvider`], and kept in an in-memory [`EmbeddingIndex`]. A
//! question is embedded the same way, the most similar chunks are grouped by
//! source document, and a [`Generator`] produces one answer per document from
//! that document's chunks alone. Every question and its answers are kept in
//! an append-only [`ChatHistory`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use contract_chat::{ChatConfig, ChatSession, PlainTextExtractor};
//!
//! let mut session = ChatSession::builder()
//!     .config(ChatConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .generator(Arc::new(my_generator))
//!     .build()?;
//!
//! session.ingest_bytes("lease.txt", &bytes, &PlainTextExtractor).await?;
//! let entry = session.ask("Who maintains the property?").await?;
//! ```
//!
//! ## Features
//!
//! - `pdf`: [`PdfTextExtractor`] for reading the text layer of PDF files
//! - `openai`: OpenAI-backed embedding and generation providers
//! - `full`: everything above

pub mod analysis;
pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod formalize;
pub mod generation;
pub mod history;
pub mod index;
pub mod retrieval;
pub mod session;

#[cfg(feature = "openai")]
pub mod openai;

pub use analysis::{ComplianceReport, analyze_contract, parse_compliance_report};
pub use answer::{Answer, AnswerAggregator, NO_RELEVANT_CONTENT, QueryResult, strip_prompt_echo};
pub use chunking::{Chunker, WordWindowChunker, split};
pub use config::{ChatConfig, ChatConfigBuilder};
pub use document::{Chunk, Document, RetrievedChunk};
pub use embedding::EmbeddingProvider;
pub use error::{ChatError, Result};
pub use extract::{PlainTextExtractor, TextExtractor};
pub use formalize::{AgreementSections, formalize_agreement};
pub use generation::Generator;
pub use history::{ChatHistory, HistoryEntry};
pub use index::{EmbeddingIndex, cosine_similarity};
pub use retrieval::{GroupedChunks, Retriever, SourceGroup};
pub use session::{ChatSession, ChatSessionBuilder, IngestReport};

#[cfg(feature = "pdf")]
pub use extract::PdfTextExtractor;

#[cfg(feature = "openai")]
pub use openai::{OpenAIEmbeddingProvider, OpenAIGenerator};
