//! Deterministic collaborators shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use contract_chat::{ChatError, Chunk, EmbeddingProvider, Generator, Result};

/// Embeds text as keyword counts over a fixed vocabulary.
///
/// Texts sharing keywords point in similar directions; texts with none of
/// the keywords embed to the zero vector.
pub struct KeywordEmbedding {
    vocabulary: Vec<&'static str>,
    /// Any batch containing this word fails.
    poison: Option<&'static str>,
    batch_calls: AtomicUsize,
    embed_calls: AtomicUsize,
}

impl KeywordEmbedding {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            poison: None,
            batch_calls: AtomicUsize::new(0),
            embed_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, poison: &'static str) -> Self {
        self.poison = Some(poison);
        self
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Single-text embeddings, including those made on behalf of a batch.
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .collect();
        self.vocabulary
            .iter()
            .map(|keyword| words.iter().filter(|w| w == keyword).count() as f32)
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(poison) = self.poison {
            if text.contains(poison) {
                return Err(ChatError::EmbeddingFailure {
                    provider: "keyword".into(),
                    message: format!("refusing to embed '{poison}'"),
                });
            }
        }
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Returns one embedding too few for every batch.
pub struct ShortBatchEmbedding;

#[async_trait]
impl EmbeddingProvider for ShortBatchEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![vec![1.0, 0.0]; texts.len().saturating_sub(1)])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Records every prompt and answers according to simple rules.
///
/// - A prompt containing a `fail_on` word returns a generation error.
/// - A prompt containing a `silent_on` word echoes the prompt only.
/// - A prompt containing a `slow_on` word sleeps for `delay` first.
/// - Otherwise the prompt is echoed followed by `reply`.
pub struct ScriptedGenerator {
    prompts: Mutex<Vec<String>>,
    reply: String,
    fail_on: Vec<&'static str>,
    silent_on: Vec<&'static str>,
    slow_on: Vec<&'static str>,
    delay: Duration,
}

impl ScriptedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: reply.to_string(),
            fail_on: Vec::new(),
            silent_on: Vec::new(),
            slow_on: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn failing_on(mut self, word: &'static str) -> Self {
        self.fail_on.push(word);
        self
    }

    pub fn silent_on(mut self, word: &'static str) -> Self {
        self.silent_on.push(word);
        self
    }

    pub fn slow_on(mut self, word: &'static str, delay: Duration) -> Self {
        self.slow_on.push(word);
        self.delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if self.slow_on.iter().any(|w| prompt.contains(w)) {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_on.iter().any(|w| prompt.contains(w)) {
            return Err(ChatError::GenerationFailure {
                provider: "scripted".into(),
                message: "model unavailable".into(),
            });
        }
        if self.silent_on.iter().any(|w| prompt.contains(w)) {
            return Ok(format!("{prompt}   \n"));
        }
        Ok(format!("{prompt} {}", self.reply))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Chunks of `document_id` with the given texts, in order.
pub fn chunks(document_id: &str, texts: &[&str]) -> Vec<Chunk> {
    texts
        .iter()
        .enumerate()
        .map(|(position, text)| Chunk {
            text: text.to_string(),
            document_id: document_id.to_string(),
            position,
        })
        .collect()
}

/// `count` distinct words: `w0 w1 … w{count-1}`.
pub fn numbered_words(count: usize) -> String {
    (0..count).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

/// Parses the text itself as a whitespace-separated vector, e.g. `"1 0 -0.5"`.
///
/// Lets tests place chunks at exact points in embedding space.
pub struct LiteralEmbedding;

#[async_trait]
impl EmbeddingProvider for LiteralEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        text.split_whitespace()
            .map(|v| {
                v.parse::<f32>().map_err(|e| ChatError::EmbeddingFailure {
                    provider: "literal".into(),
                    message: format!("'{v}' is not a number: {e}"),
                })
            })
            .collect()
    }

    fn dimensions(&self) -> usize {
        0
    }
}

/// Deterministic hash-based embeddings with no semantic meaning.
pub struct HashEmbedding {
    dimensions: usize,
}

impl HashEmbedding {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        Ok((0..self.dimensions).map(|i| ((hash.wrapping_add(i as u64)) as f32).sin()).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
