//! Generation capability used to answer questions from retrieved context.

use async_trait::async_trait;

use crate::error::Result;

/// A text generation backend.
///
/// The returned text may echo the prompt; callers strip it. No guarantees
/// are made about latency or determinism.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// A short name used in logs and error messages.
    fn name(&self) -> &str {
        "generator"
    }
}
