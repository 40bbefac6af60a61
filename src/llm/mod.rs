//! Language model capability
//!
//! The pipeline consumes two model operations: a structured binary relevance
//! judgment and free-text completion. Everything else (endpoints, prompt
//! packaging for the structured call, retries) is an adapter concern.

mod ollama;

pub use ollama::OllamaModel;

use crate::errors::Result;
use async_trait::async_trait;

/// Request/response seam to the language model service
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Judge whether a passage contains information relevant to the question
    async fn classify(&self, question: &str, passage: &str) -> Result<bool>;

    /// Free-text completion; serves query rewriting, jargon extraction and
    /// answer synthesis with different prompts
    async fn complete(&self, prompt: &str) -> Result<String>;
}
