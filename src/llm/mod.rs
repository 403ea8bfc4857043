//! Generative model service access.
//!
//! The orchestrator only sees [`CompletionModel`]; [`OllamaClient`] talks to
//! an Ollama-compatible chat endpoint.

pub mod ollama;

use crate::error::LlmError;
use async_trait::async_trait;

pub use ollama::{OllamaClient, OllamaConfig};

/// A text-completion endpoint.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete `prompt` with `model`. An empty string means "no text".
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, LlmError>;
}
