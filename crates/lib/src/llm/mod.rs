//! LLM abstraction and Claude client.
//!
//! A single-call completion seam: the enhancer asks a backend for one
//! completion and does not care which vendor answers. `ClaudeClient`
//! implements it against the Anthropic Messages API.

mod claude;

pub use claude::{ClaudeClient, ClaudeError};

use async_trait::async_trait;

/// A text-completion backend: one prompt in, one generated text out.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run a single completion with the given model and output-token budget.
    async fn complete(
        &self,
        model: &str,
        max_tokens: u32,
        prompt: &str,
    ) -> Result<String, ClaudeError>;
}
