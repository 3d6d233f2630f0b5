//! LLM completion seam for ticket classification.
//!
//! The pipeline needs exactly one call shape: system prompt + user text
//! in, raw model text out. Failures must keep rate limiting
//! distinguishable from everything else so the retry controller knows
//! what is worth waiting for.

mod groq;
pub mod retry;

pub use groq::GroqClient;

use async_trait::async_trait;

use crate::error::LlmError;

/// A text-completion backend.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Run one completion. No retry here — that is the caller's job.
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, LlmError>;
}
