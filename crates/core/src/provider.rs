//! AnswerProvider trait — the abstraction over answer-generation backends.
//!
//! A provider takes the assembled prompt and returns the answer text. The
//! fallback chain in `streamlens-providers` calls `generate()` without
//! knowing which lane is behind it.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::prompt::PromptSegment;

/// An answer-generation lane (Gemini, OpenAI, or a test double).
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// A human-readable name for this lane (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Generate an answer from the prompt.
    ///
    /// Implementations decide how to render the segments: the Gemini lane
    /// flattens them to one text blob, the OpenAI lane keeps the role tags.
    async fn generate(
        &self,
        prompt: &[PromptSegment],
    ) -> std::result::Result<String, ProviderError>;
}
