//! AI trait for LLM operations.
//!
//! The pipeline needs exactly one capability from a model provider: send a
//! system instruction plus a user message and get text back. Everything
//! else (prompting, JSON repair, schema coercion) lives in the library.

use async_trait::async_trait;

use crate::error::Result;

/// AI trait for structured-extraction calls.
///
/// Implementations wrap specific LLM providers (OpenAI, Anthropic, etc.)
/// and are constructed by the caller, then handed to the orchestrators.
#[async_trait]
pub trait AI: Send + Sync {
    /// Run one structured-extraction request.
    ///
    /// Returns the raw response text. The text is expected to hold JSON,
    /// optionally fenced in a ```json block; callers do the parsing.
    async fn extract_structured(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// Short provider label used in logs.
    fn name(&self) -> &str {
        "ai"
    }
}

#[async_trait]
impl<T: AI + ?Sized> AI for std::sync::Arc<T> {
    async fn extract_structured(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        (**self).extract_structured(system_prompt, user_prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
