//! Chat completion provider trait for answer generation

use async_trait::async_trait;

use crate::error::Result;

/// Trait for LLM answer generation from a fully composed prompt
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Submit a prompt and return the plain-text completion
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the model being used
    fn model(&self) -> &str;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
