//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;

use crate::error::Result;

/// Trait for generating text embeddings
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        let mut embeddings = self.embed_batch(&input).await?;
        embeddings
            .pop()
            .ok_or_else(|| crate::error::Error::embedding("provider returned no embedding"))
    }

    /// Generate embeddings for multiple texts, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the model identifier, used to key index snapshots
    fn model(&self) -> &str;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
