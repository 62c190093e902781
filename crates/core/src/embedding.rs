//! Embedder trait: `embed(text) -> vector`.
//!
//! The vector index depends only on this trait. Implementations must return
//! one vector per input, all of the same dimension, in input order.

use async_trait::async_trait;
use crate::error::ProviderError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the embedding model. Persisted in the index manifest so a
    /// model change invalidates stored vectors.
    fn model(&self) -> &str;

    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Embed one text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ProviderError::Embedding("embedder returned no vector".into()))
    }
}
