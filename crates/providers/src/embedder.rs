//! Embedders: adapters from the `Embedder` capability to concrete backends.
//!
//! - [`ProviderEmbedder`] forwards to a provider's `/embeddings` endpoint.
//! - [`HashEmbedder`] is a deterministic, offline feature-hashing embedder.
//!   It needs no network and no model download, so a fresh checkout can build
//!   and query an index immediately; tests use it too.

use async_trait::async_trait;
use riskiq_core::embedding::Embedder;
use riskiq_core::error::ProviderError;
use riskiq_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;

/// Embeds through a provider's embeddings API.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self { provider, model: model.into() }
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .provider
            .embed(EmbeddingRequest { model: self.model.clone(), inputs: texts.to_vec() })
            .await?;
        Ok(response.embeddings)
    }
}

/// Deterministic bag-of-words feature hashing, L2-normalized.
///
/// Each lowercase alphanumeric token is hashed (FNV-1a) into one of
/// `dimension` buckets with a hash-derived sign. Texts sharing vocabulary land
/// close under cosine similarity.
pub struct HashEmbedder {
    dimension: usize,
    model: String,
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self { dimension, model: format!("hash-{dimension}") }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn fnv1a(token: &str) -> u64 {
        token.bytes().fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME))
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let hash = Self::fnv1a(token);
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}
