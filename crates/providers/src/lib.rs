//! LLM provider and embedder implementations for riskiq.
//!
//! All providers implement the `riskiq_core::Provider` trait; embedders
//! implement `riskiq_core::Embedder`. The router selects the correct backend
//! based on configuration.

pub mod embedder;
pub mod openai_compat;
pub mod router;

pub use embedder::{HashEmbedder, ProviderEmbedder};
pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_embedder, build_from_config, ProviderRouter};
