//! # riskiq Core
//!
//! Domain types, capability traits, and error definitions for the riskiq
//! risk-assessment service. This crate has **no framework dependencies**:
//! it defines the model every other crate implements against.
//!
//! ## Capabilities
//!
//! The service talks to two external capabilities, both defined here as traits:
//! - [`Provider`]: `generate(prompt) -> text` (a language model)
//! - [`Embedder`]: `embed(text) -> vector` (an embedding model)
//!
//! Implementations live in `riskiq-providers`; tests substitute scripted mocks.

pub mod document;
pub mod embedding;
pub mod error;
pub mod message;
pub mod provider;
pub mod risk;
pub mod text;

// Re-export key types at crate root for ergonomics
pub use document::{Chunk, EmbeddedChunk, Locator, RawUnit, SourceRef};
pub use embedding::Embedder;
pub use error::{AssessmentError, Error, IndexError, IngestError, ProviderError, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use risk::{CompanyProfile, RiskAnswer, RiskCategory, RiskQuestion, RiskTableRow};
