//! Risk assessment pipeline for riskiq.
//!
//! Request-time flow:
//!
//! ```text
//! answers ──► scoring ──► ContextRetriever ──► PromptBudgetAssembler ──► Provider ──► ResponseParser
//!                             │ (VectorIndex)
//! ```
//!
//! [`AssessmentService`] ties the stages together and owns the session store
//! that links a profile (step 1) to its answers (step 2).

pub mod budget;
pub mod catalogue;
pub mod parser;
pub mod prompts;
pub mod questions;
pub mod render;
pub mod retrieval;
pub mod scoring;
pub mod service;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use budget::{AssembledPrompt, BudgetReport, PromptBlock, PromptBudgetAssembler, PromptTemplate};
pub use catalogue::RiskCatalogue;
pub use parser::{Resource, ResponseParser, StructuredAdvice};
pub use retrieval::{ContextRetriever, ContextSource, RetrievalResult};
pub use scoring::{RiskLevel, ScoringRules};
pub use service::{Answer, AssessmentReport, AssessmentService, AssessmentStart, ServiceSettings};
pub use session::SessionStore;
