//! Error types for the riskiq domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them all.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all riskiq operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Ingestion errors ---
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    // --- Vector index errors ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Assessment errors ---
    #[error("Assessment error: {0}")]
    Assessment(#[from] AssessmentError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),
}

/// Failures while turning a corpus folder into chunks.
///
/// Only `FolderNotFound` and `NoDocuments` escape `ingest`; the per-file
/// variants are logged and the file is skipped.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Corpus folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    #[error("No extractable documents in {}", .0.display())]
    NoDocuments(PathBuf),

    #[error("Failed to read {}: {reason}", .path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Extraction failed for {}: {reason}", .path.display())]
    Extraction { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("No persisted index at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Persisted index at {} is corrupted: {reason}", .path.display())]
    Corrupted { path: PathBuf, reason: String },

    #[error("Index storage error: {0}")]
    Storage(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(#[from] ProviderError),

    #[error("Cannot build index: {0}")]
    Source(#[from] IngestError),

    #[error("Index is empty")]
    Empty,
}

#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("Unknown assessment session '{0}'; submit a company profile first")]
    SessionNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Language model generation failed: {0}")]
    Generation(#[from] ProviderError),

    #[error("Risk catalogue error: {0}")]
    Catalogue(String),
}

impl AssessmentError {
    /// Whether this error was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::SessionNotFound(_) | Self::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn ingest_error_names_the_folder() {
        let err = Error::Ingest(IngestError::NoDocuments(PathBuf::from("data/")));
        assert!(err.to_string().contains("data/"));
    }

    #[test]
    fn session_errors_are_client_errors() {
        assert!(AssessmentError::SessionNotFound("abc".into()).is_client_error());
        assert!(AssessmentError::InvalidInput("empty".into()).is_client_error());
        let generation = AssessmentError::Generation(ProviderError::Timeout("60s".into()));
        assert!(!generation.is_client_error());
        assert!(generation.to_string().contains("60s"));
    }
}
