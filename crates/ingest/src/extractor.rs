//! Extractor trait: one implementation per document family.

use riskiq_core::document::RawUnit;
use riskiq_core::error::IngestError;
use std::path::Path;

pub trait Extractor: Send + Sync {
    /// Short name used in logs (e.g. "pdf").
    fn name(&self) -> &'static str;

    /// Whether this extractor handles the file, judged by its extension.
    fn supports(&self, path: &Path) -> bool;

    /// Extract raw text units. An `Ok` with no units means the file had no text.
    fn extract(&self, path: &Path) -> Result<Vec<RawUnit>, IngestError>;
}

/// Lowercased extension of `path`, if any.
pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// File name for metadata; falls back to the full path.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .unwrap_or_else(|| path.display().to_string())
}
