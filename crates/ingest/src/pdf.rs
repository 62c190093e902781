//! Paginated documents via the `pdftotext` binary (poppler-utils).
//!
//! `pdftotext` separates pages with a form feed, which gives us 1-based page
//! numbers without a PDF parser in-process.

use crate::extractor::{extension, file_name, Extractor};
use riskiq_core::document::{RawUnit, SourceRef};
use riskiq_core::error::IngestError;
use std::path::Path;
use std::process::Command;
use tracing::debug;

const PAGE_BREAK: char = '\u{c}';

pub struct PdfExtractor {
    binary: String,
}

impl PdfExtractor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// Whether the configured binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-v")
            .output()
            .is_ok()
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

/// Split `pdftotext` output into one unit per non-blank page.
pub fn units_from_pages(text: &str, source: &str) -> Vec<RawUnit> {
    text.split(PAGE_BREAK)
        .enumerate()
        .filter_map(|(idx, page)| {
            let page_text = page.trim();
            if page_text.is_empty() {
                return None;
            }
            Some(RawUnit {
                text: page_text.to_string(),
                source_ref: SourceRef::page(source, idx as u32 + 1),
            })
        })
        .collect()
}

impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn supports(&self, path: &Path) -> bool {
        extension(path).as_deref() == Some("pdf")
    }

    fn extract(&self, path: &Path) -> Result<Vec<RawUnit>, IngestError> {
        let output = Command::new(&self.binary)
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| IngestError::Extraction {
                path: path.to_path_buf(),
                reason: format!("failed to run {}: {e} (is poppler installed?)", self.binary),
            })?;

        if !output.status.success() {
            return Err(IngestError::Extraction {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let units = units_from_pages(&text, &file_name(path));
        debug!(file = %path.display(), pages = units.len(), "Extracted PDF pages");
        Ok(units)
    }
}
