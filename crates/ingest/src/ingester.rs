//! DocumentIngester: folder in, chunks out.
//!
//! Partial-failure tolerant: an unsupported file is skipped with an info log,
//! a file whose extraction fails is skipped with a warning. Only a missing
//! folder or a folder with nothing extractable is an error.

use crate::extractor::Extractor;
use crate::pdf::PdfExtractor;
use crate::spreadsheet::SpreadsheetExtractor;
use crate::splitter::Splitter;
use crate::stix::StixExtractor;
use riskiq_config::CorpusConfig;
use riskiq_core::document::Chunk;
use riskiq_core::error::IngestError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct DocumentIngester {
    extractors: Vec<Box<dyn Extractor>>,
    splitter: Splitter,
}

impl DocumentIngester {
    /// An ingester with no extractors registered.
    pub fn new(splitter: Splitter) -> Self {
        Self { extractors: Vec::new(), splitter }
    }

    /// Register an extractor. The first extractor that supports a file wins.
    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    /// The standard set: PDF, spreadsheet, STIX JSON.
    pub fn from_config(config: &CorpusConfig) -> Self {
        Self::new(Splitter::new(config.chunk_size, config.chunk_overlap))
            .with_extractor(PdfExtractor::new(&config.pdftotext_bin))
            .with_extractor(SpreadsheetExtractor)
            .with_extractor(StixExtractor)
    }

    pub fn splitter(&self) -> &Splitter {
        &self.splitter
    }

    /// Ingest every file directly inside `folder`, in file-name order.
    pub fn ingest(&self, folder: &Path) -> Result<Vec<Chunk>, IngestError> {
        if !folder.is_dir() {
            return Err(IngestError::FolderNotFound(folder.to_path_buf()));
        }

        let mut chunks = Vec::new();
        let (mut processed, mut skipped, mut failed) = (0usize, 0usize, 0usize);

        for path in list_files(folder)? {
            let Some(extractor) = self.extractors.iter().find(|e| e.supports(&path)) else {
                info!(file = %path.display(), "Ignored unsupported file");
                skipped += 1;
                continue;
            };

            match extractor.extract(&path) {
                Ok(units) if units.is_empty() => {
                    debug!(file = %path.display(), extractor = extractor.name(), "No text extracted");
                    skipped += 1;
                }
                Ok(units) => {
                    let file_chunks = self.splitter.split(&units);
                    debug!(
                        file = %path.display(),
                        extractor = extractor.name(),
                        units = units.len(),
                        chunks = file_chunks.len(),
                        "Ingested file"
                    );
                    chunks.extend(file_chunks);
                    processed += 1;
                }
                Err(e) => {
                    warn!(file = %path.display(), extractor = extractor.name(), error = %e, "Error processing file");
                    failed += 1;
                }
            }
        }

        info!(
            folder = %folder.display(),
            processed,
            skipped,
            failed,
            chunks = chunks.len(),
            "Ingestion finished"
        );

        if chunks.is_empty() {
            return Err(IngestError::NoDocuments(folder.to_path_buf()));
        }
        Ok(chunks)
    }
}

fn list_files(folder: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let entries = std::fs::read_dir(folder).map_err(|e| IngestError::Read {
        path: folder.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}
