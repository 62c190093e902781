//! The document folder an index is (re)built from.

use riskiq_core::document::Chunk;
use riskiq_core::error::IndexError;
use riskiq_ingest::DocumentIngester;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A corpus folder plus the ingester that reads it.
#[derive(Clone)]
pub struct Corpus {
    ingester: Arc<DocumentIngester>,
    dir: PathBuf,
}

impl Corpus {
    pub fn new(ingester: Arc<DocumentIngester>, dir: impl Into<PathBuf>) -> Self {
        Self { ingester, dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ingest the folder on a blocking thread.
    pub async fn chunks(&self) -> Result<Vec<Chunk>, IndexError> {
        let ingester = Arc::clone(&self.ingester);
        let dir = self.dir.clone();
        let chunks = tokio::task::spawn_blocking(move || ingester.ingest(&dir))
            .await
            .map_err(|e| IndexError::Storage(format!("ingestion task failed: {e}")))??;
        Ok(chunks)
    }
}
