//! VectorIndex: build, load, self-heal, query.
//!
//! Entries live behind a `tokio::sync::RwLock`. A rebuild embeds the new
//! corpus without holding the lock and swaps the result in under the write
//! lock, so concurrent queries see either the old index or the new one, never
//! a partial one. A separate mutex serializes rebuilds.

use crate::corpus::Corpus;
use crate::store::{self, Manifest};
use crate::vector;
use riskiq_core::document::{Chunk, EmbeddedChunk};
use riskiq_core::embedding::Embedder;
use riskiq_core::error::{IndexError, ProviderError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// A ranked query result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub entry: EmbeddedChunk,
    pub score: f32,
}

struct Loaded {
    manifest: Manifest,
    entries: Vec<EmbeddedChunk>,
}

pub struct VectorIndex {
    path: PathBuf,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    state: RwLock<Loaded>,
    rebuild_lock: Mutex<()>,
}

impl VectorIndex {
    fn from_loaded(path: &Path, embedder: Arc<dyn Embedder>, batch_size: usize, loaded: Loaded) -> Self {
        Self {
            path: path.to_path_buf(),
            embedder,
            batch_size: batch_size.max(1),
            state: RwLock::new(loaded),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Embed `chunks` and persist them at `path`, replacing any existing store.
    pub async fn build(
        path: &Path,
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
        chunks: Vec<Chunk>,
    ) -> Result<Self, IndexError> {
        let loaded = embed_and_persist(path, embedder.as_ref(), batch_size.max(1), chunks).await?;
        Ok(Self::from_loaded(path, embedder, batch_size, loaded))
    }

    /// Reopen the store at `path`.
    ///
    /// Returns `NotFound` when nothing has been persisted. A store that is
    /// present but corrupted (or written by another embedding model) is
    /// deleted and rebuilt from `corpus`; if the corpus yields nothing, the
    /// rebuild error is returned.
    pub async fn load(
        path: &Path,
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
        corpus: &Corpus,
    ) -> Result<Self, IndexError> {
        match store::read(path, embedder.model()) {
            Ok((manifest, entries)) => {
                info!(
                    path = %path.display(),
                    chunks = entries.len(),
                    model = %manifest.embedding_model,
                    "Loaded persisted vector index"
                );
                Ok(Self::from_loaded(path, embedder, batch_size, Loaded { manifest, entries }))
            }
            Err(IndexError::Corrupted { reason, .. }) => {
                warn!(
                    path = %path.display(),
                    %reason,
                    corpus = %corpus.dir().display(),
                    "Vector index unusable, rebuilding from source documents"
                );
                store::remove(path)?;
                let chunks = corpus.chunks().await?;
                Self::build(path, embedder, batch_size, chunks).await
            }
            Err(e) => Err(e),
        }
    }

    /// Load the persisted index, or build it from `corpus` if none exists.
    pub async fn open(
        path: &Path,
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
        corpus: &Corpus,
    ) -> Result<Self, IndexError> {
        match Self::load(path, Arc::clone(&embedder), batch_size, corpus).await {
            Err(IndexError::NotFound(_)) => {
                info!(
                    path = %path.display(),
                    corpus = %corpus.dir().display(),
                    "No vector index found, ingesting and embedding documents"
                );
                let chunks = corpus.chunks().await?;
                Self::build(path, embedder, batch_size, chunks).await
            }
            other => other,
        }
    }

    /// Re-ingest `corpus` and atomically replace the in-memory and persisted index.
    pub async fn rebuild(&self, corpus: &Corpus) -> Result<usize, IndexError> {
        let _guard = self.rebuild_lock.lock().await;
        let chunks = corpus.chunks().await?;
        let loaded = embed_and_persist(&self.path, self.embedder.as_ref(), self.batch_size, chunks).await?;
        let count = loaded.entries.len();
        *self.state.write().await = loaded;
        info!(path = %self.path.display(), chunks = count, "Vector index rebuilt");
        Ok(count)
    }

    /// The `k` chunks nearest to `text`, nearest first; ties keep insertion order.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<SearchHit>, IndexError> {
        let query_vector = self.embedder.embed_one(text).await?;
        let state = self.state.read().await;
        let hits: Vec<SearchHit> = vector::rank(&state.entries, &query_vector, k)
            .into_iter()
            .map(|(i, score)| SearchHit { entry: state.entries[i].clone(), score })
            .collect();
        debug!(k, hits = hits.len(), "Vector query");
        Ok(hits)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn manifest(&self) -> Manifest {
        self.state.read().await.manifest.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn embed_and_persist(
    path: &Path,
    embedder: &dyn Embedder,
    batch_size: usize,
    chunks: Vec<Chunk>,
) -> Result<Loaded, IndexError> {
    if chunks.is_empty() {
        return Err(IndexError::Empty);
    }

    let mut entries = Vec::with_capacity(chunks.len());
    let mut dimension: Option<usize> = None;
    let total = chunks.len();

    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != batch.len() {
            return Err(IndexError::Embedding(ProviderError::Embedding(format!(
                "expected {} vectors, got {}",
                batch.len(),
                vectors.len()
            ))));
        }
        for (chunk, vector) in batch.iter().zip(vectors) {
            let expected = *dimension.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(IndexError::Embedding(ProviderError::Embedding(format!(
                    "inconsistent vector dimension {} (expected {expected})",
                    vector.len()
                ))));
            }
            entries.push(EmbeddedChunk { chunk: chunk.clone(), vector });
        }
        debug!(embedded = entries.len(), total, "Embedding progress");
    }

    let manifest = store::write(path, embedder.model(), &entries)?;
    info!(
        path = %path.display(),
        chunks = manifest.chunk_count,
        dimension = manifest.dimension,
        model = %manifest.embedding_model,
        "Vector index built and persisted"
    );
    Ok(Loaded { manifest, entries })
}
