//! On-disk layout of a persisted index.
//!
//! ```text
//! <index dir>/
//!   chunks.jsonl    one EmbeddedChunk per line
//!   manifest.json   written last; its presence marks a complete store
//! ```
//!
//! A store without a manifest does not exist. A manifest that cannot be
//! parsed, or that disagrees with `chunks.jsonl`, marks the store corrupted.

use chrono::{DateTime, Utc};
use riskiq_core::document::EmbeddedChunk;
use riskiq_core::error::IndexError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CHUNKS_FILE: &str = "chunks.jsonl";
pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub embedding_model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

fn corrupted(dir: &Path, reason: impl Into<String>) -> IndexError {
    IndexError::Corrupted { path: dir.to_path_buf(), reason: reason.into() }
}

fn storage(context: &str, e: impl std::fmt::Display) -> IndexError {
    IndexError::Storage(format!("{context}: {e}"))
}

/// Read only the manifest (used by status/doctor).
pub fn read_manifest(dir: &Path) -> Result<Manifest, IndexError> {
    let path = manifest_path(dir);
    if !path.exists() {
        return Err(IndexError::NotFound(dir.to_path_buf()));
    }
    let content = std::fs::read_to_string(&path).map_err(|e| corrupted(dir, e.to_string()))?;
    let manifest: Manifest = serde_json::from_str(&content)
        .map_err(|e| corrupted(dir, format!("unreadable manifest: {e}")))?;
    if manifest.version != STORE_VERSION {
        return Err(corrupted(
            dir,
            format!("store version {} (expected {STORE_VERSION})", manifest.version),
        ));
    }
    Ok(manifest)
}

/// Read and validate a persisted store written by `embedding_model`.
pub fn read(dir: &Path, embedding_model: &str) -> Result<(Manifest, Vec<EmbeddedChunk>), IndexError> {
    let manifest = read_manifest(dir)?;
    if manifest.embedding_model != embedding_model {
        return Err(corrupted(
            dir,
            format!(
                "written by embedding model '{}', current model is '{embedding_model}'",
                manifest.embedding_model
            ),
        ));
    }

    let content = std::fs::read_to_string(dir.join(CHUNKS_FILE))
        .map_err(|e| corrupted(dir, format!("unreadable {CHUNKS_FILE}: {e}")))?;

    let mut entries = Vec::with_capacity(manifest.chunk_count);
    for (line_no, line) in content.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
        let entry: EmbeddedChunk = serde_json::from_str(line)
            .map_err(|e| corrupted(dir, format!("{CHUNKS_FILE} line {}: {e}", line_no + 1)))?;
        if entry.vector.len() != manifest.dimension {
            return Err(corrupted(
                dir,
                format!(
                    "{CHUNKS_FILE} line {} has dimension {} (expected {})",
                    line_no + 1,
                    entry.vector.len(),
                    manifest.dimension
                ),
            ));
        }
        entries.push(entry);
    }

    if entries.len() != manifest.chunk_count {
        return Err(corrupted(
            dir,
            format!("manifest lists {} chunks, found {}", manifest.chunk_count, entries.len()),
        ));
    }

    Ok((manifest, entries))
}

/// Persist a complete store. The old manifest is removed first and the new one
/// written last, so an interrupted write reads back as "no store".
pub fn write(dir: &Path, embedding_model: &str, entries: &[EmbeddedChunk]) -> Result<Manifest, IndexError> {
    std::fs::create_dir_all(dir).map_err(|e| storage("failed to create index directory", e))?;

    let manifest_file = manifest_path(dir);
    if manifest_file.exists() {
        std::fs::remove_file(&manifest_file).map_err(|e| storage("failed to remove old manifest", e))?;
    }

    let file = std::fs::File::create(dir.join(CHUNKS_FILE))
        .map_err(|e| storage("failed to create chunks file", e))?;
    let mut writer = std::io::BufWriter::new(file);
    for entry in entries {
        serde_json::to_writer(&mut writer, entry).map_err(|e| storage("failed to serialize chunk", e))?;
        writer.write_all(b"\n").map_err(|e| storage("failed to write chunks file", e))?;
    }
    writer.flush().map_err(|e| storage("failed to write chunks file", e))?;

    let manifest = Manifest {
        version: STORE_VERSION,
        embedding_model: embedding_model.to_string(),
        dimension: entries.first().map(|e| e.vector.len()).unwrap_or(0),
        chunk_count: entries.len(),
        created_at: Utc::now(),
    };
    let json = serde_json::to_string_pretty(&manifest).map_err(|e| storage("failed to serialize manifest", e))?;
    std::fs::write(&manifest_file, json).map_err(|e| storage("failed to write manifest", e))?;

    Ok(manifest)
}

/// Delete a persisted store entirely.
pub fn remove(dir: &Path) -> Result<(), IndexError> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(|e| storage("failed to delete index directory", e))?;
    }
    Ok(())
}
