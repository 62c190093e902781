//! Fixed-size sliding-window splitter.
//!
//! Boundaries are character based, never semantic. Windows advance by
//! `chunk_size - chunk_overlap`, so consecutive chunks of one unit share
//! exactly `chunk_overlap` characters.

use riskiq_core::document::{Chunk, RawUnit};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct Splitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Splitter {
    /// `chunk_overlap` is clamped below `chunk_size`; a zero size becomes 1.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Character windows over one text.
    pub fn windows(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }
        let step = self.chunk_size - self.chunk_overlap;
        let mut windows = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(chars.len());
            windows.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        windows
    }

    /// Split the units of one source file. `sequence_index` runs across all
    /// units in order, so chunk order within a file is preserved.
    pub fn split(&self, units: &[RawUnit]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut sequence_index = 0u32;
        for unit in units {
            for window in self.windows(&unit.text) {
                if window.trim().is_empty() {
                    continue;
                }
                chunks.push(Chunk {
                    id: chunk_id(&unit.source_ref.to_string(), sequence_index, &window),
                    text: window,
                    source_ref: unit.source_ref.clone(),
                    sequence_index,
                });
                sequence_index += 1;
            }
        }
        chunks
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new(500, 50)
    }
}

/// Stable content-derived id: same source, position, and text give the same id.
fn chunk_id(source: &str, sequence_index: u32, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(sequence_index.to_le_bytes());
    hasher.update(text.as_bytes());
    hex::encode(&hasher.finalize()[..16])
}
