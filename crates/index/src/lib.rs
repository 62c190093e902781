//! Vector index for riskiq.
//!
//! Embeds chunks, persists them under a directory (`manifest.json` +
//! `chunks.jsonl`), answers nearest-neighbour queries, and rebuilds itself from
//! the corpus when the persisted store is corrupted or was written by a
//! different embedding model.

pub mod corpus;
pub mod index;
pub mod store;
pub mod vector;

pub use corpus::Corpus;
pub use index::{SearchHit, VectorIndex};
pub use store::Manifest;
pub use vector::cosine_similarity;
