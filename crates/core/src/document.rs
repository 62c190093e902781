//! Corpus document model: raw extracted units, chunks, and embedded chunks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where inside a source a piece of text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// 1-based page of a paginated document.
    Page { page: u32 },
    /// 0-based data row of a spreadsheet (header excluded).
    Row { row_index: u32 },
    /// A threat-intelligence technique, e.g. `T1566`.
    Technique { technique_id: Option<String> },
}

/// Traceable origin of a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// File name, or a fixed source name such as `MITRE ATT&CK`.
    pub source: String,
    pub locator: Locator,
}

impl SourceRef {
    pub fn page(source: impl Into<String>, page: u32) -> Self {
        Self { source: source.into(), locator: Locator::Page { page } }
    }

    pub fn row(source: impl Into<String>, row_index: u32) -> Self {
        Self { source: source.into(), locator: Locator::Row { row_index } }
    }

    pub fn technique(source: impl Into<String>, technique_id: Option<String>) -> Self {
        Self { source: source.into(), locator: Locator::Technique { technique_id } }
    }

    /// Label prefixed to retrieved context, e.g. `[Source: policy.pdf, page 3]`.
    pub fn label(&self) -> String {
        format!("[Source: {self}]")
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locator {
            Locator::Page { page } => write!(f, "{}, page {page}", self.source),
            Locator::Row { row_index } => write!(f, "{}, row {row_index}", self.source),
            Locator::Technique { technique_id: Some(id) } => write!(f, "{}, {id}", self.source),
            Locator::Technique { technique_id: None } => write!(f, "{}", self.source),
        }
    }
}

/// One unit of extracted text before splitting (a page, a row, a technique).
#[derive(Debug, Clone, PartialEq)]
pub struct RawUnit {
    pub text: String,
    pub source_ref: SourceRef,
}

/// A bounded, overlapping window over a raw unit's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source_ref: SourceRef,
    /// Position of this chunk among all chunks of the same source file.
    pub sequence_index: u32,
}

/// A chunk and its embedding vector. Owned by the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_name_the_locator() {
        assert_eq!(SourceRef::page("nist.pdf", 3).label(), "[Source: nist.pdf, page 3]");
        assert_eq!(SourceRef::row("controls.xlsx", 0).label(), "[Source: controls.xlsx, row 0]");
        assert_eq!(
            SourceRef::technique("MITRE ATT&CK", Some("T1566".into())).label(),
            "[Source: MITRE ATT&CK, T1566]"
        );
        assert_eq!(SourceRef::technique("MITRE ATT&CK", None).label(), "[Source: MITRE ATT&CK]");
    }

    #[test]
    fn locator_is_tagged_in_json() {
        let json = serde_json::to_value(SourceRef::row("a.xlsx", 4)).unwrap();
        assert_eq!(json["locator"]["kind"], "row");
        assert_eq!(json["locator"]["row_index"], 4);
    }
}
