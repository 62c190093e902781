//! ContextRetriever: composite query, top-k search, bounded assembly.
//!
//! The assembled context never exceeds its character ceiling. Each chunk gets
//! a fair share of the ceiling (never less than the content floor), and a
//! chunk that would overflow the ceiling is dropped whole rather than cut
//! again, so every included entry keeps its source label. Retrieval failures
//! never reach the caller; they become a diagnostic context string.

use crate::catalogue::RiskCatalogue;
use async_trait::async_trait;
use riskiq_core::document::{Chunk, SourceRef};
use riskiq_core::error::IndexError;
use riskiq_core::risk::{CompanyProfile, RiskAnswer, RiskTableRow};
use riskiq_core::text::{char_len, truncate_chars};
use riskiq_index::VectorIndex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Separator placed between two rendered entries.
pub const ENTRY_SEPARATOR: &str = "\n\n";
/// Characters each entry spends beyond its label and content: the newline
/// after the label plus its share of the separator.
pub const ENTRY_OVERHEAD: usize = 3;

const PROFILE_FIELD_CHARS: usize = 150;
const ANSWER_EXCERPT_CHARS: usize = 100;
const KEY_RISK_AREAS: usize = 3;
const ANSWER_EXCERPTS: usize = 3;

/// Anything that can return the chunks nearest to a query, nearest first.
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Chunk>, IndexError>;
}

#[async_trait]
impl ContextSource for VectorIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Chunk>, IndexError> {
        let hits = self.query(query, k).await?;
        Ok(hits.into_iter().map(|hit| hit.entry.chunk).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedEntry {
    pub source_ref: SourceRef,
    pub text: String,
}

impl RetrievedEntry {
    fn render(&self) -> String {
        format!("{}\n{}", self.source_ref.label(), self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalResult {
    pub entries: Vec<RetrievedEntry>,
    /// Set instead of entries when retrieval failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    #[serde(skip)]
    pub query: String,
}

impl RetrievalResult {
    /// The context string handed to the prompt assembler.
    pub fn render(&self) -> String {
        if let Some(diagnostic) = &self.diagnostic {
            return diagnostic.clone();
        }
        self.entries
            .iter()
            .map(RetrievedEntry::render)
            .collect::<Vec<_>>()
            .join(ENTRY_SEPARATOR)
    }

    pub fn sources(&self) -> Vec<SourceRef> {
        self.entries.iter().map(|e| e.source_ref.clone()).collect()
    }
}

pub struct ContextRetriever {
    source: Arc<dyn ContextSource>,
    catalogue: Arc<RiskCatalogue>,
    top_k: usize,
    min_chunk_chars: usize,
}

impl ContextRetriever {
    pub fn new(
        source: Arc<dyn ContextSource>,
        catalogue: Arc<RiskCatalogue>,
        top_k: usize,
        min_chunk_chars: usize,
    ) -> Self {
        Self { source, catalogue, top_k: top_k.max(1), min_chunk_chars }
    }

    /// Context for an assessment: profile, answers and the weakest areas.
    pub async fn retrieve(
        &self,
        profile: &CompanyProfile,
        answers: &[RiskAnswer],
        risk_table: &[RiskTableRow],
        max_total_chars: usize,
    ) -> RetrievalResult {
        let query = self.build_query(profile, answers, risk_table);
        self.search_and_assemble(query, max_total_chars).await
    }

    /// Context for a free-form question.
    pub async fn retrieve_for_question(&self, question: &str, max_total_chars: usize) -> RetrievalResult {
        self.search_and_assemble(question.trim().to_string(), max_total_chars).await
    }

    pub fn build_query(&self, profile: &CompanyProfile, answers: &[RiskAnswer], risk_table: &[RiskTableRow]) -> String {
        let mut lines = Vec::new();
        let mut push = |label: &str, value: &str| {
            if !value.trim().is_empty() {
                lines.push(format!("{label}: {}", value.trim()));
            }
        };
        push("Industry", profile.industry.as_str());
        push("Company size", profile.size.as_str());
        push("Technology adoption", profile.tech_adoption.as_str());
        push("Security controls", truncate_chars(profile.security_controls.trim(), PROFILE_FIELD_CHARS));
        push("Risk posture", truncate_chars(profile.risk_posture.trim(), PROFILE_FIELD_CHARS));
        push("Emerging technologies", profile.emerging_technologies.join(", ").as_str());

        let mut weakest: Vec<&RiskTableRow> = risk_table.iter().collect();
        weakest.sort_by_key(|row| {
            (row.score, self.catalogue.position(&row.category_id).unwrap_or(usize::MAX))
        });
        for row in weakest.into_iter().take(KEY_RISK_AREAS) {
            let focus = self
                .catalogue
                .get(&row.category_id)
                .map(|c| c.scoring_focus.as_str())
                .unwrap_or_default();
            lines.push(format!("Key risk area: {} ({focus})", row.category_name));
        }

        for answer in answers.iter().filter(|a| !a.is_blank()).take(ANSWER_EXCERPTS) {
            lines.push(format!("Answer: {}", truncate_chars(answer.answer_text.trim(), ANSWER_EXCERPT_CHARS)));
        }
        lines.join("\n")
    }

    async fn search_and_assemble(&self, query: String, max_total_chars: usize) -> RetrievalResult {
        match self.source.search(&query, self.top_k).await {
            Ok(chunks) => {
                let entries = assemble(&chunks, max_total_chars, self.min_chunk_chars);
                debug!(hits = chunks.len(), included = entries.len(), max_total_chars, "Context retrieved");
                RetrievalResult { entries, diagnostic: None, query }
            }
            Err(e) => {
                warn!(error = %e, "Context retrieval failed; continuing without context");
                let diagnostic = format!("[Context unavailable: retrieval failed ({e})]");
                RetrievalResult {
                    entries: Vec::new(),
                    diagnostic: Some(truncate_chars(&diagnostic, max_total_chars).to_string()),
                    query,
                }
            }
        }
    }
}

/// Fit `chunks` (nearest first) under `max_total_chars`.
pub fn assemble(chunks: &[Chunk], max_total_chars: usize, min_chunk_chars: usize) -> Vec<RetrievedEntry> {
    if chunks.is_empty() {
        return Vec::new();
    }
    let fair_share = max_total_chars / chunks.len();
    let mut entries = Vec::new();
    let mut total = 0usize;

    for chunk in chunks {
        let label_len = char_len(&chunk.source_ref.label());
        let allowance = fair_share
            .saturating_sub(label_len + ENTRY_OVERHEAD)
            .max(min_chunk_chars);
        let text = truncate_chars(&chunk.text, allowance);

        let separator = if entries.is_empty() { 0 } else { char_len(ENTRY_SEPARATOR) };
        let cost = separator + label_len + 1 + char_len(text);
        if total + cost > max_total_chars {
            break;
        }
        total += cost;
        entries.push(RetrievedEntry { source_ref: chunk.source_ref.clone(), text: text.to_string() });
    }
    entries
}
