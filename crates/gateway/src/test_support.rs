//! Ready-made gateway state backed by scripted collaborators.

use crate::{AppState, SharedState};
use async_trait::async_trait;
use riskiq_assessment::{AssessmentService, ContextSource, RiskCatalogue, ServiceSettings};
use riskiq_config::{AppConfig, CorpusConfig};
use riskiq_core::document::{Chunk, SourceRef};
use riskiq_core::error::{IndexError, ProviderError};
use riskiq_core::message::Message;
use riskiq_core::provider::{Provider, ProviderRequest, ProviderResponse};
use riskiq_index::{Corpus, VectorIndex};
use riskiq_ingest::DocumentIngester;
use riskiq_providers::HashEmbedder;
use std::path::Path;
use std::sync::{Arc, Mutex};

struct ScriptedProvider(Mutex<Vec<String>>);

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let next = self.0.lock().unwrap().pop();
        match next {
            Some(text) => Ok(ProviderResponse { message: Message::assistant(text), usage: None, model: request.model }),
            None => Err(ProviderError::ApiError { status_code: 500, message: "script exhausted".into() }),
        }
    }
}

struct RateLimitedProvider;

#[async_trait]
impl Provider for RateLimitedProvider {
    fn name(&self) -> &str {
        "rate_limited"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::RateLimited { retry_after_secs: 30 })
    }
}

struct Handbook;

#[async_trait]
impl ContextSource for Handbook {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<Chunk>, IndexError> {
        Ok((1..=3u32)
            .take(k)
            .map(|page| Chunk {
                id: format!("handbook-{page}"),
                text: format!("Handbook page {page}: remote access requires MFA."),
                source_ref: SourceRef::page("handbook.pdf", page),
                sequence_index: page - 1,
            })
            .collect())
    }
}

async fn state_with(provider: Arc<dyn Provider>) -> SharedState {
    let config = AppConfig::default();
    let settings = ServiceSettings { tailor_questions: false, ..ServiceSettings::from_config(&config) };
    let catalogue = Arc::new(RiskCatalogue::builtin().unwrap());
    let service = AssessmentService::new(catalogue, Arc::new(Handbook), provider, settings);
    let state = Arc::new(AppState::new(config));
    state.mark_ready(Arc::new(service), 3).await;
    state
}

/// Ready state whose provider answers with `responses`, in order.
pub async fn ready_state(responses: Vec<&str>) -> SharedState {
    let script = responses.into_iter().rev().map(String::from).collect();
    state_with(Arc::new(ScriptedProvider(Mutex::new(script)))).await
}

pub async fn ready_state_with_failing_provider() -> SharedState {
    state_with(Arc::new(RateLimitedProvider)).await
}

/// Write a STIX bundle with one attack pattern per name into `dir`.
pub fn write_stix(dir: &Path, names: &[&str]) {
    let objects: Vec<serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            serde_json::json!({
                "type": "attack-pattern",
                "name": name,
                "description": format!("{name} technique used by adversaries."),
                "external_references": [{"external_id": format!("T{}", 1000 + i)}]
            })
        })
        .collect();
    let bundle = serde_json::json!({"type": "bundle", "objects": objects});
    std::fs::write(dir.join("enterprise-attack.json"), bundle.to_string()).unwrap();
}

/// Build a hash-embedded index over a STIX corpus and attach it to `state`.
pub async fn attach_stix_index(state: &SharedState, corpus_dir: &Path, index_dir: &Path, names: &[&str]) {
    write_stix(corpus_dir, names);
    let corpus = Corpus::new(Arc::new(DocumentIngester::from_config(&CorpusConfig::default())), corpus_dir);
    let index = VectorIndex::open(&index_dir.join("vectordb"), Arc::new(HashEmbedder::new(64)), 8, &corpus)
        .await
        .unwrap();
    assert_eq!(index.len().await, names.len());
    state.attach_index(Arc::new(index), corpus);
}
