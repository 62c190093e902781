//! End-to-end integration tests for the riskiq pipeline.
//!
//! These tests run the full path from a corpus folder to an assessment
//! report: ingestion, hashing embeddings, the persisted vector index
//! (including self-healing), retrieval, prompt budgeting, a scripted model
//! and response parsing.

use std::sync::{Arc, Mutex};

use riskiq_assessment::{AssessmentService, RiskCatalogue, ServiceSettings};
use riskiq_config::{AppConfig, CorpusConfig};
use riskiq_core::document::Locator;
use riskiq_core::error::ProviderError;
use riskiq_core::message::Message;
use riskiq_core::provider::{Provider, ProviderRequest, ProviderResponse};
use riskiq_core::risk::{CompanyProfile, RiskAnswer};
use riskiq_core::text::char_len;
use riskiq_index::{Corpus, VectorIndex, store};
use riskiq_ingest::DocumentIngester;
use riskiq_providers::HashEmbedder;

// ── Mock Provider ────────────────────────────────────────────────────────

/// Returns scripted responses in order and keeps every prompt it was sent.
struct ScriptedProvider {
    responses: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompt(&self, n: usize) -> String {
        self.prompts.lock().unwrap()[n].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);
        let text = self.responses.lock().unwrap().pop().expect("ScriptedProvider exhausted");
        Ok(ProviderResponse { message: Message::assistant(text), usage: None, model: request.model })
    }
}

// ── Corpus fixture ───────────────────────────────────────────────────────

fn attack_pattern(id: &str, name: &str, description: &str, revoked: bool) -> serde_json::Value {
    serde_json::json!({
        "type": "attack-pattern",
        "name": name,
        "description": description,
        "revoked": revoked,
        "x_mitre_platforms": ["Windows", "Linux"],
        "kill_chain_phases": [{"kill_chain_name": "mitre-attack", "phase_name": "initial-access"}],
        "external_references": [{"source_name": "mitre-attack", "external_id": id}]
    })
}

fn write_corpus(dir: &std::path::Path) {
    let bundle = serde_json::json!({
        "type": "bundle",
        "objects": [
            attack_pattern("T1566", "Phishing", "Adversaries send phishing emails with malicious attachments to gain access.", false),
            attack_pattern("T1078", "Valid Accounts", "Adversaries obtain credentials of existing accounts to bypass access controls.", false),
            attack_pattern("T1486", "Data Encrypted for Impact", "Adversaries encrypt data on target systems to interrupt availability, as ransomware does.", false),
            attack_pattern("T9999", "Retired Technique", "This technique was revoked.", true),
            {"type": "malware", "name": "NotATechnique"}
        ]
    });
    std::fs::write(dir.join("enterprise-attack.json"), bundle.to_string()).unwrap();
    std::fs::write(dir.join("notes.docx"), b"unsupported format").unwrap();
}

fn corpus(dir: &std::path::Path) -> Corpus {
    Corpus::new(Arc::new(DocumentIngester::from_config(&CorpusConfig::default())), dir)
}

const ADVICE: &str = r#"Based on the context:
{"recommendations":["Run phishing simulations quarterly","Enforce MFA on all accounts"],"resources":[{"title":"MITRE ATT&CK T1566","url":"https://attack.mitre.org/techniques/T1566/"}],"rawLLMOutput":"Phishing is the main exposure."}"#;

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_skips_revoked_and_unsupported() {
    let docs = tempfile::tempdir().unwrap();
    write_corpus(docs.path());

    let chunks = DocumentIngester::from_config(&CorpusConfig::default()).ingest(docs.path()).unwrap();
    let ids: Vec<String> = chunks
        .iter()
        .filter_map(|c| match &c.source_ref.locator {
            Locator::Technique { technique_id } => technique_id.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(ids, vec!["T1566", "T1078", "T1486"]);
    assert!(chunks.iter().all(|c| c.source_ref.source == "MITRE ATT&CK"));
    assert!(chunks[0].text.starts_with("Name: Phishing\nID: T1566"));
    assert!(chunks.iter().all(|c| char_len(&c.text) <= 500));
}

#[tokio::test]
async fn index_builds_queries_and_self_heals() {
    let docs = tempfile::tempdir().unwrap();
    let db = tempfile::tempdir().unwrap();
    write_corpus(docs.path());
    let corpus = corpus(docs.path());
    let embedder = Arc::new(HashEmbedder::new(256));

    let index = VectorIndex::open(db.path(), embedder.clone(), 8, &corpus).await.unwrap();
    assert_eq!(index.len().await, 3);
    let hits = index.query("phishing emails malicious attachments", 1).await.unwrap();
    assert_eq!(
        hits[0].entry.chunk.source_ref.locator,
        Locator::Technique { technique_id: Some("T1566".into()) }
    );
    drop(index);

    std::fs::write(store::manifest_path(db.path()), "{ not json").unwrap();
    let healed = VectorIndex::load(db.path(), embedder, 8, &corpus).await.unwrap();
    assert_eq!(healed.len().await, 3);
    let hits = healed.query("phishing emails malicious attachments", 1).await.unwrap();
    assert_eq!(
        hits[0].entry.chunk.source_ref.locator,
        Locator::Technique { technique_id: Some("T1566".into()) }
    );
    assert_eq!(store::read_manifest(db.path()).unwrap().chunk_count, 3);
}

#[tokio::test]
async fn empty_corpus_is_fatal() {
    let docs = tempfile::tempdir().unwrap();
    let db = tempfile::tempdir().unwrap();
    std::fs::write(docs.path().join("readme.txt"), "nothing extractable").unwrap();

    let result = VectorIndex::open(db.path(), Arc::new(HashEmbedder::new(64)), 8, &corpus(docs.path())).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn assessment_end_to_end() {
    let docs = tempfile::tempdir().unwrap();
    let db = tempfile::tempdir().unwrap();
    write_corpus(docs.path());

    let index = VectorIndex::open(db.path(), Arc::new(HashEmbedder::default()), 32, &corpus(docs.path()))
        .await
        .unwrap();
    let provider = Arc::new(ScriptedProvider::new(&[ADVICE]));
    let settings = ServiceSettings { tailor_questions: false, ..ServiceSettings::default() };
    let service = AssessmentService::new(
        Arc::new(RiskCatalogue::builtin().unwrap()),
        Arc::new(index),
        provider.clone(),
        settings,
    );

    let profile = CompanyProfile {
        industry: "Finance".into(),
        size: "Medium".into(),
        security_controls: "Email filtering, no phishing training".into(),
        ..Default::default()
    };
    let start = service.initialize_assessment(profile).await.unwrap();
    assert!(start.questions.len() >= 20);
    let regulatory = start.questions.iter().find(|q| q.id == "regulatory_compliance").unwrap();
    assert!(regulatory.question_text.contains("PCI-DSS"));

    let answers = vec![
        RiskAnswer::new("identity_access", "We have comprehensive, fully implemented MFA and RBAC across all systems"),
        RiskAnswer::new("security_awareness", "None, staff receive no phishing training"),
    ];
    let report = service.submit_answers(&start.session_id, answers).await.unwrap();

    assert_eq!(report.recommendations[0], "Run phishing simulations quarterly");
    assert_eq!(report.resources[0].url, "https://attack.mitre.org/techniques/T1566/");
    assert_eq!(report.summary, "Phishing is the main exposure.");
    let access = report.risk_table.iter().find(|r| r.category_id == "identity_access").unwrap();
    assert_eq!(access.score, access.max_score);

    let prompt = provider.prompt(0);
    assert!(char_len(&prompt) <= AppConfig::default().prompt.max_prompt_chars);
    assert!(prompt.contains("[Source: MITRE ATT&CK, T"));
}

#[tokio::test]
async fn second_session_does_not_see_first_profile() {
    let docs = tempfile::tempdir().unwrap();
    let db = tempfile::tempdir().unwrap();
    write_corpus(docs.path());
    let index = VectorIndex::open(db.path(), Arc::new(HashEmbedder::default()), 32, &corpus(docs.path()))
        .await
        .unwrap();
    let provider = Arc::new(ScriptedProvider::new(&[ADVICE, ADVICE]));
    let service = AssessmentService::new(
        Arc::new(RiskCatalogue::builtin().unwrap()),
        Arc::new(index),
        provider.clone(),
        ServiceSettings { tailor_questions: false, ..ServiceSettings::default() },
    );

    let health = service
        .initialize_assessment(CompanyProfile { industry: "Healthcare".into(), ..Default::default() })
        .await
        .unwrap();
    let retail = service
        .initialize_assessment(CompanyProfile { industry: "Retail".into(), ..Default::default() })
        .await
        .unwrap();

    service.submit_answers(&retail.session_id, vec![]).await.unwrap();
    service.submit_answers(&health.session_id, vec![]).await.unwrap();
    assert!(provider.prompt(0).contains("Industry: Retail"));
    assert!(provider.prompt(1).contains("Industry: Healthcare"));
}
