//! Scripted providers and context sources for service tests.

use crate::retrieval::ContextSource;
use async_trait::async_trait;
use riskiq_core::document::{Chunk, SourceRef};
use riskiq_core::error::{IndexError, ProviderError};
use riskiq_core::message::Message;
use riskiq_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;
use std::time::Duration;

/// Returns scripted responses in order and records every request.
pub struct ScriptedProvider {
    responses: Mutex<Vec<String>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().map(String::from).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Concatenated message content of the `n`th request.
    pub fn prompt(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Content of the user message of the `n`th request.
    pub fn user_prompt(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n]
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let text = self
            .responses
            .lock()
            .unwrap()
            .pop()
            .expect("ScriptedProvider: no more responses");
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 }),
            model,
        })
    }
}

pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::ApiError { status_code: 500, message: "upstream exploded".into() })
    }
}

/// Never answers within any reasonable timeout.
pub struct SlowProvider;

#[async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ProviderResponse { message: Message::assistant("late"), usage: None, model: request.model })
    }
}

pub struct StaticSource(pub Vec<Chunk>);

impl StaticSource {
    pub fn policy_pages(n: u32) -> Self {
        Self(
            (1..=n)
                .map(|page| Chunk {
                    id: format!("policy-{page}"),
                    text: format!("Policy page {page}: enforce MFA for all remote access. {}", "Detail. ".repeat(100)),
                    source_ref: SourceRef::page("policy.pdf", page),
                    sequence_index: page - 1,
                })
                .collect(),
        )
    }
}

#[async_trait]
impl ContextSource for StaticSource {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<Chunk>, IndexError> {
        Ok(self.0.iter().take(k).cloned().collect())
    }
}

pub struct BrokenSource;

#[async_trait]
impl ContextSource for BrokenSource {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<Chunk>, IndexError> {
        Err(IndexError::Empty)
    }
}
