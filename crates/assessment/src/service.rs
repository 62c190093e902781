//! AssessmentService: orchestrates one request through the pipeline:
//! scoring → retrieval → prompt budgeting → generation → parsing.
//!
//! Generation is fail-fast: a provider error or timeout is returned to the
//! caller as [`AssessmentError::Generation`] without retrying. Everything
//! downstream of a successful generation degrades instead of failing.

use crate::budget::{AssembledPrompt, PromptBlock, PromptBudgetAssembler, PromptTemplate};
use crate::catalogue::RiskCatalogue;
use crate::parser::{Resource, ResponseParser};
use crate::prompts;
use crate::questions;
use crate::render;
use crate::retrieval::{ContextRetriever, ContextSource};
use crate::scoring::{self, RiskLevel, ScoringRules};
use crate::session::SessionStore;
use riskiq_config::{AppConfig, PromptConfig};
use riskiq_core::document::SourceRef;
use riskiq_core::error::{AssessmentError, ProviderError};
use riskiq_core::provider::{Provider, ProviderRequest};
use riskiq_core::risk::{CompanyProfile, RiskAnswer, RiskCategory, RiskQuestion, RiskTableRow};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runtime knobs, usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub llm_timeout: Duration,
    pub top_k: usize,
    pub max_context_chars: usize,
    pub min_chunk_chars: usize,
    pub prompt: PromptConfig,
    pub tailor_questions: bool,
    pub max_sessions: usize,
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.default_model.clone(),
            temperature: config.default_temperature,
            max_tokens: config.default_max_tokens,
            llm_timeout: Duration::from_secs(config.assessment.llm_timeout_secs),
            top_k: config.retrieval.top_k,
            max_context_chars: config.retrieval.max_context_chars,
            min_chunk_chars: config.retrieval.min_chunk_chars,
            prompt: config.prompt.clone(),
            tailor_questions: config.assessment.tailor_questions,
            max_sessions: config.assessment.max_sessions,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentStart {
    pub session_id: String,
    pub questions: Vec<RiskQuestion>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentReport {
    pub session_id: String,
    pub overall_weighted_score: f64,
    pub risk_level: RiskLevel,
    pub risk_table: Vec<RiskTableRow>,
    pub recommendations: Vec<String>,
    pub resources: Vec<Resource>,
    pub data_insights: Vec<String>,
    /// The model's narrative summary, or the full output when it gave none.
    pub summary: String,
    pub raw_model_output: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

pub struct AssessmentService {
    catalogue: Arc<RiskCatalogue>,
    retriever: ContextRetriever,
    provider: Arc<dyn Provider>,
    rules: ScoringRules,
    parser: ResponseParser,
    sessions: SessionStore,
    assessment_template: PromptTemplate,
    ask_template: PromptTemplate,
    tailor_template: PromptTemplate,
    settings: ServiceSettings,
}

impl AssessmentService {
    pub fn new(
        catalogue: Arc<RiskCatalogue>,
        source: Arc<dyn ContextSource>,
        provider: Arc<dyn Provider>,
        settings: ServiceSettings,
    ) -> Self {
        let retriever =
            ContextRetriever::new(source, catalogue.clone(), settings.top_k, settings.min_chunk_chars);
        let rules = catalogue.scoring.clone();
        Self {
            catalogue,
            retriever,
            provider,
            rules,
            parser: ResponseParser::new(),
            sessions: SessionStore::new(settings.max_sessions),
            assessment_template: PromptTemplate::parse(prompts::ASSESSMENT),
            ask_template: PromptTemplate::parse(prompts::ASK),
            tailor_template: PromptTemplate::parse(prompts::TAILOR_QUESTIONS),
            settings,
        }
    }

    /// Build from configuration, loading the catalogue it names.
    pub fn from_config(
        config: &AppConfig,
        source: Arc<dyn ContextSource>,
        provider: Arc<dyn Provider>,
    ) -> Result<Self, AssessmentError> {
        let catalogue = RiskCatalogue::load_or_builtin(config.assessment.catalogue_path.as_deref())?;
        info!(
            categories = catalogue.len(),
            custom = config.assessment.catalogue_path.is_some(),
            "Risk catalogue loaded"
        );
        Ok(Self::new(Arc::new(catalogue), source, provider, ServiceSettings::from_config(config)))
    }

    pub fn categories(&self) -> &[RiskCategory] {
        &self.catalogue.categories
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    /// Step 1: issue a session and one question per catalogue category.
    pub async fn initialize_assessment(&self, profile: CompanyProfile) -> Result<AssessmentStart, AssessmentError> {
        let mut questions = questions::template_questions(&self.catalogue, &profile);

        if self.settings.tailor_questions {
            let prompt = self.assemble(
                &self.tailor_template,
                vec![
                    PromptBlock::share("profile", 1, render::profile(&profile), 0.3),
                    PromptBlock::share("questions", 2, questions::render_for_tailoring(&questions), 0.7),
                ],
            );
            let raw = self.generate(prompts::SYSTEM_ASSESSOR, prompt.text).await?;
            let tailored = questions::apply_tailoring(&mut questions, &raw);
            debug!(tailored, total = questions.len(), "Applied tailored question text");
        }

        let session = self.sessions.create(profile, questions).await;
        info!(session_id = %session.id, questions = session.questions.len(), "Assessment initialized");
        Ok(AssessmentStart { session_id: session.id, questions: session.questions })
    }

    /// Step 2: score the answers and generate recommendations.
    pub async fn submit_answers(
        &self,
        session_id: &str,
        answers: Vec<RiskAnswer>,
    ) -> Result<AssessmentReport, AssessmentError> {
        let session = self.sessions.get(session_id).await?;

        let risk_table = self.rules.score_answers(&self.catalogue, &answers);
        let overall = scoring::overall_score(&self.catalogue, &risk_table);
        let level = RiskLevel::from_score(overall);

        let context = self
            .retriever
            .retrieve(&session.profile, &answers, &risk_table, self.settings.max_context_chars)
            .await;

        let p = &self.settings.prompt;
        let prompt = self.assemble(
            &self.assessment_template,
            vec![
                PromptBlock::shrinkable("context", 0, context.render(), p.context_floor_chars),
                PromptBlock::share("profile", 1, render::profile(&session.profile), p.profile_share),
                PromptBlock::share("answers", 2, render::answers(&self.catalogue, &answers), p.answers_share),
                PromptBlock::share("risk_table", 3, render::risk_table(&risk_table), p.risk_table_share),
            ],
        );

        let raw = self.generate(prompts::SYSTEM_ASSESSOR, prompt.text).await?;
        let advice = self.parser.parse(&raw);

        let mut data_insights = scoring::data_insights(&risk_table, overall, level);
        data_insights.extend(advice.data_insights);

        info!(
            session_id,
            overall_score = overall,
            level = %level,
            recommendations = advice.recommendations.len(),
            "Assessment completed"
        );

        Ok(AssessmentReport {
            session_id: session.id,
            overall_weighted_score: overall,
            risk_level: level,
            risk_table,
            recommendations: advice.recommendations,
            resources: advice.resources,
            data_insights,
            summary: advice.raw_summary,
            raw_model_output: raw,
        })
    }

    /// Free-form question answered from the corpus.
    pub async fn ask(&self, question: &str) -> Result<Answer, AssessmentError> {
        if question.trim().is_empty() {
            return Err(AssessmentError::InvalidInput("question must not be empty".into()));
        }
        let context = self
            .retriever
            .retrieve_for_question(question, self.settings.max_context_chars)
            .await;
        let prompt = self.assemble(
            &self.ask_template,
            vec![
                PromptBlock::shrinkable("context", 0, context.render(), self.settings.prompt.context_floor_chars),
                PromptBlock::share("question", 1, question.trim(), 1.0),
            ],
        );
        let answer = self.generate(prompts::SYSTEM_ADVISOR, prompt.text).await?;
        Ok(Answer { answer: answer.trim().to_string(), sources: context.sources() })
    }

    fn assemble(&self, template: &PromptTemplate, blocks: Vec<PromptBlock>) -> AssembledPrompt {
        PromptBudgetAssembler::new(self.settings.prompt.max_prompt_chars).assemble(template, &blocks)
    }

    async fn generate(&self, system: &str, prompt: String) -> Result<String, AssessmentError> {
        let mut request = ProviderRequest::single_shot(self.settings.model.clone(), Some(system), prompt);
        request.temperature = self.settings.temperature;
        request.max_tokens = Some(self.settings.max_tokens);

        let timeout = self.settings.llm_timeout;
        match tokio::time::timeout(timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => Ok(response.message.content),
            Ok(Err(e)) => {
                warn!(provider = self.provider.name(), error = %e, "Generation failed");
                Err(AssessmentError::Generation(e))
            }
            Err(_) => {
                warn!(provider = self.provider.name(), timeout_secs = timeout.as_secs_f64(), "Generation timed out");
                Err(AssessmentError::Generation(ProviderError::Timeout(format!(
                    "no response within {}s",
                    timeout.as_secs_f64()
                ))))
            }
        }
    }
}
