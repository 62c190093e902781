//! Configuration loading, validation, and management for riskiq.
//!
//! Loads configuration from `$RISKIQ_CONFIG` or `./riskiq.toml` with
//! environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `riskiq.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Document corpus configuration
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Persisted vector index configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Context retrieval limits
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Prompt budget configuration
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Assessment workflow configuration
    #[serde(default)]
    pub assessment: AssessmentConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1024
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("gateway", &self.gateway)
            .field("corpus", &self.corpus)
            .field("index", &self.index)
            .field("retrieval", &self.retrieval)
            .field("prompt", &self.prompt)
            .field("assessment", &self.assessment)
            .field("providers", &self.providers)
            .finish()
    }
}

/// Connection settings for one LLM provider.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// CORS origins; `*` allows any.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["*".into()]
}
fn default_max_body_bytes() -> usize {
    256 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Folder holding the PDF / XLSX / STIX JSON source documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// `pdftotext` executable used for paginated extraction.
    #[serde(default = "default_pdftotext_bin")]
    pub pdftotext_bin: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/")
}
fn default_pdftotext_bin() -> String {
    "pdftotext".into()
}
fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    50
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            pdftotext_bin: default_pdftotext_bin(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: PathBuf,

    /// `hash` for the local hashing embedder, or the name of a configured provider.
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Vector dimension of the hashing embedder.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Texts per embedding request during a build.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_index_path() -> PathBuf {
    PathBuf::from("vectordb/")
}
fn default_embedding_provider() -> String {
    "hash".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_dimension() -> usize {
    384
}
fn default_batch_size() -> usize {
    32
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            embedding_provider: default_embedding_provider(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Hard ceiling on the retrieved-context string.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Minimum per-chunk content length regardless of the fair-share division.
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
}

fn default_top_k() -> usize {
    3
}
fn default_max_context_chars() -> usize {
    2000
}
fn default_min_chunk_chars() -> usize {
    50
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
            min_chunk_chars: default_min_chunk_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Hard ceiling on the assembled prompt.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// The retrieved context is never shrunk below this many characters.
    #[serde(default = "default_context_floor_chars")]
    pub context_floor_chars: usize,

    #[serde(default = "default_profile_share")]
    pub profile_share: f32,

    #[serde(default = "default_answers_share")]
    pub answers_share: f32,

    #[serde(default = "default_risk_table_share")]
    pub risk_table_share: f32,
}

fn default_max_prompt_chars() -> usize {
    6000
}
fn default_context_floor_chars() -> usize {
    300
}
fn default_profile_share() -> f32 {
    0.2
}
fn default_answers_share() -> f32 {
    0.4
}
fn default_risk_table_share() -> f32 {
    0.4
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
            context_floor_chars: default_context_floor_chars(),
            profile_share: default_profile_share(),
            answers_share: default_answers_share(),
            risk_table_share: default_risk_table_share(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentConfig {
    /// External risk catalogue (TOML). The built-in catalogue is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalogue_path: Option<PathBuf>,

    /// Let the language model rephrase template questions for the profile.
    #[serde(default = "default_true")]
    pub tailor_questions: bool,

    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_true() -> bool {
    true
}
fn default_llm_timeout_secs() -> u64 {
    60
}
fn default_max_sessions() -> usize {
    1000
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            catalogue_path: None,
            tailor_questions: true,
            llm_timeout_secs: default_llm_timeout_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `$RISKIQ_CONFIG` or `./riskiq.toml`, then apply
    /// environment overrides:
    /// - `RISKIQ_API_KEY` / `OPENAI_API_KEY`
    /// - `RISKIQ_PROVIDER`, `RISKIQ_MODEL`
    /// - `RISKIQ_DATA_DIR` / `PDF_DATA_DIR`, `RISKIQ_INDEX_PATH`
    /// - `RISKIQ_MAX_CONTEXT_CHARS`, `RISKIQ_MAX_PROMPT_CHARS`, `RISKIQ_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// The config file consulted by [`AppConfig::load`].
    pub fn config_path() -> PathBuf {
        std::env::var("RISKIQ_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("riskiq.toml"))
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("RISKIQ_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(provider) = lookup("RISKIQ_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("RISKIQ_MODEL") {
            self.default_model = model;
        }
        if let Some(dir) = lookup("RISKIQ_DATA_DIR").or_else(|| lookup("PDF_DATA_DIR")) {
            self.corpus.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("RISKIQ_INDEX_PATH") {
            self.index.path = PathBuf::from(path);
        }
        if let Some(v) = lookup("RISKIQ_MAX_CONTEXT_CHARS") {
            self.retrieval.max_context_chars = parse_env("RISKIQ_MAX_CONTEXT_CHARS", &v)?;
        }
        if let Some(v) = lookup("RISKIQ_MAX_PROMPT_CHARS") {
            self.prompt.max_prompt_chars = parse_env("RISKIQ_MAX_PROMPT_CHARS", &v)?;
        }
        if let Some(v) = lookup("RISKIQ_PORT") {
            self.gateway.port = parse_env("RISKIQ_PORT", &v)?;
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.corpus.chunk_size == 0 {
            return Err(ConfigError::ValidationError("corpus.chunk_size must be > 0".into()));
        }

        if self.corpus.chunk_overlap >= self.corpus.chunk_size {
            return Err(ConfigError::ValidationError(
                "corpus.chunk_overlap must be smaller than corpus.chunk_size".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError("retrieval.top_k must be > 0".into()));
        }

        if self.index.batch_size == 0 || self.index.embedding_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "index.batch_size and index.embedding_dimension must be > 0".into(),
            ));
        }

        let p = &self.prompt;
        if p.profile_share < 0.0 || p.answers_share < 0.0 || p.risk_table_share < 0.0 {
            return Err(ConfigError::ValidationError("prompt shares must not be negative".into()));
        }
        if p.profile_share + p.answers_share + p.risk_table_share <= 0.0 {
            return Err(ConfigError::ValidationError("prompt shares must sum to > 0".into()));
        }

        if p.max_prompt_chars < p.context_floor_chars {
            return Err(ConfigError::ValidationError(
                "prompt.max_prompt_chars must be >= prompt.context_floor_chars".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key} has an invalid value: '{value}'")))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            gateway: GatewayConfig::default(),
            corpus: CorpusConfig::default(),
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
            prompt: PromptConfig::default(),
            assessment: AssessmentConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
