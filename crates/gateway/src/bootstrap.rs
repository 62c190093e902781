//! Startup wiring shared by the server and the CLI: provider, embedder,
//! corpus, vector index and assessment service, all from one `AppConfig`.

use riskiq_assessment::AssessmentService;
use riskiq_config::AppConfig;
use riskiq_core::error::Error;
use riskiq_index::{Corpus, VectorIndex};
use riskiq_ingest::DocumentIngester;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Pipeline {
    pub service: Arc<AssessmentService>,
    pub index: Arc<VectorIndex>,
    pub corpus: Corpus,
}

pub fn corpus(config: &AppConfig) -> Corpus {
    let ingester = Arc::new(DocumentIngester::from_config(&config.corpus));
    Corpus::new(ingester, &config.corpus.data_dir)
}

/// Load the persisted index, building or self-healing it from the corpus as needed.
pub async fn open_index(config: &AppConfig) -> Result<(Arc<VectorIndex>, Corpus), Error> {
    let providers = riskiq_providers::build_from_config(config);
    let embedder = riskiq_providers::build_embedder(config, &providers)?;
    let corpus = corpus(config);
    let index = VectorIndex::open(&config.index.path, embedder, config.index.batch_size, &corpus).await?;
    Ok((Arc::new(index), corpus))
}

/// Everything needed to serve assessments.
pub async fn build_pipeline(config: &AppConfig) -> Result<Pipeline, Error> {
    let providers = riskiq_providers::build_from_config(config);
    let provider = providers.default().ok_or_else(|| Error::Config {
        message: format!("default provider '{}' is not available", config.default_provider),
    })?;
    if !config.has_api_key() && config.default_provider != "ollama" {
        warn!(provider = %config.default_provider, "No API key configured; generation requests will fail");
    }

    let (index, corpus) = open_index(config).await?;
    let service = AssessmentService::from_config(config, index.clone(), provider)?;
    let chunks = index.len().await;
    info!(
        chunks,
        categories = service.categories().len(),
        model = %config.default_model,
        "Assessment pipeline ready"
    );
    Ok(Pipeline { service: Arc::new(service), index, corpus })
}
