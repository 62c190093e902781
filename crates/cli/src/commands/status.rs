//! `riskiq status`: Show the effective configuration.

use riskiq_config::AppConfig;
use riskiq_index::store;

pub fn run(config: &AppConfig) {
    println!("riskiq status");
    println!("=============");
    println!("  Config file:   {}", AppConfig::config_path().display());
    println!("  Provider:      {}", config.default_provider);
    println!("  Model:         {}", config.default_model);
    println!("  Temperature:   {}", config.default_temperature);
    println!("  API key:       {}", if config.has_api_key() { "configured" } else { "missing" });
    println!("  Corpus:        {}", config.corpus.data_dir.display());
    println!("  Chunking:      {} chars, {} overlap", config.corpus.chunk_size, config.corpus.chunk_overlap);
    println!("  Index:         {}", config.index.path.display());
    println!("  Embedding:     {} ({})", config.index.embedding_provider, config.index.embedding_model);
    println!("  Retrieval:     top {} within {} chars", config.retrieval.top_k, config.retrieval.max_context_chars);
    println!("  Prompt budget: {} chars", config.prompt.max_prompt_chars);
    println!(
        "  Catalogue:     {}",
        config
            .assessment
            .catalogue_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".into())
    );
    println!("  Gateway:       {}:{}", config.gateway.host, config.gateway.port);

    match store::read_manifest(&config.index.path) {
        Ok(manifest) => println!(
            "\n  Index manifest: {} chunks, {} ({})",
            manifest.chunk_count,
            manifest.embedding_model,
            manifest.created_at.to_rfc3339()
        ),
        Err(e) => println!("\n  Index manifest: {e}"),
    }
}
