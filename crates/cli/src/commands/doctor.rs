//! `riskiq doctor`: Diagnose corpus, index, tooling and credentials.

use riskiq_assessment::RiskCatalogue;
use riskiq_config::AppConfig;
use riskiq_index::store;
use riskiq_ingest::PdfExtractor;

pub async fn run(config: &AppConfig) {
    println!("riskiq doctor");
    println!("=============\n");

    let mut issues = 0;

    if AppConfig::config_path().exists() {
        println!("  ok    Config file {}", AppConfig::config_path().display());
    } else {
        println!("  info  No config file at {}; using defaults", AppConfig::config_path().display());
    }

    let data_dir = &config.corpus.data_dir;
    match std::fs::read_dir(data_dir) {
        Ok(entries) => {
            let files = entries.filter_map(Result::ok).filter(|e| e.path().is_file()).count();
            if files == 0 {
                println!("  FAIL  Corpus folder {} is empty", data_dir.display());
                issues += 1;
            } else {
                println!("  ok    Corpus folder {} ({files} files)", data_dir.display());
            }
        }
        Err(e) => {
            println!("  FAIL  Corpus folder {}: {e}", data_dir.display());
            issues += 1;
        }
    }

    let pdf = PdfExtractor::new(&config.corpus.pdftotext_bin);
    if pdf.is_available() {
        println!("  ok    {} found", pdf.binary());
    } else {
        println!("  warn  {} not found; PDF files will be skipped", pdf.binary());
        issues += 1;
    }

    match store::read_manifest(&config.index.path) {
        Ok(m) if m.embedding_model == expected_embedding_model(config) => {
            println!("  ok    Index {} ({} chunks)", config.index.path.display(), m.chunk_count);
        }
        Ok(m) => {
            println!(
                "  warn  Index was built with '{}'; it will be rebuilt on next start",
                m.embedding_model
            );
            issues += 1;
        }
        Err(e) => {
            println!("  info  {e}; it will be built on next start");
        }
    }

    match RiskCatalogue::load_or_builtin(config.assessment.catalogue_path.as_deref()) {
        Ok(c) => println!("  ok    Risk catalogue ({} categories)", c.len()),
        Err(e) => {
            println!("  FAIL  {e}");
            issues += 1;
        }
    }

    if config.has_api_key() || config.default_provider == "ollama" {
        println!("  ok    Credentials for provider '{}'", config.default_provider);
    } else {
        println!("  FAIL  No API key; set RISKIQ_API_KEY or OPENAI_API_KEY");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }
}

/// The model name the configured embedder writes into the manifest.
fn expected_embedding_model(config: &AppConfig) -> String {
    if config.index.embedding_provider == "hash" {
        format!("hash-{}", config.index.embedding_dimension)
    } else {
        config.index.embedding_model.clone()
    }
}
