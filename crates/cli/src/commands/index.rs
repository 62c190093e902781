//! `riskiq index`: Build, load, or rebuild the persisted vector index.

use riskiq_config::AppConfig;
use riskiq_gateway::bootstrap;
use riskiq_index::store;

pub async fn run(config: AppConfig, rebuild: bool) -> Result<(), Box<dyn std::error::Error>> {
    let started = std::time::Instant::now();
    let existed = store::manifest_path(&config.index.path).exists();
    let (index, corpus) = bootstrap::open_index(&config).await?;

    // A store that did not exist was just built from the corpus.
    if rebuild && existed {
        let chunks = index.rebuild(&corpus).await?;
        println!("Rebuilt index from {} ({chunks} chunks)", corpus.dir().display());
    }
    let manifest = index.manifest().await;

    println!("Vector index ready");
    println!("  Corpus:     {}", corpus.dir().display());
    println!("  Index:      {}", index.path().display());
    println!("  Chunks:     {}", manifest.chunk_count);
    println!("  Embedding:  {} ({} dims)", manifest.embedding_model, manifest.dimension);
    println!("  Built at:   {}", manifest.created_at.to_rfc3339());
    println!("  Elapsed:    {:.1}s", started.elapsed().as_secs_f64());
    Ok(())
}
