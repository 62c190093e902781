//! riskiq CLI: the main entry point.
//!
//! Commands:
//! - `serve`   - Start the HTTP API (index builds in the background)
//! - `index`   - Build, load or rebuild the persisted vector index
//! - `ask`     - Ask the corpus a question, or start an interactive session
//! - `status`  - Show the effective configuration
//! - `doctor`  - Diagnose corpus, index, tooling and credentials

use clap::{Parser, Subcommand};
use riskiq_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "riskiq",
    about = "riskiq: RAG-backed cybersecurity risk assessment",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "RISKIQ_LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Build or load the vector index from the corpus folder
    Index {
        /// Discard any persisted index and re-ingest the corpus
        #[arg(long)]
        rebuild: bool,
    },

    /// Ask a question against the indexed documents
    Ask {
        /// The question; omit to start an interactive session
        question: Option<String>,
    },

    /// Show effective configuration
    Status,

    /// Diagnose corpus, index and provider setup
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    tracing::debug!(path = %AppConfig::config_path().display(), "Configuration loaded");

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Index { rebuild } => commands::index::run(config, rebuild).await?,
        Commands::Ask { question } => commands::ask::run(config, question).await?,
        Commands::Status => commands::status::run(&config),
        Commands::Doctor => commands::doctor::run(&config).await,
    }

    Ok(())
}
