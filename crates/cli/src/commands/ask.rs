//! `riskiq ask`: Single-question or interactive question answering.

use riskiq_assessment::{Answer, AssessmentService};
use riskiq_config::AppConfig;
use riskiq_gateway::bootstrap;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub async fn run(config: AppConfig, question: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!("No API key configured. Set RISKIQ_API_KEY or OPENAI_API_KEY, or add api_key to riskiq.toml.");
        return Err("No API key found".into());
    }

    let pipeline = bootstrap::build_pipeline(&config).await?;
    let service = pipeline.service;

    if let Some(question) = question {
        let answer = service.ask(&question).await?;
        print_answer(&answer);
        return Ok(());
    }

    println!("riskiq interactive mode. Ask about your compliance documents; type 'exit' to quit.\n");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }
        answer_one(&service, line).await;
    }
    Ok(())
}

async fn answer_one(service: &AssessmentService, question: &str) {
    match service.ask(question).await {
        Ok(answer) => print_answer(&answer),
        Err(e) => eprintln!("Error: {e}\n"),
    }
}

fn print_answer(answer: &Answer) {
    println!("\n{}\n", answer.answer);
    if !answer.sources.is_empty() {
        println!("Sources:");
        for source in &answer.sources {
            println!("  - {source}");
        }
        println!();
    }
}
