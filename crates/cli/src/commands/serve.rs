//! `riskiq serve`: Start the HTTP API.

use riskiq_config::AppConfig;

pub async fn run(mut config: AppConfig, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.gateway.port = port;
    }
    println!("riskiq listening on http://{}:{}", config.gateway.host, config.gateway.port);
    println!("  GET  /health");
    println!("  GET  /v1/categories");
    println!("  POST /v1/assessments");
    println!("  POST /v1/assessments/{{sessionId}}/answers");
    println!("  POST /v1/query");
    println!("  POST /v1/index/rebuild");
    riskiq_gateway::start(config).await
}
