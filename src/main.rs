use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod commands;
mod config;
mod models;
mod services;
mod utils;

use api::bitaps::BitapsClient;
use api::deepseek::DeepSeekClient;
use commands::Reply;
use config::{ApiKey, AppConfig};
use services::pipeline_service::ChartPipeline;
use utils::{one_line, ChartError};

fn prompt(text: &str) {
    print!("{}", text);
    std::io::stdout().flush().ok();
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chartwright=debug,reqwest=warn")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    info!("📈 Starting chartwright v{}", env!("CARGO_PKG_VERSION"));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(ChartError::Credential(_)) if std::env::var("DEEPSEEK_API_KEY").is_err() => {
            prompt("🔑 DeepSeek API key: ");
            let Ok(Some(raw)) = lines.next_line().await else {
                return;
            };
            match ApiKey::parse(&raw).and_then(AppConfig::with_key) {
                Ok(config) => config,
                Err(e) => {
                    println!("❌ {}", one_line(&e.to_string()));
                    return;
                }
            }
        }
        Err(e) => {
            error!("Startup failed: {}", e);
            println!("❌ {}", one_line(&e.to_string()));
            return;
        }
    };
    info!("Loaded configuration: {:?}", config);

    let http_client = match api::build_http_client(config.request_timeout, config.proxy_url.as_deref()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            println!("❌ {}", one_line(&format!("Could not set up networking: {}", e)));
            return;
        }
    };

    let completion = DeepSeekClient::with_base_url(
        http_client.clone(),
        config.api_key.clone(),
        config.completion_base_url.clone(),
    );
    let blocks = BitapsClient::with_base_url(
        http_client,
        config.blockchain_base_url.clone(),
        config.requests_per_second,
    );
    let pipeline = ChartPipeline::new(completion, blocks, config.day_workers);

    println!("{}", commands::help::execute());
    loop {
        prompt("\n> ");
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        };

        match commands::handle_line(&pipeline, &config.output_dir, &line).await {
            Reply::Print(text) if text.is_empty() => {}
            Reply::Print(text) => println!("{}", text),
            Reply::Quit => break,
        }
    }

    info!("Session ended");
}
