use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use famulus::ai::OpenAiClient;
use famulus::config;
use famulus::gateway::start_gateway;
use famulus::logging;
use famulus::runtime::AgentRuntime;
use famulus::search::{GoogleSearch, SearchEngine};

/// Self-hosted agent server.
#[derive(Parser)]
#[command(name = "famulus", version, about)]
struct Cli {
    /// Bind address (overrides HOST).
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides PORT).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = match config::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(host) = cli.host {
        settings.host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }

    logging::init(&settings.log_level);

    let llm = match OpenAiClient::new(&settings) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("failed to build LLM client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let search_engine: Option<Arc<dyn SearchEngine>> = match (
        &settings.google_search_api_key,
        &settings.google_search_engine_id,
    ) {
        (Some(api_key), Some(cx)) => Some(Arc::new(GoogleSearch::new(api_key.clone(), cx.clone()))),
        _ => {
            log::warn!("search engine not configured, agents run without web search");
            None
        }
    };

    let runtime = Arc::new(AgentRuntime::new(settings.clone(), llm, search_engine));

    match start_gateway(&settings, runtime).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
