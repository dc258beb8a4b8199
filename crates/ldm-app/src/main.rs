//! `ldm` application binary - composition root.
//!
//! 1. Parse CLI arguments
//! 2. Load configuration from TOML and apply env overrides
//! 3. Build the language-model backend
//! 4. Run either the HTTP server or the terminal REPL

mod cli;
mod repl;

use std::sync::Arc;

use clap::Parser;
use ldm_api::{start_server, AppState};
use ldm_chat::{ChatBackend, ChatOrchestrator, HistoryStore, OpenAiCompatBackend};
use ldm_core::config::LdmConfig;

use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = LdmConfig::load_or_default(&config_file);
    config.apply_env_overrides();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(args.resolve_log_level(&config.general.log_level))
            }),
        )
        .init();

    tracing::info!("Starting ldm v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    if config.llm.api_key.is_none() {
        tracing::warn!("No LLM API key configured; set LDM_LLM_API_KEY or GROQ_API_KEY");
    }

    let backend: Arc<dyn ChatBackend> = Arc::new(OpenAiCompatBackend::from_config(&config.llm)?);
    tracing::info!(
        backend = backend.name(),
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        "Language model backend ready"
    );

    match args.command {
        Command::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            let state = AppState::new(config.clone(), backend);
            start_server(&config, state).await?;
        }
        Command::Repl { user } => {
            let user_id = user.unwrap_or_else(|| config.server.default_user_id.clone());
            let orchestrator = ChatOrchestrator::new(
                backend,
                Arc::new(HistoryStore::new()),
                config.chat.clone(),
                config.llm.structured_output,
            );
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            repl::run(&orchestrator, &user_id, stdin, &mut stdout).await?;
        }
    }

    Ok(())
}
