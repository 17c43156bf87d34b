#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use tokio::net::TcpListener;

use fridgecipe::{AppState, build_app, config::Config, logging::init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Keep guard alive so file logger flushes correctly
    let _log_guards = init_logging(&config);

    // Log all configuration (mask sensitive values)
    tracing::info!("=== Configuration ===");
    tracing::info!("Bind address: {}", config.bind);
    tracing::info!("Log file: {}", config.log_file.display());
    tracing::info!(
        "LLM API key: {}",
        if config.has_api_key() { "<set>" } else { "<not set>" }
    );
    tracing::info!("LLM model: {}", config.llm_model);
    tracing::info!("LLM API URL: {}", config.llm_api_url);
    tracing::info!("LLM max tokens: {}", config.llm_max_tokens);
    tracing::info!("LLM timeout: {}s", config.llm_timeout_secs);
    tracing::info!("Session idle timeout: {}s", config.session_idle_secs);
    tracing::info!("Max sessions: {}", config.max_sessions);
    tracing::info!("Analysis prompt: {} chars", config.analysis_prompt.len());
    tracing::info!("====================");

    if !config.has_api_key() {
        tracing::warn!("No LLM API key configured, recipe requests will be rejected upstream");
    }

    let bind = config.bind;
    let app = build_app(AppState::new(config));

    let listener = TcpListener::bind(bind).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
