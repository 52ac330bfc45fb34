//! chatbridge CLI entry point.
//!
//! Binary name: `cbridge`
//!
//! Loads configuration, wires the remote provider into a chat session,
//! starts the inspection/WebSocket server in the background and runs the
//! interactive prompt loop in the foreground.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use console::style;
use tokio::sync::oneshot;
use tracing::{info, warn};

use chatbridge_infra::config::{apply_env_overrides, load_config, resolve_api_key};
use chatbridge_observe::tracing_setup::{init_tracing, shutdown_tracing, TracingOptions};
use chatbridge_types::chat::Language;
use chatbridge_types::config::BridgeConfig;

use cli::chat::banner::print_welcome_banner;
use cli::chat::loop_runner::{run_chat_loop, thinking_spinner};
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need configuration or logging
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "cbridge", &mut std::io::stdout());
        return Ok(());
    }

    let options = TracingOptions {
        json: cli.log_json,
        otel: cli.otel,
        ..TracingOptions::new(cli.log_filter())
    };
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let env = |key: &str| std::env::var(key).ok();

    let config = load_config(cli.config.as_deref()).await?;
    let config = cli.apply_overrides(apply_env_overrides(config, env));
    config.validate()?;

    match &cli.command {
        Some(Commands::Config) => cli::config::print_config(&config, resolve_api_key(env).is_ok()),
        Some(Commands::Chat { lang, .. }) => chat(&config, lang.as_deref()).await,
        None => chat(&config, None).await,
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

async fn chat(config: &BridgeConfig, lang: Option<&str>) -> anyhow::Result<()> {
    let language = lang.map(str::parse::<Language>).transpose()?;
    let api_key = resolve_api_key(|key| std::env::var(key).ok())?;
    let state = AppState::init(config, api_key)?;

    if config.warmup {
        let spinner = thinking_spinner("warming up...");
        let warmup = state.session.warmup().await;
        spinner.finish_and_clear();
        let elapsed = warmup?;
        info!(elapsed_ms = elapsed.as_millis() as u64, "Warm-up complete");
    }

    let addr = format!("{}:{}", config.host, config.api_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    info!(%local_addr, "Inspection API listening");

    let router = http::router::build_router(state.clone());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    print_welcome_banner(
        state.session.provider_name(),
        &config.model,
        &format!("http://{local_addr}"),
        config.stream,
    );

    let chat_result = tokio::select! {
        result = run_chat_loop(&state.session, language) => result,
        _ = shutdown_signal() => {
            println!("\n  {}", style("Interrupted, shutting down.").dim());
            Ok(())
        }
    };

    let _ = stop_tx.send(());
    server.await??;
    println!("  {}", style("Server stopped.").dim());

    chat_result
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
