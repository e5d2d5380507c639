//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads configuration, initializes tracing and the
//! chat service, then dispatches to a command handler or starts the REST
//! API server.

mod cli;
mod http;
mod state;

use clap::Parser;

use parley_infra::config::{load_config, resolve_data_dir};
use parley_observe::tracing_setup::{
    TracingOptions, filter_for_verbosity, init_tracing, shutdown_tracing,
};
use parley_types::config::{AppConfig, LogFormat};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = resolve_data_dir();
    let config = load_config(cli.config.as_deref(), &data_dir).await?;

    init_tracing(&TracingOptions {
        default_filter: filter_for_verbosity(cli.verbose, cli.quiet).to_string(),
        json: config.logging.format == LogFormat::Json,
        enable_otel: cli.otel || config.logging.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
    tracing::debug!(
        data_dir = %data_dir.display(),
        provider = ?config.llm.provider,
        storage = ?config.storage.backend,
        "Configuration loaded"
    );

    let result = run(cli, config, data_dir).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, mut config: AppConfig, data_dir: std::path::PathBuf) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }

            let state = AppState::init(&config, data_dir).await?;
            let addr = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!(%addr, data_dir = %state.data_dir.display(), "listening");
            if !cli.quiet && !cli.json {
                println!(
                    "  {} Parley API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet && !cli.json {
                println!("\n  Server stopped.");
            }
        }

        Commands::Chat { message, session } => {
            let state = AppState::init(&config, data_dir).await?;
            cli::chat::send_message(&state, message, session, cli.json, cli.quiet).await?;
        }

        Commands::Show { session_id } => {
            let state = AppState::init(&config, data_dir).await?;
            cli::session::show_session(&state, &session_id, cli.json).await?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

    tracing::info!("shutdown signal received");
}
