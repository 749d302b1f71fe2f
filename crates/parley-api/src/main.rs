//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads configuration, wires the session service,
//! then dispatches to the command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use std::path::Path;

use clap::Parser;
use clap_complete::generate;

use parley_infra::config::{load_config, resolve_data_dir, validate_config};
use parley_infra::store::open_store;
use parley_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use parley_types::config::ChatbotConfig;

use cli::{Cli, Commands};
use state::{AppState, KeyPrompt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,parley=debug",
        _ => "trace",
    };
    init_tracing(&TracingOptions {
        default_filter: filter.to_string(),
        json: cli.json,
        enable_otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need config or state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir();
    let config = load_settings(&cli, &data_dir).await?;

    match cli.command {
        Commands::Chat { session, no_stream } => {
            let state = AppState::init(config, data_dir, KeyPrompt::IfInteractive).await?;
            let persona = state.persona(session.personality.as_deref(), session.language.as_deref());
            cli::chat::loop_runner::run_chat_loop(&state, session.thread, persona, !no_stream)
                .await?;
        }

        Commands::Send {
            message,
            session,
            stream,
        } => {
            let state = AppState::init(config, data_dir, KeyPrompt::Never).await?;
            let persona = state.persona(session.personality.as_deref(), session.language.as_deref());
            cli::send::send_message(&state, &session.thread, &message, &persona, stream, cli.json)
                .await?;
        }

        Commands::Demo { scenario } => {
            let state = AppState::init(config, data_dir, KeyPrompt::IfInteractive).await?;
            cli::demo::run_demo(&state, scenario).await?;
        }

        Commands::History { thread } => {
            let store = open_store(&config.store, &data_dir).await?;
            cli::history::show_history(&store, &thread, cli.json).await?;
        }

        Commands::Threads => {
            let store = open_store(&config.store, &data_dir).await?;
            cli::history::list_threads(&store, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            let state = AppState::init(config, data_dir, KeyPrompt::Never).await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} Parley API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!(
                    "  {} {}",
                    console::style("Data:").dim(),
                    console::style(state.data_dir.display()).dim()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Completions { .. } => unreachable!("handled before config is loaded"),
    }

    Ok(())
}

/// Load the config file and apply the command-line overrides.
async fn load_settings(cli: &Cli, data_dir: &Path) -> anyhow::Result<ChatbotConfig> {
    let mut config = load_config(cli.config.as_deref(), data_dir).await?;
    apply_overrides(&mut config, cli.model.as_deref(), cli.history_tokens);
    validate_config(&config)?;
    Ok(config)
}

fn apply_overrides(config: &mut ChatbotConfig, model: Option<&str>, history_tokens: Option<u32>) {
    if let Some(model) = model {
        config.provider.model = model.to_string();
    }
    if let Some(tokens) = history_tokens {
        config.history.max_tokens = tokens;
    }
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = ChatbotConfig::default();
        apply_overrides(&mut config, Some("gpt-4o-mini"), Some(512));
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.history.max_tokens, 512);
    }

    #[test]
    fn test_no_overrides_keep_defaults() {
        let mut config = ChatbotConfig::default();
        apply_overrides(&mut config, None, None);
        assert_eq!(config.provider.model, "gpt-3.5-turbo");
        assert_eq!(config.history.max_tokens, 150);
    }

    #[test]
    fn test_zero_history_override_is_rejected() {
        let mut config = ChatbotConfig::default();
        apply_overrides(&mut config, None, Some(0));
        assert!(validate_config(&config).is_err());
    }
}
