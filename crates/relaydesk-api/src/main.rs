//! RelayDesk server entry point.
//!
//! Binary name: `rdesk`
//!
//! Parses CLI arguments, initializes the database and relay state, then
//! starts the WebSocket/REST server with a running eviction sweeper.

mod http;
mod state;
mod ws;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use clap_complete::generate;

use relaydesk_core::relay::EvictionSweeper;
use state::AppState;

#[derive(Parser)]
#[command(name = "rdesk", version, about = "RelayDesk realtime chat relay")]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 4000, env = "RELAYDESK_PORT")]
        port: u16,

        /// Host to bind
        #[arg(long, default_value = "127.0.0.1", env = "RELAYDESK_HOST")]
        host: String,

        /// Export spans via OpenTelemetry (stdout exporter)
        #[arg(long)]
        otel: bool,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need app state or tracing
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "rdesk", &mut std::io::stdout());
        return Ok(());
    }

    // Set up tracing based on verbosity (RUST_LOG wins when set)
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "info,relaydesk=debug",
        _ => "trace",
    };

    match cli.command {
        Commands::Serve { port, host, otel } => {
            relaydesk_observe::tracing_setup::init_tracing(filter, otel)
                .map_err(|e| anyhow::anyhow!("{e}"))?;

            let state = AppState::init().await?;

            // The sweeper shares the index and transport with the
            // coordinator and is stopped deterministically on shutdown.
            let sweeper = EvictionSweeper::new(
                Arc::clone(&state.index),
                Arc::clone(&state.transport),
                state.config.eviction_period(),
                state.config.inactivity_threshold(),
            )
            .spawn();

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} RelayDesk listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!(
                "  {} Data directory: {}",
                console::style("▸").bold(),
                console::style(state.data_dir.display()).dim()
            );
            println!(
                "  {} WebSocket endpoint at {}",
                console::style("↔").bold(),
                console::style(format!("ws://{addr}/ws")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            sweeper.shutdown().await;
            relaydesk_observe::tracing_setup::shutdown_tracing();

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
