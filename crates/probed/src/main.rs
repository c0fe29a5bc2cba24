//! probed — the ProbeGrid daemon.
//!
//! Single binary that opens the state store and serves the REST API used by
//! operators (registration), discovery agents (target assignment), and the
//! collector fleet (assignment reads).
//!
//! # Usage
//!
//! ```text
//! probed serve --port 8460 --data-dir /var/lib/probegrid
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "probed", about = "ProbeGrid daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the task-assignment API.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8460")]
        port: u16,

        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/probegrid")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,probed=debug,probegrid=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, data_dir } => run_serve(port, data_dir).await,
    }
}

async fn run_serve(port: u16, data_dir: PathBuf) -> anyhow::Result<()> {
    info!("ProbeGrid daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("probegrid.redb");

    let state = probegrid_state::StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    let registry = probegrid_registry::Registry::new(state);

    let router = probegrid_api::build_router(registry);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
    });

    server.await?;

    info!("ProbeGrid daemon stopped");
    Ok(())
}
