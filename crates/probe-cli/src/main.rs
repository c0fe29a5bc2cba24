use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "probectl",
    about = "ProbeGrid — monitoring task-assignment control plane",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Data directory holding the state database.
    #[arg(long, default_value = "/var/lib/probegrid", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage monitored-service types
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Manage target assignments
    Target {
        #[command(subcommand)]
        action: TargetAction,
    },
    /// Apply a probes.toml seed manifest.
    ///
    /// Registers every declared service (skipping ones that already exist)
    /// and assigns every listed target. Safe to re-run.
    Apply {
        /// Path to the manifest file
        #[arg(short, long, default_value = "probes.toml")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ServiceAction {
    /// Register a new service type
    Add {
        /// Service type name (e.g. mongodb, redis)
        name: String,
        /// Probe protocol family (mongodb, redis, http_json, ...)
        #[arg(long)]
        db_type: String,
        /// Probe command to run against each target (repeat for several)
        #[arg(long = "cmd", required = true)]
        commands: Vec<String>,
        /// Historical samples retained per target
        #[arg(long, default_value = "60")]
        sample_count: u32,
        /// Polling period in seconds
        #[arg(long, default_value = "1")]
        interval_seconds: u64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// List registered service types
    List,
    /// Remove a service type and its assignments
    Remove { name: String },
}

#[derive(Subcommand)]
enum TargetAction {
    /// Assign a target to the next collector worker
    Add {
        /// Service type name
        service: String,
        /// Target as host:port
        target: String,
    },
    /// List a service's target assignments
    List { service: String },
    /// Move a target onto a fresh worker id
    Reassign { service: String, target_id: String },
    /// Record the collector pid that claimed a target
    Claim {
        service: String,
        target_id: String,
        #[arg(long)]
        process_id: u32,
    },
    /// Remove a target assignment
    Remove { service: String, target_id: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("probectl=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let registry = commands::open_registry(&cli.data_dir)?;

    match cli.command {
        Commands::Service { action } => match action {
            ServiceAction::Add {
                name,
                db_type,
                commands,
                sample_count,
                interval_seconds,
                username,
                password,
            } => commands::service::add(
                &registry,
                probegrid_registry::ServiceSpec {
                    name,
                    db_type,
                    commands,
                    sample_count,
                    interval_seconds,
                    username,
                    password,
                },
            ),
            ServiceAction::List => commands::service::list(&registry),
            ServiceAction::Remove { name } => commands::service::remove(&registry, &name),
        },
        Commands::Target { action } => match action {
            TargetAction::Add { service, target } => {
                commands::target::add(&registry, &service, &target)
            }
            TargetAction::List { service } => commands::target::list(&registry, &service),
            TargetAction::Reassign { service, target_id } => {
                commands::target::reassign(&registry, &service, &target_id)
            }
            TargetAction::Claim {
                service,
                target_id,
                process_id,
            } => commands::target::claim(&registry, &service, &target_id, process_id),
            TargetAction::Remove { service, target_id } => {
                commands::target::remove(&registry, &service, &target_id)
            }
        },
        Commands::Apply { file } => commands::apply::apply(&registry, &file),
    }
}
