//! RelayMEC CLI - relay placement, stable matching and live dispatch

mod cli;
mod commands;
mod output;
mod workload;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Place { workload } => commands::place::run(config, &workload, cli.output),
        Commands::Match { workload } => commands::matching::run(config, &workload, cli.output),
        Commands::Dispatch { workload, policy } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(commands::dispatch::run(config, &workload, policy, cli.output))
        }
    }
}
