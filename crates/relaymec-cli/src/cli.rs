//! CLI command definitions using clap

use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// RelayMEC CLI - relay-assisted edge offloading on synthetic workloads
#[derive(Parser)]
#[command(name = "relaymec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (table, json)
    #[arg(short = 'o', long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Settings file (yaml, toml, json, ini, ron, json5)
    #[arg(short = 'c', long, global = true, env = "RELAYMEC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Shape of the generated workload
#[derive(Args, Debug, Clone)]
pub struct WorkloadArgs {
    /// Number of tasks
    #[arg(short = 'n', long, default_value_t = 50)]
    pub tasks: usize,

    /// Number of edge servers
    #[arg(short, long, default_value_t = 3)]
    pub servers: usize,

    /// Seed for the workload and relay placement (overrides the settings file)
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Place relays over the generated devices
    Place {
        #[command(flatten)]
        workload: WorkloadArgs,
    },

    /// Place relays, then stable-match every task to a relay and a server
    Match {
        #[command(flatten)]
        workload: WorkloadArgs,
    },

    /// Replay task arrivals through a live offloading policy
    Dispatch {
        #[command(flatten)]
        workload: WorkloadArgs,

        /// Offloading policy
        #[arg(short, long, value_enum, default_value_t = PolicyKind::Adaptive)]
        policy: PolicyKind,
    },
}

/// Selectable offloading policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// Tune conservativeness from server load
    Adaptive,
    /// Pass optimizer decisions through unchanged
    Static,
}
