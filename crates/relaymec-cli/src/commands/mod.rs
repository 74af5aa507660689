//! Command implementations

pub mod dispatch;
pub mod matching;
pub mod place;

use std::path::Path;

use anyhow::Context;
use relaymec_foundation::{PlacementOptimizer, PlacementOutcome};
use relaymec_kernel::OffloadConfig;

use crate::cli::WorkloadArgs;
use crate::workload::{self, Workload};

/// Settings, workload and relays shared by every command.
pub struct Scenario {
    pub config: OffloadConfig,
    pub workload: Workload,
    pub placement: PlacementOutcome,
}

impl Scenario {
    pub fn prepare(config_path: Option<&Path>, args: &WorkloadArgs) -> anyhow::Result<Self> {
        let mut config = load_settings(config_path)?;
        if let Some(seed) = args.seed {
            config.placement.seed = seed;
        }

        let workload = workload::generate(
            args.tasks,
            args.servers,
            config.placement.seed,
            config.placement.area_size,
        );
        tracing::debug!(
            tasks = workload.tasks.len(),
            servers = workload.servers.len(),
            seed = config.placement.seed,
            "generated workload"
        );

        let placement = PlacementOptimizer::new(config.placement.clone())
            .context("invalid placement settings")?
            .optimize(&workload.positions);

        Ok(Self {
            config,
            workload,
            placement,
        })
    }
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<OffloadConfig> {
    let Some(path) = path else {
        return Ok(OffloadConfig::default());
    };
    let path = path
        .to_str()
        .with_context(|| format!("settings path is not valid UTF-8: {}", path.display()))?;
    OffloadConfig::load(path).map_err(|report| anyhow::anyhow!("{report:?}"))
}
