//! `relaymec place` command implementation

use std::path::Path;

use colored::Colorize;
use relaymec_kernel::RelayNode;
use serde::Serialize;

use super::Scenario;
use crate::cli::WorkloadArgs;
use crate::output::{self, OutputFormat};

#[derive(Serialize)]
struct PlacementReport<'a> {
    devices: usize,
    iterations: usize,
    converged: bool,
    relays: &'a [RelayNode],
}

/// Execute the `place` command
pub fn run(config: Option<&Path>, args: &WorkloadArgs, format: OutputFormat) -> anyhow::Result<()> {
    let scenario = Scenario::prepare(config, args)?;
    let placement = &scenario.placement;

    let report = PlacementReport {
        devices: scenario.workload.positions.len(),
        iterations: placement.iterations,
        converged: placement.converged,
        relays: &placement.relays,
    };

    match format {
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Table => {
            let mut table = output::table(&["relay", "x (m)", "y (m)", "altitude (m)", "capacity"]);
            for relay in &placement.relays {
                let p = relay.position();
                table.add_row(vec![
                    relay.id().to_string(),
                    output::num(p.x, 1),
                    output::num(p.y, 1),
                    output::num(relay.altitude(), 1),
                    relay.capacity().to_string(),
                ]);
            }
            println!("{table}");
            println!(
                "{} {} relays for {} devices ({} iterations, converged: {})",
                "Placed".green(),
                placement.relays.len(),
                report.devices,
                placement.iterations,
                placement.converged
            );
        }
    }
    Ok(())
}
