//! `relaymec match` command implementation

use std::path::Path;

use colored::Colorize;
use relaymec_foundation::{MatchingOptimizer, SummaryStatistics};
use relaymec_kernel::MatchTriplet;
use serde::Serialize;

use super::Scenario;
use crate::cli::WorkloadArgs;
use crate::output::{self, OutputFormat};

#[derive(Serialize)]
struct RelayLoad {
    relay: String,
    load: usize,
    capacity: usize,
}

#[derive(Serialize)]
struct MatchReport {
    tasks: usize,
    matched: usize,
    total_profit: f64,
    latency: SummaryStatistics,
    relay_loads: Vec<RelayLoad>,
    matches: Vec<MatchTriplet>,
}

/// Execute the `match` command
pub fn run(config: Option<&Path>, args: &WorkloadArgs, format: OutputFormat) -> anyhow::Result<()> {
    let scenario = Scenario::prepare(config, args)?;
    let workload = scenario.workload;

    let mut optimizer = MatchingOptimizer::new(&scenario.config)?;
    for relay in scenario.placement.relays {
        optimizer.add_relay(relay);
    }
    for server in workload.servers {
        optimizer.add_server(server);
    }
    for (id, position) in workload.positions {
        optimizer.add_position(id, position);
    }
    for task in workload.tasks {
        optimizer.add_task(task);
    }

    let matches = optimizer.run_session_matching();
    let latencies: Vec<f64> = matches.iter().map(MatchTriplet::latency).collect();
    let report = MatchReport {
        tasks: optimizer.tasks().len(),
        matched: matches.len(),
        total_profit: optimizer.total_profit(),
        latency: SummaryStatistics::from_values(&latencies),
        relay_loads: optimizer
            .relays()
            .iter()
            .map(|r| RelayLoad {
                relay: r.id().to_string(),
                load: optimizer.relay_load(r.id()).unwrap_or(0),
                capacity: r.capacity(),
            })
            .collect(),
        matches,
    };

    match format {
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Table => {
            let mut table =
                output::table(&["task", "relay", "server", "sinr", "latency (s)", "profit"]);
            for m in &report.matches {
                table.add_row(vec![
                    m.task_id().to_string(),
                    m.relay_id().to_string(),
                    m.server_id().to_string(),
                    output::num(m.signal_quality(), 2),
                    output::num(m.latency(), 3),
                    output::num(m.profit(), 4),
                ]);
            }
            println!("{table}");

            let mut loads = output::table(&["relay", "load", "capacity"]);
            for l in &report.relay_loads {
                loads.add_row(vec![
                    l.relay.clone(),
                    l.load.to_string(),
                    l.capacity.to_string(),
                ]);
            }
            println!("{loads}");

            let unmatched = report.tasks - report.matched;
            let summary = format!(
                "Matched {}/{} tasks, total profit {:.4}, latency {}",
                report.matched, report.tasks, report.total_profit, report.latency
            );
            if unmatched == 0 {
                println!("{}", summary.green());
            } else {
                println!("{} ({} unmatched)", summary.yellow(), unmatched);
            }
        }
    }
    Ok(())
}
