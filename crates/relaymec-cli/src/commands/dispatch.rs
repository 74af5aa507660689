//! `relaymec dispatch` command implementation
//!
//! Replays task arrivals in order. Each task asks the policy for a decision;
//! an assignment reserves a relay slot and a job slot on its server until the
//! estimated completion time. Server utilization is the share of busy job
//! slots, and the policy sees it before every decision.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use relaymec_foundation::{
    AdaptivePolicy, MatchingOptimizer, OffloadingPolicy, StaticPolicy, SummaryStatistics,
    recording_channel,
};
use relaymec_kernel::{DecisionRecord, Task};
use serde::Serialize;

use super::Scenario;
use crate::cli::{PolicyKind, WorkloadArgs};
use crate::output::{self, OutputFormat};

/// Concurrent jobs one edge server runs at full utilization.
const JOB_SLOTS_PER_SERVER: usize = 4;

#[derive(Serialize)]
struct DispatchReport {
    policy: String,
    tasks: usize,
    offloaded: usize,
    unplaced: usize,
    latency: SummaryStatistics,
    cost: SummaryStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_aggression: Option<f64>,
    dropped_records: u64,
    decisions: Vec<DecisionRow>,
}

/// One decision as reported. Unplaced tasks carry no latency or cost.
#[derive(Debug, Serialize)]
struct DecisionRow {
    task_id: String,
    relay_id: Option<String>,
    server_id: Option<String>,
    latency: Option<f64>,
    cost: Option<f64>,
    deadline_safe: bool,
}

impl From<DecisionRecord> for DecisionRow {
    fn from(record: DecisionRecord) -> Self {
        let placed = record.relay_id.is_some();
        let finite = |value: f64| (placed && value.is_finite()).then_some(value);
        Self {
            latency: finite(record.latency),
            cost: finite(record.cost),
            task_id: record.task_id,
            relay_id: record.relay_id,
            server_id: record.server_id,
            deadline_safe: record.deadline_safe,
        }
    }
}

/// A job holding a relay slot and a server slot until `finish_at_ms`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Running {
    finish_at_ms: u64,
    relay: String,
    server: String,
}

#[derive(Default)]
struct Tally {
    offloaded: usize,
    unplaced: usize,
}

/// Execute the `dispatch` command
pub async fn run(
    config: Option<&Path>,
    args: &WorkloadArgs,
    kind: PolicyKind,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let scenario = Scenario::prepare(config, args)?;
    let (recorder, collector) = recording_channel(args.tasks.max(1) * 2);

    let mut optimizer =
        MatchingOptimizer::new(&scenario.config)?.with_sink(Arc::new(recorder.clone()));
    for relay in scenario.placement.relays {
        optimizer.add_relay(relay);
    }
    for server in scenario.workload.servers {
        optimizer.add_server(server);
    }
    for (id, position) in scenario.workload.positions {
        optimizer.add_position(id, position);
    }

    let tasks = scenario.workload.tasks;
    let (tally, final_aggression, name) = match kind {
        PolicyKind::Adaptive => {
            let mut policy = AdaptivePolicy::new(optimizer, scenario.config.policy.clone());
            let tally = replay(&mut policy, &tasks)?;
            (tally, Some(policy.aggression_level()), policy.name().to_string())
        }
        PolicyKind::Static => {
            let mut policy = StaticPolicy::new(optimizer);
            let tally = replay(&mut policy, &tasks)?;
            (tally, None, policy.name().to_string())
        }
    };

    // Policies and their sinks are gone; the collector can drain and stop.
    let dropped_records = recorder.dropped();
    drop(recorder);
    let decisions = collector.finish().await;

    let decisions: Vec<DecisionRow> = decisions.into_iter().map(DecisionRow::from).collect();
    let latencies: Vec<f64> = decisions.iter().filter_map(|d| d.latency).collect();
    let costs: Vec<f64> = decisions.iter().filter_map(|d| d.cost).collect();

    let report = DispatchReport {
        policy: name,
        tasks: tasks.len(),
        offloaded: tally.offloaded,
        unplaced: tally.unplaced,
        latency: SummaryStatistics::from_values(&latencies),
        cost: SummaryStatistics::from_values(&costs),
        final_aggression,
        dropped_records,
        decisions,
    };

    match format {
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Table => print_table(&report),
    }
    Ok(())
}

fn replay<P: OffloadingPolicy>(policy: &mut P, tasks: &[Task]) -> anyhow::Result<Tally> {
    let mut running: BinaryHeap<Reverse<Running>> = BinaryHeap::new();
    let mut busy: HashMap<String, usize> = HashMap::new();
    let mut tally = Tally::default();

    for task in tasks {
        let now_ms = seconds_to_ms(task.arrival_time());

        while let Some(Reverse(job)) = running.peek() {
            if job.finish_at_ms > now_ms {
                break;
            }
            let Some(Reverse(job)) = running.pop() else {
                break;
            };
            policy.optimizer_mut().release(&job.relay)?;
            if let Some(jobs) = busy.get_mut(&job.server) {
                *jobs = jobs.saturating_sub(1);
            }
        }

        for server in policy.optimizer_mut().servers_mut() {
            let jobs = busy.get(server.id()).copied().unwrap_or(0);
            server.set_utilization(jobs as f64 / JOB_SLOTS_PER_SERVER as f64);
        }
        let servers = policy.optimizer().servers().to_vec();
        policy.update(task.arrival_time(), &servers);

        let candidates: Vec<_> = servers
            .into_iter()
            .filter(|s| busy.get(s.id()).copied().unwrap_or(0) < JOB_SLOTS_PER_SERVER)
            .collect();
        let decision = policy.make_decision(task, &candidates);

        match (&decision.relay_id, &decision.server_id) {
            (Some(relay), Some(server)) => {
                policy.optimizer_mut().commit(&decision)?;
                *busy.entry(server.clone()).or_default() += 1;
                running.push(Reverse(Running {
                    finish_at_ms: now_ms.saturating_add(seconds_to_ms(decision.estimated_latency)),
                    relay: relay.clone(),
                    server: server.clone(),
                }));
                tally.offloaded += 1;
            }
            _ => {
                tracing::debug!(task = task.id(), "task could not be offloaded");
                tally.unplaced += 1;
            }
        }
    }

    tracing::info!(
        offloaded = tally.offloaded,
        unplaced = tally.unplaced,
        decisions = policy.optimizer().decision_count(),
        "dispatch replay finished"
    );
    Ok(tally)
}

fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds * 1000.0).round().clamp(0.0, u64::MAX as f64) as u64
}

fn print_table(report: &DispatchReport) {
    let mut table = output::table(&["task", "relay", "server", "latency (s)", "cost", "safe"]);
    for d in &report.decisions {
        table.add_row(vec![
            d.task_id.clone(),
            d.relay_id.clone().unwrap_or_else(|| "-".to_string()),
            d.server_id.clone().unwrap_or_else(|| "-".to_string()),
            d.latency
                .map_or_else(|| "-".to_string(), |v| output::num(v, 3)),
            d.cost.map_or_else(|| "-".to_string(), |v| output::num(v, 8)),
            d.deadline_safe.to_string(),
        ]);
    }
    println!("{table}");

    println!(
        "{}: {} offloaded, {} unplaced of {} tasks",
        report.policy.bold(),
        report.offloaded.to_string().green(),
        report.unplaced.to_string().yellow(),
        report.tasks
    );
    println!("latency: {}", report.latency);
    println!("cost:    {}", report.cost);
    if let Some(level) = report.final_aggression {
        println!("final aggression level: {level:.2}");
    }
    if report.dropped_records > 0 {
        println!(
            "{}",
            format!("{} decision records dropped", report.dropped_records).red()
        );
    }
}
