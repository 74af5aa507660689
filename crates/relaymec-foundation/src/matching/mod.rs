//! Three-sided stable matching of tasks, relays and compute servers.
//!
//! Tasks propose to their favourite relay that still has room; the relay
//! forwards the task to its favourite server able to process it before the
//! deadline. A proposal is deferred when the link is too weak or the end to
//! end latency misses the deadline, and retried on the next pass. Passes
//! repeat until one produces no new match or the iteration limit is hit.

mod ledger;
mod preference;

pub use ledger::CapacityLedger;
pub use preference::PreferenceTable;

use relaymec_kernel::{ComputeServer, MatchTriplet, MatcherConfig, PositionMap, RelayNode, Task};

use crate::comm;
use crate::error::MatchingResult;

/// Everything one matching run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// At most one triplet per task, in match order.
    pub matches: Vec<MatchTriplet>,
    /// Relay loads at the end of the run.
    pub ledger: CapacityLedger,
    pub iterations: usize,
    /// False when the iteration limit stopped a run that was still matching.
    pub converged: bool,
}

impl MatchOutcome {
    fn empty(relays: &[RelayNode]) -> Self {
        Self {
            matches: Vec::new(),
            ledger: CapacityLedger::new(relays),
            iterations: 0,
            converged: true,
        }
    }

    pub fn total_profit(&self) -> f64 {
        self.matches.iter().map(MatchTriplet::profit).sum()
    }
}

/// Provider profit of serving `task` over a link of quality `sinr` on a
/// server of `server_capacity`.
///
/// `revenue_param · kb · rate_mbps − cost_param · kb · processing_delay`
pub fn profit(config: &MatcherConfig, task: &Task, sinr: f64, server_capacity: f64) -> f64 {
    let rate_mbps = comm::data_rate(sinr, comm::UPLINK_RESOURCE_BLOCKS) / 1e6;
    let proc_delay = comm::processing_delay(task.compute_units(), server_capacity);
    let revenue = config.revenue_param * task.data_size_kb() * rate_mbps;
    let cost = config.cost_param * task.data_size_kb() * proc_delay;
    revenue - cost
}

/// Deferred-acceptance matcher. Stateless between runs.
#[derive(Debug, Clone)]
pub struct StableMatcher {
    config: MatcherConfig,
}

impl StableMatcher {
    pub fn new(config: MatcherConfig) -> MatchingResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Match every task it can.
    ///
    /// Empty input yields an empty outcome. A task without a position is a
    /// fault and fails the whole run.
    pub fn run(
        &self,
        tasks: &[Task],
        relays: &[RelayNode],
        servers: &[ComputeServer],
        positions: &PositionMap,
    ) -> MatchingResult<MatchOutcome> {
        if tasks.is_empty() || relays.is_empty() || servers.is_empty() {
            tracing::warn!(
                tasks = tasks.len(),
                relays = relays.len(),
                servers = servers.len(),
                "nothing to match"
            );
            return Ok(MatchOutcome::empty(relays));
        }

        tracing::debug!(
            tasks = tasks.len(),
            relays = relays.len(),
            servers = servers.len(),
            "starting stable matching"
        );

        let prefs = PreferenceTable::build(tasks, relays, servers, positions)?;
        let mut ledger = CapacityLedger::new(relays);
        let mut matched = vec![false; tasks.len()];
        let mut matches = Vec::new();
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;
            let mut progressed = false;

            for (t, task) in tasks.iter().enumerate() {
                if matched[t] {
                    continue;
                }
                if let Some(triplet) = self.propose(t, task, relays, servers, &prefs, &ledger) {
                    ledger.increment(triplet.relay_id())?;
                    tracing::trace!(
                        task = triplet.task_id(),
                        relay = triplet.relay_id(),
                        server = triplet.server_id(),
                        profit = triplet.profit(),
                        "matched"
                    );
                    matches.push(triplet);
                    matched[t] = true;
                    progressed = true;
                }
            }

            if !progressed {
                converged = true;
                break;
            }
        }

        tracing::info!(
            iterations,
            converged,
            matches = matches.len(),
            unmatched = tasks.len() - matches.len(),
            "stable matching finished"
        );

        Ok(MatchOutcome {
            matches,
            ledger,
            iterations,
            converged,
        })
    }

    /// One proposal of task `t`; `None` defers it to the next pass.
    fn propose(
        &self,
        t: usize,
        task: &Task,
        relays: &[RelayNode],
        servers: &[ComputeServer],
        prefs: &PreferenceTable,
        ledger: &CapacityLedger,
    ) -> Option<MatchTriplet> {
        let Some(&r) = prefs.task_to_relays[t]
            .iter()
            .find(|&&r| ledger.has_capacity(relays[r].id()))
        else {
            tracing::trace!(task = task.id(), "no relay with spare capacity");
            return None;
        };
        let relay = &relays[r];

        let Some(&s) = prefs.relay_to_servers[r].iter().find(|&&s| {
            comm::processing_delay(task.compute_units(), servers[s].capacity()) < task.deadline()
        }) else {
            tracing::trace!(
                task = task.id(),
                relay = relay.id(),
                "no server can process the task in time"
            );
            return None;
        };
        let server = &servers[s];

        let sinr = prefs.task_sinr[t][r];
        if sinr < self.config.sinr_threshold {
            tracing::trace!(
                task = task.id(),
                relay = relay.id(),
                sinr,
                threshold = self.config.sinr_threshold,
                "link below threshold"
            );
            return None;
        }

        let latency = comm::total_latency(task, server.capacity(), sinr);
        if latency > task.deadline() {
            tracing::trace!(
                task = task.id(),
                latency,
                deadline = task.deadline(),
                "latency misses deadline"
            );
            return None;
        }

        Some(MatchTriplet::new(
            task.id(),
            relay.id(),
            server.id(),
            sinr,
            latency,
            profit(&self.config, task, sinr, server.capacity()),
        ))
    }
}
