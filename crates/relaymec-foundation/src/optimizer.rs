//! Session facade over placement, matching and the single-task path.
//!
//! A [`MatchingOptimizer`] owns the registries of one optimization session
//! (tasks, relays, servers, device positions) and the relay loads left by the
//! last matching run. Batch runs go through [`StableMatcher`]; live dispatch
//! asks [`MatchingOptimizer::decide_single_task`] for one task at a time and
//! reserves the chosen relay slot with [`MatchingOptimizer::commit`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use relaymec_kernel::{
    Clock, ComputeServer, DecisionRecord, DecisionSink, MatchTriplet, NoopSink, OffloadConfig,
    OffloadingDecision, Position, PositionMap, RelayNode, SystemClock, Task,
};

use crate::comm;
use crate::cost::{CostInput, CostModel};
use crate::error::MatchingResult;
use crate::matching::{self, CapacityLedger, MatchOutcome, StableMatcher};

pub struct MatchingOptimizer {
    matcher: StableMatcher,
    cost_model: CostModel,

    tasks: Vec<Task>,
    relays: Vec<RelayNode>,
    servers: Vec<ComputeServer>,
    positions: PositionMap,

    /// Session relay loads: each batch run overwrites the relays it covered,
    /// commits and releases adjust single slots.
    ledger: CapacityLedger,
    total_profit: f64,
    decisions: AtomicU64,

    sink: Arc<dyn DecisionSink>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for MatchingOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingOptimizer")
            .field("tasks", &self.tasks.len())
            .field("relays", &self.relays.len())
            .field("servers", &self.servers.len())
            .field("total_profit", &self.total_profit)
            .field("decisions", &self.decision_count())
            .finish_non_exhaustive()
    }
}

impl MatchingOptimizer {
    pub fn new(config: &OffloadConfig) -> MatchingResult<Self> {
        config.cost.validate()?;
        Ok(Self {
            matcher: StableMatcher::new(config.matcher.clone())?,
            cost_model: CostModel::new(config.cost.clone()),
            tasks: Vec::new(),
            relays: Vec::new(),
            servers: Vec::new(),
            positions: PositionMap::new(),
            ledger: CapacityLedger::default(),
            total_profit: 0.0,
            decisions: AtomicU64::new(0),
            sink: Arc::new(NoopSink),
            clock: Arc::new(SystemClock),
        })
    }

    /// Offer every decision and match to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn DecisionSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ------------------------------------------------------------------
    // Registries
    // ------------------------------------------------------------------

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Register a relay. It starts empty unless a run already loaded it.
    pub fn add_relay(&mut self, relay: RelayNode) {
        self.ledger.ensure(&relay);
        self.relays.push(relay);
    }

    pub fn add_server(&mut self, server: ComputeServer) {
        self.servers.push(server);
    }

    pub fn add_position(&mut self, task_id: impl Into<String>, position: Position) {
        self.positions.insert(task_id.into(), position);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn relays(&self) -> &[RelayNode] {
        &self.relays
    }

    pub fn servers(&self) -> &[ComputeServer] {
        &self.servers
    }

    pub fn servers_mut(&mut self) -> &mut [ComputeServer] {
        &mut self.servers
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    // ------------------------------------------------------------------
    // Batch matching
    // ------------------------------------------------------------------

    /// Stable matching over the given sets.
    ///
    /// Never fails: a fault inside the run is logged and yields no matches.
    pub fn run_stable_matching(
        &mut self,
        tasks: &[Task],
        relays: &[RelayNode],
        servers: &[ComputeServer],
        positions: &PositionMap,
    ) -> Vec<MatchTriplet> {
        let result = self.matcher.run(tasks, relays, servers, positions);
        self.absorb(result)
    }

    /// Stable matching over the session registries.
    pub fn run_session_matching(&mut self) -> Vec<MatchTriplet> {
        let result = self
            .matcher
            .run(&self.tasks, &self.relays, &self.servers, &self.positions);
        self.absorb(result)
    }

    fn absorb(&mut self, result: MatchingResult<MatchOutcome>) -> Vec<MatchTriplet> {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "stable matching failed, returning no matches");
                return Vec::new();
            }
        };

        self.total_profit += outcome.total_profit();
        self.decisions
            .fetch_add(outcome.matches.len() as u64, Ordering::Relaxed);

        self.ledger.merge_run(outcome.ledger);

        let now = self.clock.now_millis();
        for triplet in &outcome.matches {
            self.sink.record(DecisionRecord::from_match(now, triplet));
        }
        outcome.matches
    }

    // ------------------------------------------------------------------
    // Single-task path
    // ------------------------------------------------------------------

    /// Most profitable feasible (relay, server) pair for one task.
    ///
    /// Only relays with a free slot in the session ledger and active servers
    /// among `candidate_servers` are considered. The first pair wins ties.
    /// Returns [`OffloadingDecision::null`] when nothing is feasible or the
    /// task has no registered position.
    pub fn decide_single_task(
        &self,
        task: &Task,
        candidate_servers: &[ComputeServer],
    ) -> OffloadingDecision {
        let decision = self.best_pair(task, candidate_servers);
        let count = self.decisions.fetch_add(1, Ordering::Relaxed) + 1;

        tracing::debug!(
            decision = count,
            task = task.id(),
            relay = decision.relay_id.as_deref().unwrap_or("NONE"),
            server = decision.server_id.as_deref().unwrap_or("NONE"),
            cost = decision.estimated_cost,
            "single-task decision"
        );
        self.sink.record(DecisionRecord::from_decision(
            self.clock.now_millis(),
            task.id(),
            &decision,
        ));
        decision
    }

    fn best_pair(&self, task: &Task, candidate_servers: &[ComputeServer]) -> OffloadingDecision {
        let Some(ground) = self.positions.get(task.id()) else {
            tracing::debug!(task = task.id(), "no position registered for task");
            return OffloadingDecision::null();
        };

        let config = self.matcher.config();
        let mut best: Option<(&RelayNode, &ComputeServer, f64, f64)> = None;

        for relay in self.relays.iter().filter(|r| self.ledger.has_capacity(r.id())) {
            let sinr = comm::link_sinr(relay, ground);
            if sinr < config.sinr_threshold {
                continue;
            }
            for server in candidate_servers.iter().filter(|s| s.is_active()) {
                let latency = comm::total_latency(task, server.capacity(), sinr);
                if latency > task.deadline() {
                    continue;
                }
                let profit = matching::profit(config, task, sinr, server.capacity());
                if best.is_none_or(|(_, _, _, p)| profit > p) {
                    best = Some((relay, server, latency, profit));
                }
            }
        }

        let Some((relay, server, latency, profit)) = best else {
            return OffloadingDecision::null();
        };

        let cost = self.cost_model.breakdown(CostInput {
            compute_units: task.compute_units(),
            data_size_kb: task.data_size_kb(),
            execution_time_s: latency,
            power_watts: self.cost_model.rates().server_power_watts,
            deadline_s: Some(task.deadline()),
        });

        OffloadingDecision::assigned(relay.id(), server.id(), cost.total, latency, true, profit)
    }

    /// Reserve the relay slot a decision selected. Null decisions are ignored.
    pub fn commit(&mut self, decision: &OffloadingDecision) -> MatchingResult<()> {
        if let Some(relay_id) = &decision.relay_id {
            let load = self.ledger.increment(relay_id)?;
            tracing::trace!(relay = %relay_id, load, "relay slot reserved");
        }
        Ok(())
    }

    /// Give back a slot taken by [`commit`](Self::commit).
    pub fn release(&mut self, relay_id: &str) -> MatchingResult<()> {
        self.ledger.decrement(relay_id)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Session state
    // ------------------------------------------------------------------

    pub fn relay_load(&self, relay_id: &str) -> Option<usize> {
        self.ledger.load(relay_id)
    }

    pub fn ledger(&self) -> &CapacityLedger {
        &self.ledger
    }

    /// Matches plus single-task decisions made so far. Never decreases.
    pub fn decision_count(&self) -> u64 {
        self.decisions.load(Ordering::Relaxed)
    }

    /// Profit summed over every successful batch run.
    pub fn total_profit(&self) -> f64 {
        self.total_profit
    }
}
