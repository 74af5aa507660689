//! Per-task offloading policies used during live dispatch.
//!
//! A policy wraps a [`MatchingOptimizer`] and decides, task by task, whether
//! and where to offload. Policies may adapt to the load they observe through
//! [`OffloadingPolicy::update`].

mod adaptive;

pub use adaptive::AdaptivePolicy;

use relaymec_kernel::{ComputeServer, OffloadingDecision, Task};

use crate::optimizer::MatchingOptimizer;

pub trait OffloadingPolicy: Send + Sync {
    /// Decide where `task` runs among `servers`.
    fn make_decision(&self, task: &Task, servers: &[ComputeServer]) -> OffloadingDecision;

    /// Feed back the server state observed at `sim_time` seconds.
    fn update(&mut self, sim_time: f64, servers: &[ComputeServer]);

    fn name(&self) -> &str;

    fn optimizer(&self) -> &MatchingOptimizer;

    fn optimizer_mut(&mut self) -> &mut MatchingOptimizer;
}

/// Hands every decision of the optimizer through unchanged.
#[derive(Debug)]
pub struct StaticPolicy {
    optimizer: MatchingOptimizer,
}

impl StaticPolicy {
    pub fn new(optimizer: MatchingOptimizer) -> Self {
        Self { optimizer }
    }
}

impl OffloadingPolicy for StaticPolicy {
    fn make_decision(&self, task: &Task, servers: &[ComputeServer]) -> OffloadingDecision {
        self.optimizer.decide_single_task(task, servers)
    }

    fn update(&mut self, _sim_time: f64, _servers: &[ComputeServer]) {}

    fn name(&self) -> &str {
        "StaticPolicy"
    }

    fn optimizer(&self) -> &MatchingOptimizer {
        &self.optimizer
    }

    fn optimizer_mut(&mut self) -> &mut MatchingOptimizer {
        &mut self.optimizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaymec_kernel::{OffloadConfig, Position, RelayNode};

    #[test]
    fn static_policy_passes_decisions_through() {
        let mut optimizer = MatchingOptimizer::new(&OffloadConfig::default()).unwrap();
        optimizer.add_relay(RelayNode::new("r", 0.0, 0.0, 100.0, 1));
        optimizer.add_position("t", Position::new(0.0, 0.0));
        let mut policy = StaticPolicy::new(optimizer);
        let servers = vec![ComputeServer::new("s", 100.0, 1024.0, 1e4)];

        // 10 s of processing against a 1 s deadline.
        let late = Task::new("t", 0.0, 1000.0, 10.0, 1.0);
        let decision = policy.make_decision(&late, &servers);
        assert!(decision.is_null());
        assert!(decision.estimated_latency.is_infinite());

        policy.update(1.0, &servers);
        assert_eq!(policy.name(), "StaticPolicy");
        assert_eq!(policy.optimizer().decision_count(), 1);
    }
}
