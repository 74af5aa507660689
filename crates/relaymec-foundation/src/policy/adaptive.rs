use relaymec_kernel::{ComputeServer, OffloadingDecision, PolicyConfig, Task};

use super::OffloadingPolicy;
use crate::optimizer::MatchingOptimizer;

/// Tunes how readily late decisions are accepted from observed server load.
///
/// Busy servers push the aggression level up, idle ones pull it down. Below
/// the conservative threshold a decision that is not deadline-safe is turned
/// into an explicit rejection.
#[derive(Debug)]
pub struct AdaptivePolicy {
    optimizer: MatchingOptimizer,
    config: PolicyConfig,
    aggression_level: f64,
}

impl AdaptivePolicy {
    pub fn new(optimizer: MatchingOptimizer, config: PolicyConfig) -> Self {
        let aggression_level = config.initial_aggression.clamp(0.0, 1.0);
        Self {
            optimizer,
            config,
            aggression_level,
        }
    }

    pub fn aggression_level(&self) -> f64 {
        self.aggression_level
    }

    /// Clamped to `[0, 1]`.
    pub fn set_aggression_level(&mut self, level: f64) {
        self.aggression_level = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        };
    }
}

impl OffloadingPolicy for AdaptivePolicy {
    fn make_decision(&self, task: &Task, servers: &[ComputeServer]) -> OffloadingDecision {
        let decision = self.optimizer.decide_single_task(task, servers);
        if !decision.deadline_safe && self.aggression_level < self.config.conservative_below {
            tracing::debug!(
                task = task.id(),
                aggression = self.aggression_level,
                "rejecting deadline-unsafe decision"
            );
            return OffloadingDecision::rejected();
        }
        decision
    }

    fn update(&mut self, sim_time: f64, servers: &[ComputeServer]) {
        let mean = if servers.is_empty() {
            0.0
        } else {
            servers.iter().map(ComputeServer::utilization).sum::<f64>() / servers.len() as f64
        };

        let before = self.aggression_level;
        if mean > self.config.high_utilization {
            self.aggression_level = (before + self.config.step).min(1.0);
        } else if mean < self.config.low_utilization {
            self.aggression_level = (before - self.config.step).max(0.0);
        }

        if self.aggression_level != before {
            tracing::info!(
                sim_time,
                utilization = mean,
                aggression = self.aggression_level,
                "aggression level adjusted"
            );
        }
    }

    fn name(&self) -> &str {
        "AdaptivePolicy"
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

    fn policy() -> AdaptivePolicy {
        let mut optimizer = MatchingOptimizer::new(&OffloadConfig::default()).unwrap();
        optimizer.add_relay(RelayNode::new("r", 0.0, 0.0, 100.0, 4));
        optimizer.add_position("t", Position::new(0.0, 0.0));
        AdaptivePolicy::new(optimizer, PolicyConfig::default())
    }

    fn servers_at(utilization: f64) -> Vec<ComputeServer> {
        vec![
            ComputeServer::new("a", 5000.0, 4096.0, 1e5).with_utilization(utilization),
            ComputeServer::new("b", 5000.0, 4096.0, 1e5).with_utilization(utilization),
        ]
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn starts_balanced() {
        assert_eq!(policy().aggression_level(), 0.5);
    }

    #[test]
    fn dead_band_leaves_level_alone() {
        let mut p = policy();
        p.update(0.0, &servers_at(0.6));
        p.update(1.0, &servers_at(0.8));
        p.update(2.0, &servers_at(0.4));
        assert_eq!(p.aggression_level(), 0.5);
    }

    #[test]
    fn load_moves_level_in_steps() {
        let mut p = policy();
        p.update(0.0, &servers_at(0.9));
        assert_close(p.aggression_level(), 0.55);
        p.update(1.0, &servers_at(0.1));
        p.update(2.0, &servers_at(0.1));
        assert_close(p.aggression_level(), 0.45);
    }

    #[test]
    fn level_saturates_at_bounds() {
        let mut p = policy();
        for t in 0..30 {
            p.update(t as f64, &servers_at(1.0));
        }
        assert_eq!(p.aggression_level(), 1.0);
        for t in 0..30 {
            p.update(t as f64, &[]);
        }
        assert_eq!(p.aggression_level(), 0.0);
    }

    #[test]
    fn setter_clamps() {
        let mut p = policy();
        p.set_aggression_level(1.7);
        assert_eq!(p.aggression_level(), 1.0);
        p.set_aggression_level(-3.0);
        assert_eq!(p.aggression_level(), 0.0);
    }

    #[test]
    fn conservative_mode_rejects_unsafe_decisions() {
        let mut p = policy();
        let slow = vec![ComputeServer::new("slow", 100.0, 1024.0, 1e4)];
        let late = Task::new("t", 0.0, 1000.0, 10.0, 1.0);

        p.set_aggression_level(0.2);
        let rejected = p.make_decision(&late, &slow);
        assert_eq!(rejected, OffloadingDecision::rejected());
        assert_eq!(rejected.estimated_latency, 0.0);

        p.set_aggression_level(0.5);
        let passed = p.make_decision(&late, &slow);
        assert!(passed.is_null());
        assert!(passed.estimated_latency.is_infinite());
    }

    #[test]
    fn safe_decisions_always_pass() {
        let mut p = policy();
        p.set_aggression_level(0.0);
        let task = Task::new("t", 0.0, 1000.0, 100.0, 5.0);
        let decision = p.make_decision(&task, &servers_at(0.0));
        assert!(decision.deadline_safe);
        assert_eq!(decision.relay_id.as_deref(), Some("r"));
        assert_eq!(p.name(), "AdaptivePolicy");
    }
}
