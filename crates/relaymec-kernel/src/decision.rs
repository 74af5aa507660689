//! Outcome types produced by the matching layer.

use serde::{Deserialize, Serialize};

use crate::entity::{RelayId, ServerId, TaskId};

/// One accepted (task, relay, server) assignment from a batch matching run.
///
/// Only constructed once every feasibility check passed, and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchTriplet {
    task_id: TaskId,
    relay_id: RelayId,
    server_id: ServerId,
    /// Linear SINR achieved on the task → relay link.
    signal_quality: f64,
    /// Transmission plus processing delay, in seconds.
    latency: f64,
    profit: f64,
}

impl MatchTriplet {
    pub fn new(
        task_id: impl Into<TaskId>,
        relay_id: impl Into<RelayId>,
        server_id: impl Into<ServerId>,
        signal_quality: f64,
        latency: f64,
        profit: f64,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            relay_id: relay_id.into(),
            server_id: server_id.into(),
            signal_quality,
            latency,
            profit,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn relay_id(&self) -> &str {
        &self.relay_id
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn signal_quality(&self) -> f64 {
        self.signal_quality
    }

    pub fn latency(&self) -> f64 {
        self.latency
    }

    pub fn profit(&self) -> f64 {
        self.profit
    }
}

impl std::fmt::Display for MatchTriplet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Match{{task={}, relay={}, server={}, sinr={:.2}, latency={:.3}s, profit={:.4}}}",
            self.task_id,
            self.relay_id,
            self.server_id,
            self.signal_quality,
            self.latency,
            self.profit
        )
    }
}

/// Result of the single-task greedy path.
///
/// A decision with neither a relay nor a server selected means the task could
/// not be placed; see [`OffloadingDecision::null`] and
/// [`OffloadingDecision::rejected`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffloadingDecision {
    pub relay_id: Option<RelayId>,
    pub server_id: Option<ServerId>,
    pub estimated_cost: f64,
    /// Seconds; `+∞` for an infeasible task.
    pub estimated_latency: f64,
    pub deadline_safe: bool,
    pub expected_profit: f64,
}

impl OffloadingDecision {
    /// A feasible assignment.
    pub fn assigned(
        relay_id: impl Into<RelayId>,
        server_id: impl Into<ServerId>,
        estimated_cost: f64,
        estimated_latency: f64,
        deadline_safe: bool,
        expected_profit: f64,
    ) -> Self {
        Self {
            relay_id: Some(relay_id.into()),
            server_id: Some(server_id.into()),
            estimated_cost,
            estimated_latency,
            deadline_safe,
            expected_profit,
        }
    }

    /// Nothing feasible was found for the task.
    pub fn null() -> Self {
        Self {
            relay_id: None,
            server_id: None,
            estimated_cost: f64::MAX,
            estimated_latency: f64::INFINITY,
            deadline_safe: false,
            expected_profit: 0.0,
        }
    }

    /// An explicit refusal issued by a policy instead of passing through a
    /// late assignment.
    pub fn rejected() -> Self {
        Self {
            relay_id: None,
            server_id: None,
            estimated_cost: f64::MAX,
            estimated_latency: 0.0,
            deadline_safe: false,
            expected_profit: 0.0,
        }
    }

    /// True when no relay/server pair was selected.
    pub fn is_null(&self) -> bool {
        self.relay_id.is_none() && self.server_id.is_none()
    }
}

impl std::fmt::Display for OffloadingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Decision{{relay={}, server={}, cost={:.4}, latency={:.3}, safe={}}}",
            self.relay_id.as_deref().unwrap_or("NONE"),
            self.server_id.as_deref().unwrap_or("NONE"),
            self.estimated_cost,
            self.estimated_latency,
            self.deadline_safe
        )
    }
}

/// Flat record of one decision or match, suitable for any exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Unix-epoch milliseconds.
    pub timestamp_ms: u64,
    pub task_id: TaskId,
    pub relay_id: Option<RelayId>,
    pub server_id: Option<ServerId>,
    pub cost: f64,
    pub latency: f64,
    pub deadline_safe: bool,
}

impl DecisionRecord {
    pub fn from_decision(
        timestamp_ms: u64,
        task_id: impl Into<TaskId>,
        decision: &OffloadingDecision,
    ) -> Self {
        Self {
            timestamp_ms,
            task_id: task_id.into(),
            relay_id: decision.relay_id.clone(),
            server_id: decision.server_id.clone(),
            cost: decision.estimated_cost,
            latency: decision.estimated_latency,
            deadline_safe: decision.deadline_safe,
        }
    }

    /// Matches are deadline-safe by construction; `cost` carries the
    /// negated profit so that cheaper means better across both kinds.
    pub fn from_match(timestamp_ms: u64, triplet: &MatchTriplet) -> Self {
        Self {
            timestamp_ms,
            task_id: triplet.task_id.clone(),
            relay_id: Some(triplet.relay_id.clone()),
            server_id: Some(triplet.server_id.clone()),
            cost: -triplet.profit,
            latency: triplet.latency,
            deadline_safe: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_decision_is_unsafe_and_infinite() {
        let d = OffloadingDecision::null();
        assert!(d.is_null());
        assert!(!d.deadline_safe);
        assert!(d.estimated_latency.is_infinite());
    }

    #[test]
    fn rejected_decision_has_max_cost() {
        let d = OffloadingDecision::rejected();
        assert!(d.is_null());
        assert_eq!(d.estimated_cost, f64::MAX);
        assert!(!d.deadline_safe);
    }

    #[test]
    fn record_flattens_decision() {
        let d = OffloadingDecision::assigned("relay-0", "srv-1", 0.25, 1.5, true, 3.0);
        let rec = DecisionRecord::from_decision(42, "t-7", &d);
        assert_eq!(rec.timestamp_ms, 42);
        assert_eq!(rec.task_id, "t-7");
        assert_eq!(rec.relay_id.as_deref(), Some("relay-0"));
        assert_eq!(rec.server_id.as_deref(), Some("srv-1"));
        assert!(rec.deadline_safe);

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["task_id"], "t-7");
        assert_eq!(json["cost"], 0.25);
    }

    #[test]
    fn record_from_match_is_deadline_safe() {
        let m = MatchTriplet::new("t", "r", "s", 9.5, 0.4, 2.0);
        let rec = DecisionRecord::from_match(1, &m);
        assert!(rec.deadline_safe);
        assert_eq!(rec.cost, -2.0);
        assert_eq!(rec.latency, 0.4);
    }
}
