//! End-to-end scenarios: placement feeding matching feeding live dispatch.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relaymec_foundation::{
    AdaptivePolicy, MatchingOptimizer, OffloadingPolicy, PlacementOptimizer, StableMatcher,
};
use relaymec_kernel::{
    ComputeServer, MatcherConfig, OffloadConfig, PlacementConfig, PolicyConfig, Position,
    PositionMap, RelayNode, Task,
};

fn three_corner_tasks() -> (Vec<Task>, PositionMap) {
    let tasks = vec![
        Task::new("origin", 0.0, 1000.0, 100.0, 5.0),
        Task::new("centre", 0.0, 1000.0, 100.0, 5.0),
        Task::new("corner", 0.0, 1000.0, 100.0, 5.0),
    ];
    let positions = [
        ("origin", 0.0, 0.0),
        ("centre", 500.0, 500.0),
        ("corner", 999.0, 999.0),
    ]
    .into_iter()
    .map(|(id, x, y)| (id.to_string(), Position::new(x, y)))
    .collect();
    (tasks, positions)
}

fn random_workload(n: usize, seed: u64) -> (Vec<Task>, PositionMap) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tasks = Vec::with_capacity(n);
    let mut positions = PositionMap::new();
    for i in 0..n {
        let id = format!("task-{i:03}");
        tasks.push(Task::new(
            id.clone(),
            i as f64 * 0.1,
            rng.gen_range(1000.0..10_000.0),
            rng.gen_range(100.0..1000.0),
            rng.gen_range(5.0..30.0),
        ));
        positions.insert(
            id,
            Position::new(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0)),
        );
    }
    (tasks, positions)
}

fn servers() -> Vec<ComputeServer> {
    vec![
        ComputeServer::new("edge-a", 5000.0, 8192.0, 1e6),
        ComputeServer::new("edge-b", 8000.0, 16384.0, 1e6),
        ComputeServer::new("edge-c", 2500.0, 4096.0, 5e5),
    ]
}

#[test]
fn mutually_closest_tasks_share_a_relay() {
    let (tasks, positions) = three_corner_tasks();
    let relays = vec![
        RelayNode::new("upper", 750.0, 750.0, 100.0, 2),
        RelayNode::new("lower", 0.0, 0.0, 100.0, 2),
    ];
    let servers = vec![ComputeServer::new("edge", 5000.0, 8192.0, 1e6)];

    let mut optimizer = MatchingOptimizer::new(&OffloadConfig::default()).unwrap();
    let matches = optimizer.run_stable_matching(&tasks, &relays, &servers, &positions);
    assert_eq!(matches.len(), 3);

    let relay_of = |task: &str| {
        matches
            .iter()
            .find(|m| m.task_id() == task)
            .map(|m| m.relay_id().to_string())
            .unwrap()
    };
    assert_eq!(relay_of("centre"), relay_of("corner"));
    assert_ne!(relay_of("origin"), relay_of("centre"));

    assert_eq!(optimizer.relay_load("upper"), Some(2));
    assert_eq!(optimizer.relay_load("lower"), Some(1));
}

#[test]
fn placed_relays_never_overflow() {
    let (tasks, positions) = three_corner_tasks();
    let relays = PlacementOptimizer::new(
        PlacementConfig::default()
            .with_max_relays(2)
            .with_relay_capacity(2),
    )
    .unwrap()
    .optimize(&positions)
    .relays;
    assert_eq!(relays.len(), 2);

    let servers = vec![ComputeServer::new("edge", 5000.0, 8192.0, 1e6)];
    let outcome = StableMatcher::new(MatcherConfig::default())
        .unwrap()
        .run(&tasks, &relays, &servers, &positions)
        .unwrap();
    for relay in &relays {
        assert!(outcome.ledger.load(relay.id()).unwrap() <= 2);
    }
}

#[test]
fn every_match_respects_threshold_deadline_and_capacity() {
    let (tasks, positions) = random_workload(60, 9);
    let relays = PlacementOptimizer::new(
        PlacementConfig::default()
            .with_max_relays(4)
            .with_relay_capacity(10),
    )
    .unwrap()
    .optimize(&positions)
    .relays;
    let config = MatcherConfig::default();
    let outcome = StableMatcher::new(config.clone())
        .unwrap()
        .run(&tasks, &relays, &servers(), &positions)
        .unwrap();

    assert!(!outcome.matches.is_empty());
    let mut seen = HashSet::new();
    for m in &outcome.matches {
        assert!(seen.insert(m.task_id().to_string()), "{} matched twice", m.task_id());
        let task = tasks.iter().find(|t| t.id() == m.task_id()).unwrap();
        assert!(m.latency() <= task.deadline());
        assert!(m.signal_quality() >= config.sinr_threshold);
    }
    for relay in &relays {
        assert!(outcome.ledger.load(relay.id()).unwrap() <= relay.capacity());
    }
    assert!(outcome.matches.len() <= 40);
}

#[test]
fn identical_inputs_give_identical_results() {
    let run = || {
        let (tasks, positions) = random_workload(40, 3);
        let relays = PlacementOptimizer::new(PlacementConfig::default().with_seed(5))
            .unwrap()
            .optimize(&positions)
            .relays;
        let outcome = StableMatcher::new(MatcherConfig::default())
            .unwrap()
            .run(&tasks, &relays, &servers(), &positions)
            .unwrap();
        (relays, outcome.matches)
    };
    assert_eq!(run(), run());
}

#[test]
fn live_dispatch_stops_when_relays_fill_up() {
    let (tasks, positions) = three_corner_tasks();
    let mut optimizer = MatchingOptimizer::new(&OffloadConfig::default()).unwrap();
    optimizer.add_relay(RelayNode::new("only", 500.0, 500.0, 100.0, 1));
    for (id, position) in &positions {
        optimizer.add_position(id.clone(), *position);
    }
    let servers = servers();
    let mut policy = AdaptivePolicy::new(optimizer, PolicyConfig::default());

    let first = policy.make_decision(&tasks[1], &servers);
    assert!(!first.is_null());
    policy.optimizer_mut().commit(&first).unwrap();

    let second = policy.make_decision(&tasks[1], &servers);
    assert!(second.is_null());
    assert_eq!(policy.optimizer().relay_load("only"), Some(1));
    assert_eq!(policy.optimizer().decision_count(), 2);
}
