//! Relay placement by K-means clustering of device positions.
//!
//! The number of relays is the smallest count whose combined capacity covers
//! every task, bounded by the relays available:
//! `K = max(1, min(max_relays, ceil(n / capacity)))`.
//!
//! Initialization is seeded, so identical positions and an identical seed
//! always yield identical relays.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relaymec_kernel::{PlacementConfig, Position, PositionMap, RelayNode};

use crate::error::{PlacementError, PlacementResult};

/// Result of one clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub centroids: Vec<Position>,
    /// Cluster index of each input point, in input order.
    pub assignments: Vec<usize>,
    pub iterations: usize,
    pub converged: bool,
}

/// Relays produced by [`PlacementOptimizer::optimize`] plus diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementOutcome {
    pub relays: Vec<RelayNode>,
    pub iterations: usize,
    pub converged: bool,
}

/// Positions relays over a set of ground devices.
#[derive(Debug, Clone)]
pub struct PlacementOptimizer {
    config: PlacementConfig,
}

impl PlacementOptimizer {
    pub fn new(config: PlacementConfig) -> PlacementResult<Self> {
        if config.relay_capacity == 0 {
            return Err(PlacementError::ZeroCapacity);
        }
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Number of relays deployed for `num_tasks` tasks.
    pub fn relay_count(&self, num_tasks: usize) -> usize {
        let needed = num_tasks.div_ceil(self.config.relay_capacity);
        needed.min(self.config.max_relays).max(1)
    }

    /// Cluster the positions and put one relay on each centroid.
    ///
    /// Empty input gives no relays.
    pub fn optimize(&self, positions: &PositionMap) -> PlacementOutcome {
        if positions.is_empty() {
            tracing::warn!("no device positions provided, deploying no relays");
            return PlacementOutcome {
                relays: Vec::new(),
                iterations: 0,
                converged: true,
            };
        }

        let points: Vec<Position> = positions.values().copied().collect();
        let k = self.relay_count(points.len());
        tracing::debug!(
            devices = points.len(),
            relays = k,
            capacity = self.config.relay_capacity,
            "clustering device positions"
        );

        let clustering = kmeans(
            &points,
            k,
            self.config.seed,
            self.config.area_size,
            self.config.max_iterations,
            self.config.tolerance,
        );

        let relays: Vec<RelayNode> = clustering
            .centroids
            .iter()
            .enumerate()
            .map(|(i, c)| {
                RelayNode::new(
                    format!("relay-{i}"),
                    c.x,
                    c.y,
                    self.config.altitude,
                    self.config.relay_capacity,
                )
            })
            .collect();

        tracing::info!(
            relays = relays.len(),
            iterations = clustering.iterations,
            converged = clustering.converged,
            "relay placement complete"
        );

        PlacementOutcome {
            relays,
            iterations: clustering.iterations,
            converged: clustering.converged,
        }
    }
}

/// One-shot placement with default area and iteration limits.
pub fn optimize_relay_positions(
    positions: &PositionMap,
    max_relays: usize,
    altitude: f64,
    relay_capacity: usize,
    seed: u64,
) -> PlacementResult<Vec<RelayNode>> {
    let config = PlacementConfig::default()
        .with_max_relays(max_relays)
        .with_altitude(altitude)
        .with_relay_capacity(relay_capacity)
        .with_seed(seed);
    Ok(PlacementOptimizer::new(config)?.optimize(positions).relays)
}

// ============================================================================
// K-means
// ============================================================================

/// Lloyd's algorithm with seeded initialization.
///
/// Initial centroids are `k` distinct input positions drawn with the seed;
/// when fewer distinct positions exist, the rest are uniform points in
/// `[0, area_size)²`. Stops once no centroid moves more than `tolerance`,
/// or after `max_iterations` rounds. Always returns exactly `k` centroids for
/// non-empty input and `k ≥ 1`.
pub fn kmeans(
    points: &[Position],
    k: usize,
    seed: u64,
    area_size: f64,
    max_iterations: usize,
    tolerance: f64,
) -> Clustering {
    if points.is_empty() || k == 0 {
        return Clustering {
            centroids: Vec::new(),
            assignments: Vec::new(),
            iterations: 0,
            converged: true,
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = initial_centroids(points, k, area_size, &mut rng);
    let mut assignments = vec![0; points.len()];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        for (slot, point) in assignments.iter_mut().zip(points) {
            *slot = nearest_centroid(point, &centroids);
        }

        let mut sums = vec![(0.0, 0.0, 0usize); k];
        for (point, &cluster) in points.iter().zip(&assignments) {
            let entry = &mut sums[cluster];
            entry.0 += point.x;
            entry.1 += point.y;
            entry.2 += 1;
        }

        let mut moved = false;
        for (centroid, (sx, sy, n)) in centroids.iter_mut().zip(sums) {
            // Empty clusters keep their centroid.
            if n == 0 {
                continue;
            }
            let updated = Position::new(sx / n as f64, sy / n as f64);
            if (updated.x - centroid.x).abs() > tolerance
                || (updated.y - centroid.y).abs() > tolerance
            {
                moved = true;
            }
            *centroid = updated;
        }

        if !moved {
            converged = true;
            break;
        }
    }

    if converged {
        tracing::debug!(iterations, "k-means converged");
    } else {
        tracing::debug!(iterations, "k-means hit the iteration limit");
    }

    Clustering {
        centroids,
        assignments,
        iterations,
        converged,
    }
}

fn initial_centroids(
    points: &[Position],
    k: usize,
    area_size: f64,
    rng: &mut StdRng,
) -> Vec<Position> {
    let mut seen = HashSet::new();
    let distinct: Vec<Position> = points
        .iter()
        .filter(|p| seen.insert((p.x.to_bits(), p.y.to_bits())))
        .copied()
        .collect();

    let take = k.min(distinct.len());
    let mut centroids: Vec<Position> = rand::seq::index::sample(rng, distinct.len(), take)
        .into_iter()
        .map(|i| distinct[i])
        .collect();

    while centroids.len() < k {
        centroids.push(Position::new(
            rng.gen_range(0.0..area_size),
            rng.gen_range(0.0..area_size),
        ));
    }
    centroids
}

/// Index of the closest centroid; the lowest index wins ties.
fn nearest_centroid(point: &Position, centroids: &[Position]) -> usize {
    let mut nearest = 0;
    let mut best = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = point.distance_to(c);
        if d < best {
            best = d;
            nearest = i;
        }
    }
    nearest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> PositionMap {
        (0..n)
            .map(|i| {
                let x = (i % 10) as f64 * 100.0;
                let y = (i / 10) as f64 * 100.0;
                (format!("task-{i:03}"), Position::new(x, y))
            })
            .collect()
    }

    #[test]
    fn relay_count_follows_capacity() {
        let placer = PlacementOptimizer::new(
            PlacementConfig::default()
                .with_max_relays(4)
                .with_relay_capacity(10),
        )
        .unwrap();
        assert_eq!(placer.relay_count(0), 1);
        assert_eq!(placer.relay_count(1), 1);
        assert_eq!(placer.relay_count(10), 1);
        assert_eq!(placer.relay_count(11), 2);
        assert_eq!(placer.relay_count(1000), 4);
    }

    #[test]
    fn zero_capacity_is_an_error() {
        let err = PlacementOptimizer::new(PlacementConfig::default().with_relay_capacity(0));
        assert!(matches!(err, Err(PlacementError::ZeroCapacity)));
    }

    #[test]
    fn empty_input_yields_no_relays() {
        let relays = optimize_relay_positions(&PositionMap::new(), 3, 100.0, 2, 42).unwrap();
        assert!(relays.is_empty());
    }

    #[test]
    fn relays_share_altitude_and_capacity() {
        let relays = optimize_relay_positions(&grid(30), 5, 120.0, 7, 42).unwrap();
        assert_eq!(relays.len(), 5);
        for (i, relay) in relays.iter().enumerate() {
            assert_eq!(relay.id(), format!("relay-{i}"));
            assert_eq!(relay.altitude(), 120.0);
            assert_eq!(relay.capacity(), 7);
        }
    }

    #[test]
    fn placement_is_deterministic_for_a_seed() {
        let a = optimize_relay_positions(&grid(40), 4, 100.0, 10, 7).unwrap();
        let b = optimize_relay_positions(&grid(40), 4, 100.0, 10, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn pads_when_fewer_distinct_positions_than_k() {
        let points = vec![Position::new(10.0, 10.0); 5];
        let clustering = kmeans(&points, 3, 1, 1000.0, 100, 1e-6);
        assert_eq!(clustering.centroids.len(), 3);
        assert!(clustering.centroids.contains(&Position::new(10.0, 10.0)));
        for c in &clustering.centroids {
            assert!((0.0..1000.0).contains(&c.x));
            assert!((0.0..1000.0).contains(&c.y));
        }
    }

    #[test]
    fn separates_two_obvious_clusters() {
        let mut points = Vec::new();
        for i in 0..5 {
            points.push(Position::new(i as f64, 0.0));
            points.push(Position::new(900.0 + i as f64, 900.0));
        }
        let clustering = kmeans(&points, 2, 3, 1000.0, 100, 1e-6);
        assert!(clustering.converged);

        let mut centroids = clustering.centroids.clone();
        centroids.sort_by(|a, b| a.x.total_cmp(&b.x));
        assert!((centroids[0].x - 2.0).abs() < 1e-9);
        assert!((centroids[0].y - 0.0).abs() < 1e-9);
        assert!((centroids[1].x - 902.0).abs() < 1e-9);
        assert!((centroids[1].y - 900.0).abs() < 1e-9);

        // Points of the same group share a cluster.
        assert_eq!(clustering.assignments[0], clustering.assignments[2]);
        assert_ne!(clustering.assignments[0], clustering.assignments[1]);
    }

    #[test]
    fn always_returns_k_centroids() {
        let points: Vec<Position> = grid(25).values().copied().collect();
        for k in 1..=8 {
            let clustering = kmeans(&points, k, 11, 1000.0, 100, 1e-6);
            assert_eq!(clustering.centroids.len(), k);
        }
    }
}
