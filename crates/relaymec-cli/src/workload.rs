//! Seeded synthetic workloads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relaymec_kernel::{ComputeServer, Position, PositionMap, Task};

/// Seconds between consecutive task arrivals.
const ARRIVAL_INTERVAL_S: f64 = 10.0;

/// Devices, their tasks and the edge servers behind the relays.
#[derive(Debug, Clone)]
pub struct Workload {
    /// Ordered by arrival time.
    pub tasks: Vec<Task>,
    pub positions: PositionMap,
    pub servers: Vec<ComputeServer>,
}

/// Draw `num_tasks` devices uniformly over a square of side `area_size`.
///
/// Tasks need 1000 to 9999 compute units, carry 100 to 999 KB and must finish
/// within 5 to 30 s. Identical arguments always give the same workload.
pub fn generate(num_tasks: usize, num_servers: usize, seed: u64, area_size: f64) -> Workload {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut tasks = Vec::with_capacity(num_tasks);
    let mut positions = PositionMap::new();
    for i in 0..num_tasks {
        let id = format!("task-{i:04}");
        tasks.push(Task::new(
            id.clone(),
            i as f64 * ARRIVAL_INTERVAL_S,
            f64::from(1000 + rng.gen_range(0..9000u32)),
            f64::from(100 + rng.gen_range(0..900u32)),
            rng.gen_range(5.0..30.0),
        ));
        positions.insert(
            id,
            Position::new(rng.gen_range(0.0..area_size), rng.gen_range(0.0..area_size)),
        );
    }

    let servers = (0..num_servers)
        .map(|i| ComputeServer::new(format!("mec-{i}"), 10_000.0, 4096.0, 100_000.0))
        .collect();

    Workload {
        tasks,
        positions,
        servers,
    }
}
