//! Preference orders of the three sides of the market.

use relaymec_kernel::{ComputeServer, PositionMap, RelayNode, Task};

use crate::comm;
use crate::error::{MatchingError, MatchingResult};

/// Ranked indices into the task, relay and server slices of one run.
///
/// All sorts are stable, so equal keys keep input order.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceTable {
    /// Per task: relays by descending link SINR.
    pub task_to_relays: Vec<Vec<usize>>,
    /// Per task: the SINR towards each relay, indexed like the relay slice.
    pub task_sinr: Vec<Vec<f64>>,
    /// Per relay: servers by ascending processing capacity.
    pub relay_to_servers: Vec<Vec<usize>>,
    /// Per server: tasks by ascending complexity.
    ///
    /// Servers accept every proposal a relay forwards, so the matcher never
    /// reads this list. It is kept for inspecting a run.
    pub server_to_tasks: Vec<Vec<usize>>,
}

impl PreferenceTable {
    /// Build every preference list for a run.
    ///
    /// Fails if a task has no known position.
    pub fn build(
        tasks: &[Task],
        relays: &[RelayNode],
        servers: &[ComputeServer],
        positions: &PositionMap,
    ) -> MatchingResult<Self> {
        let mut task_to_relays = Vec::with_capacity(tasks.len());
        let mut task_sinr = Vec::with_capacity(tasks.len());
        for task in tasks {
            let ground = positions
                .get(task.id())
                .ok_or_else(|| MatchingError::MissingPosition(task.id().to_string()))?;

            let sinr: Vec<f64> = relays.iter().map(|r| comm::link_sinr(r, ground)).collect();
            let mut order: Vec<usize> = (0..relays.len()).collect();
            order.sort_by(|&a, &b| sinr[b].total_cmp(&sinr[a]));

            if let Some(&top) = order.first() {
                tracing::trace!(
                    task = task.id(),
                    relay = relays[top].id(),
                    sinr = sinr[top],
                    "task preference built"
                );
            }
            task_to_relays.push(order);
            task_sinr.push(sinr);
        }

        let mut by_capacity: Vec<usize> = (0..servers.len()).collect();
        by_capacity.sort_by(|&a, &b| servers[a].capacity().total_cmp(&servers[b].capacity()));
        let relay_to_servers = vec![by_capacity; relays.len()];

        let mut by_complexity: Vec<usize> = (0..tasks.len()).collect();
        by_complexity.sort_by(|&a, &b| tasks[a].complexity().total_cmp(&tasks[b].complexity()));
        let server_to_tasks = vec![by_complexity; servers.len()];

        Ok(Self {
            task_to_relays,
            task_sinr,
            relay_to_servers,
            server_to_tasks,
        })
    }

    /// Rank of a task in a server's list; lower is preferred. Diagnostics only.
    pub fn server_rank(&self, server: usize, task: usize) -> Option<usize> {
        self.server_to_tasks
            .get(server)?
            .iter()
            .position(|&t| t == task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaymec_kernel::Position;

    fn fixture() -> (Vec<Task>, Vec<RelayNode>, Vec<ComputeServer>, PositionMap) {
        let tasks = vec![
            Task::new("big", 0.0, 4000.0, 500.0, 10.0),
            Task::new("small", 0.0, 100.0, 10.0, 10.0),
            Task::new("mid", 0.0, 1000.0, 100.0, 10.0),
        ];
        let relays = vec![
            RelayNode::new("far", 900.0, 900.0, 100.0, 2),
            RelayNode::new("near", 0.0, 0.0, 100.0, 2),
        ];
        let servers = vec![
            ComputeServer::new("heavy", 20_000.0, 8192.0, 1e6),
            ComputeServer::new("light", 2_000.0, 2048.0, 1e5),
            ComputeServer::new("medium", 8_000.0, 4096.0, 1e5),
        ];
        let positions: PositionMap = [
            ("big".to_string(), Position::new(10.0, 10.0)),
            ("small".to_string(), Position::new(880.0, 900.0)),
            ("mid".to_string(), Position::new(0.0, 0.0)),
        ]
        .into_iter()
        .collect();
        (tasks, relays, servers, positions)
    }

    #[test]
    fn tasks_prefer_stronger_links() {
        let (tasks, relays, servers, positions) = fixture();
        let prefs = PreferenceTable::build(&tasks, &relays, &servers, &positions).unwrap();
        assert_eq!(prefs.task_to_relays[0], vec![1, 0]);
        assert_eq!(prefs.task_to_relays[1], vec![0, 1]);
        assert!(prefs.task_sinr[0][1] > prefs.task_sinr[0][0]);
    }

    #[test]
    fn relays_prefer_lighter_servers() {
        let (tasks, relays, servers, positions) = fixture();
        let prefs = PreferenceTable::build(&tasks, &relays, &servers, &positions).unwrap();
        for list in &prefs.relay_to_servers {
            assert_eq!(list, &vec![1, 2, 0]);
        }
    }

    #[test]
    fn servers_prefer_simpler_tasks() {
        let (tasks, relays, servers, positions) = fixture();
        let prefs = PreferenceTable::build(&tasks, &relays, &servers, &positions).unwrap();
        assert_eq!(prefs.server_to_tasks[0], vec![1, 2, 0]);
        assert_eq!(prefs.server_rank(0, 1), Some(0));
        assert_eq!(prefs.server_rank(0, 0), Some(2));
        assert_eq!(prefs.server_rank(9, 0), None);
    }

    #[test]
    fn missing_position_is_reported() {
        let (tasks, relays, servers, mut positions) = fixture();
        positions.remove("mid");
        let err = PreferenceTable::build(&tasks, &relays, &servers, &positions).unwrap_err();
        assert!(matches!(err, MatchingError::MissingPosition(id) if id == "mid"));
    }
}
