//! Core entities: tasks, relay nodes, compute servers and ground positions.
//!
//! These are plain data carriers. None of them holds run-scoped state; relay
//! load in particular is tracked per matching run by the foundation's
//! capacity ledger rather than on the relay itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Task identifier as issued by the execution harness.
pub type TaskId = String;
/// Relay node identifier.
pub type RelayId = String;
/// Compute server identifier.
pub type ServerId = String;

// ============================================================================
// Task
// ============================================================================

/// A unit of offloadable computation generated by a ground device.
///
/// Immutable after creation: fields are private and only exposed through
/// getters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    /// Arrival time in seconds of simulated time.
    arrival_time: f64,
    /// Compute demand in abstract compute-units (MI-like).
    compute_units: f64,
    /// Payload uploaded to the relay, in KB.
    data_size_kb: f64,
    /// Relative deadline in seconds.
    deadline: f64,
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        arrival_time: f64,
        compute_units: f64,
        data_size_kb: f64,
        deadline: f64,
    ) -> Self {
        Self {
            id: id.into(),
            arrival_time,
            compute_units,
            data_size_kb,
            deadline,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    pub fn compute_units(&self) -> f64 {
        self.compute_units
    }

    pub fn data_size_kb(&self) -> f64 {
        self.data_size_kb
    }

    pub fn deadline(&self) -> f64 {
        self.deadline
    }

    /// Ranking key used by servers: `data_size_kb × compute_units`.
    pub fn complexity(&self) -> f64 {
        self.data_size_kb * self.compute_units
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Task{{id={}, compute={:.0}, data={:.0}KB, deadline={:.2}s}}",
            self.id, self.compute_units, self.data_size_kb, self.deadline
        )
    }
}

// ============================================================================
// Position
// ============================================================================

/// Ground coordinate of a device, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance on the ground plane.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Task id → ground position.
///
/// Ordered so that anything iterating over positions (clustering in
/// particular) sees the same sequence for the same content.
pub type PositionMap = BTreeMap<TaskId, Position>;

// ============================================================================
// RelayNode
// ============================================================================

/// An aerial relay node hovering at a fixed altitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayNode {
    id: RelayId,
    position: Position,
    altitude: f64,
    /// Maximum number of tasks the relay may carry concurrently.
    capacity: usize,
}

impl RelayNode {
    pub fn new(id: impl Into<RelayId>, x: f64, y: f64, altitude: f64, capacity: usize) -> Self {
        Self {
            id: id.into(),
            position: Position::new(x, y),
            altitude,
            capacity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Move the relay on the horizontal plane. Altitude is fixed.
    pub fn update_position(&mut self, x: f64, y: f64) {
        self.position = Position::new(x, y);
    }

    /// Horizontal distance to a ground point.
    pub fn distance_2d(&self, ground: &Position) -> f64 {
        self.position.distance_to(ground)
    }

    /// Slant distance to a ground point, altitude included.
    pub fn distance_3d(&self, ground: &Position) -> f64 {
        let d = self.distance_2d(ground);
        (d * d + self.altitude * self.altitude).sqrt()
    }

    /// Elevation angle in degrees seen from the ground point.
    ///
    /// A ground point exactly below the relay is at 90°.
    pub fn elevation_deg(&self, ground: &Position) -> f64 {
        let d = self.distance_2d(ground);
        if d == 0.0 {
            return 90.0;
        }
        (self.altitude / d).atan().to_degrees()
    }
}

impl std::fmt::Display for RelayNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Relay{{id={}, pos=({:.1},{:.1},{:.1}), capacity={}}}",
            self.id, self.position.x, self.position.y, self.altitude, self.capacity
        )
    }
}

// ============================================================================
// ComputeServer
// ============================================================================

/// A fixed edge compute server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeServer {
    id: ServerId,
    /// Processing capacity in MIPS-like units.
    capacity: f64,
    /// Memory in MB.
    memory: f64,
    /// Storage in MB.
    storage: f64,
    /// Current utilization fraction, always within `[0, 1]`.
    utilization: f64,
    active: bool,
}

impl ComputeServer {
    pub fn new(id: impl Into<ServerId>, capacity: f64, memory: f64, storage: f64) -> Self {
        Self {
            id: id.into(),
            capacity,
            memory,
            storage,
            utilization: 0.0,
            active: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn memory(&self) -> f64 {
        self.memory
    }

    pub fn storage(&self) -> f64 {
        self.storage
    }

    pub fn utilization(&self) -> f64 {
        self.utilization
    }

    /// Set utilization, clamped into `[0, 1]`. NaN is treated as idle.
    pub fn set_utilization(&mut self, utilization: f64) {
        self.utilization = if utilization.is_nan() {
            0.0
        } else {
            utilization.clamp(0.0, 1.0)
        };
    }

    /// Builder-style variant of [`set_utilization`](Self::set_utilization).
    pub fn with_utilization(mut self, utilization: f64) -> Self {
        self.set_utilization(utilization);
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl std::fmt::Display for ComputeServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Server{{id={}, capacity={:.0}, mem={:.0}, utilization={:.2}%}}",
            self.id,
            self.capacity,
            self.memory,
            self.utilization * 100.0
        )
    }
}
