//! RelayMEC kernel: the shared vocabulary of the offloading core.
//!
//! Holds the data model (tasks, relays, servers, positions), the outcome
//! types produced by matching, typed settings with their loader, the
//! crate-level error, and the recording contracts. Algorithms live in
//! `relaymec-foundation`; the kernel never depends on it.

// entity module
pub mod entity;
pub use entity::{
    ComputeServer, Position, PositionMap, RelayId, RelayNode, ServerId, Task, TaskId,
};

// decision module
pub mod decision;
pub use decision::{DecisionRecord, MatchTriplet, OffloadingDecision};

// metrics module
pub mod metrics;
pub use metrics::{Clock, DecisionSink, FixedClock, NoopSink, SystemClock};

// config module
pub mod config;

// settings module
pub mod settings;
pub use settings::{CostRates, MatcherConfig, OffloadConfig, PlacementConfig, PolicyConfig};

// error module
pub mod error;
pub use error::{IntoKernelReport, KernelError, KernelResult};
