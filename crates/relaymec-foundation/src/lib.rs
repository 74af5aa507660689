//! RelayMEC foundation: the algorithms behind relay-assisted offloading.
//!
//! Ground devices upload tasks to aerial relays, which forward them to edge
//! compute servers. This crate places the relays, scores links, matches tasks
//! to (relay, server) pairs, prices assignments and makes live per-task
//! decisions. Shared types come from `relaymec-kernel`.

// comm module - link budget, rates and delays
pub mod comm;

// placement module - K-means relay positioning
pub mod placement;
pub use placement::{Clustering, PlacementOptimizer, PlacementOutcome, optimize_relay_positions};

// matching module - three-sided stable matching
pub mod matching;
pub use matching::{CapacityLedger, MatchOutcome, PreferenceTable, StableMatcher};

// cost module
pub mod cost;
pub use cost::{CostBreakdown, CostInput, CostModel};

// optimizer module - session facade
pub mod optimizer;
pub use optimizer::MatchingOptimizer;

// policy module
pub mod policy;
pub use policy::{AdaptivePolicy, OffloadingPolicy, StaticPolicy};

// metrics module - decision recording and statistics
pub mod metrics;
pub use metrics::{ChannelRecorder, DecisionCollector, SummaryStatistics, recording_channel};

// error module
pub mod error;
pub use error::{MatchingError, MatchingResult, PlacementError, PlacementResult};
