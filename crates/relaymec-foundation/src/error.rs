//! Error types of the foundation algorithms.
//!
//! Infeasibility is not an error anywhere in this crate: a task nobody can
//! serve is simply absent from the match set. These enums cover violated
//! preconditions and bookkeeping faults only.

use thiserror::Error;

use relaymec_kernel::config::ConfigError;

/// Faults raised inside a matching run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MatchingError {
    /// A task was handed to the matcher without a ground position.
    #[error("no position known for task '{0}'")]
    MissingPosition(String),

    /// An increment would push a relay past its capacity.
    #[error("relay '{relay_id}' is full ({capacity} tasks)")]
    CapacityExceeded { relay_id: String, capacity: usize },

    /// A relay id not present in the ledger.
    #[error("unknown relay '{0}'")]
    UnknownRelay(String),

    #[error("invalid matcher configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Faults raised by relay placement.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlacementError {
    /// Relays that carry no task cannot cover anything.
    #[error("relay capacity must be greater than zero")]
    ZeroCapacity,

    #[error("invalid placement configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

pub type MatchingResult<T> = Result<T, MatchingError>;
pub type PlacementResult<T> = Result<T, PlacementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_errors_convert_via_from() {
        let err: MatchingError = ConfigError::invalid("matcher.max_iterations", "must be > 0").into();
        assert!(matches!(err, MatchingError::InvalidConfig(_)));
        assert!(err.to_string().contains("matcher.max_iterations"));

        let err: PlacementError = ConfigError::invalid("placement.relay_capacity", "zero").into();
        assert!(err.to_string().contains("placement.relay_capacity"));
    }
}
