//! Recording contracts between the matching core and whatever observes it.
//!
//! The core only ever hands records to a [`DecisionSink`]; where they go from
//! there (an in-memory collector, an exporter) is not its concern.

use crate::decision::DecisionRecord;

// ---------------------------------------------------------------------------
// Clock abstraction (injectable for testing)
// ---------------------------------------------------------------------------

/// Provides the current wall-clock time as Unix-epoch milliseconds.
pub trait Clock: Send + Sync {
    /// Returns the current time as milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// The default [`Clock`] implementation backed by the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX)
    }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// DecisionSink
// ---------------------------------------------------------------------------

/// Receives decision records from the matching layer.
///
/// Implementations must never block and must never fail the caller: a sink
/// that cannot keep up drops records instead.
pub trait DecisionSink: Send + Sync {
    fn record(&self, record: DecisionRecord);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DecisionSink for NoopSink {
    fn record(&self, _record: DecisionRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn fixed_clock_never_moves() {
        let clock = FixedClock(1234);
        assert_eq!(clock.now_millis(), 1234);
        assert_eq!(clock.now_millis(), 1234);
    }
}
