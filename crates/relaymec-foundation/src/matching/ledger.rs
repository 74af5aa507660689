//! Run-scoped relay load accounting.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use relaymec_kernel::RelayNode;

use crate::error::{MatchingError, MatchingResult};

/// Load carried by each relay during one matching run.
///
/// The matcher builds one per run, so every relay starts at zero. Increments
/// never push a relay past its capacity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityLedger {
    slots: HashMap<String, Slot>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    load: usize,
    capacity: usize,
}

impl CapacityLedger {
    /// Empty ledger for the given relays.
    ///
    /// Duplicate ids share one slot holding the smallest of their capacities.
    pub fn new(relays: &[RelayNode]) -> Self {
        let mut ledger = Self {
            slots: HashMap::with_capacity(relays.len()),
        };
        for relay in relays {
            ledger.ensure(relay);
        }
        ledger
    }

    /// Whether the relay can take one more task. Unknown relays cannot.
    pub fn has_capacity(&self, relay_id: &str) -> bool {
        self.slots
            .get(relay_id)
            .is_some_and(|slot| slot.load < slot.capacity)
    }

    pub fn load(&self, relay_id: &str) -> Option<usize> {
        self.slots.get(relay_id).map(|slot| slot.load)
    }

    /// Free slots left on the relay; 0 for unknown relays.
    pub fn remaining(&self, relay_id: &str) -> usize {
        self.slots
            .get(relay_id)
            .map_or(0, |slot| slot.capacity.saturating_sub(slot.load))
    }

    /// Assign one more task to the relay.
    pub fn increment(&mut self, relay_id: &str) -> MatchingResult<usize> {
        let slot = self
            .slots
            .get_mut(relay_id)
            .ok_or_else(|| MatchingError::UnknownRelay(relay_id.to_string()))?;
        if slot.load >= slot.capacity {
            return Err(MatchingError::CapacityExceeded {
                relay_id: relay_id.to_string(),
                capacity: slot.capacity,
            });
        }
        slot.load += 1;
        Ok(slot.load)
    }

    /// Release one task from the relay. Saturates at zero.
    pub fn decrement(&mut self, relay_id: &str) -> MatchingResult<usize> {
        let slot = self
            .slots
            .get_mut(relay_id)
            .ok_or_else(|| MatchingError::UnknownRelay(relay_id.to_string()))?;
        slot.load = slot.load.saturating_sub(1);
        Ok(slot.load)
    }

    /// Fraction of the relay's capacity still free, in `[0, 1]`.
    pub fn available_ratio(&self, relay_id: &str) -> f64 {
        match self.slots.get(relay_id) {
            Some(slot) if slot.capacity > 0 => {
                slot.capacity.saturating_sub(slot.load) as f64 / slot.capacity as f64
            }
            _ => 0.0,
        }
    }

    /// Total load across all relays.
    pub fn total_load(&self) -> usize {
        self.slots.values().map(|slot| slot.load).sum()
    }

    /// Make sure the relay has a slot, keeping any load it already carries.
    ///
    /// A second relay under a known id tightens the slot to the smaller
    /// capacity.
    pub(crate) fn ensure(&mut self, relay: &RelayNode) {
        match self.slots.entry(relay.id().to_string()) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                tracing::warn!(
                    relay = relay.id(),
                    capacity = slot.capacity.min(relay.capacity()),
                    "duplicate relay id shares one slot"
                );
                slot.capacity = slot.capacity.min(relay.capacity());
            }
            Entry::Vacant(entry) => {
                entry.insert(Slot {
                    load: 0,
                    capacity: relay.capacity(),
                });
            }
        }
    }

    /// Take over the slots of a finished run.
    ///
    /// Relays that took part in the run get the run's load; every other slot
    /// keeps its load.
    pub(crate) fn merge_run(&mut self, run: CapacityLedger) {
        self.slots.extend(run.slots);
    }
}
