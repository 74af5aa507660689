//! Monetary cost of executing a task on an edge server.

use relaymec_kernel::CostRates;
use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: f64 = 3600.0;
const KB_PER_GB: f64 = 1024.0 * 1024.0;
const JOULES_PER_KWH: f64 = 3.6e6;

/// What a task consumes on its way through a server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostInput {
    pub compute_units: f64,
    pub data_size_kb: f64,
    /// Seconds from upload start to result.
    pub execution_time_s: f64,
    /// Average draw of the server while busy.
    pub power_watts: f64,
    /// Time past this many seconds is charged as an SLA penalty.
    pub deadline_s: Option<f64>,
}

/// Itemized cost; `total` is the sum of the four items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub compute_cost: f64,
    pub bandwidth_cost: f64,
    pub latency_penalty: f64,
    pub energy_cost: f64,
    pub total: f64,
}

impl std::fmt::Display for CostBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cost{{compute={:.6}, bw={:.6}, latency={:.6}, energy={:.6}, total={:.6}}}",
            self.compute_cost, self.bandwidth_cost, self.latency_penalty, self.energy_cost, self.total
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct CostModel {
    rates: CostRates,
}

impl CostModel {
    pub fn new(rates: CostRates) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &CostRates {
        &self.rates
    }

    pub fn breakdown(&self, input: CostInput) -> CostBreakdown {
        let compute_cost = self.compute_cost(input.compute_units);
        let bandwidth_cost = self.bandwidth_cost(input.data_size_kb);

        let overrun_s = input
            .deadline_s
            .map_or(0.0, |deadline| (input.execution_time_s - deadline).max(0.0));
        let latency_penalty = overrun_s * 1000.0 * self.rates.latency_penalty_per_ms;

        let energy_kwh = input.power_watts * input.execution_time_s / JOULES_PER_KWH;
        let energy_cost = energy_kwh * self.rates.energy_per_kwh;

        CostBreakdown {
            compute_cost,
            bandwidth_cost,
            latency_penalty,
            energy_cost,
            total: compute_cost + bandwidth_cost + latency_penalty + energy_cost,
        }
    }

    /// Compute plus bandwidth only, for quick comparisons.
    pub fn estimate(&self, compute_units: f64, data_size_kb: f64) -> f64 {
        self.compute_cost(compute_units) + self.bandwidth_cost(data_size_kb)
    }

    fn compute_cost(&self, compute_units: f64) -> f64 {
        let cpu_hours = compute_units / self.rates.reference_mips / SECONDS_PER_HOUR;
        cpu_hours * self.rates.compute_per_cpu_hour
    }

    fn bandwidth_cost(&self, data_size_kb: f64) -> f64 {
        data_size_kb / KB_PER_GB * self.rates.bandwidth_per_gb
    }
}
