//! Typed settings for every tunable part of the offloading core.
//!
//! Every section deserializes with defaults, so a settings file only has to
//! mention the values it overrides:
//!
//! ```yaml
//! matcher:
//!   sinr_threshold: 2.0
//! placement:
//!   max_relays: 8
//!   seed: 7
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult};
#[cfg(feature = "config")]
use crate::error::{IntoKernelReport, KernelResult};
#[cfg(feature = "config")]
use error_stack::ResultExt;

/// Root settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadConfig {
    pub matcher: MatcherConfig,
    pub placement: PlacementConfig,
    pub cost: CostRates,
    pub policy: PolicyConfig,
}

impl OffloadConfig {
    /// Check every section, reporting the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        self.matcher.validate()?;
        self.placement.validate()?;
        self.cost.validate()?;
        self.policy.validate()
    }

    /// Read, parse and validate a settings file.
    #[cfg(feature = "config")]
    pub fn load(path: &str) -> KernelResult<Self> {
        let config: Self = crate::config::load_config(path)
            .into_report()
            .attach(format!("loading settings from {path}"))?;
        config
            .validate()
            .into_report()
            .attach(format!("validating settings from {path}"))?;
        Ok(config)
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// Pricing and feasibility parameters of the three-sided matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Revenue per KB per Mbps of achieved rate.
    pub revenue_param: f64,
    /// Cost per KB per second of processing.
    pub cost_param: f64,
    /// Minimum linear SINR for a task → relay link.
    pub sinr_threshold: f64,
    /// Upper bound on matching passes.
    pub max_iterations: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            revenue_param: 0.01,
            cost_param: 0.005,
            sinr_threshold: 1.0,
            max_iterations: 100,
        }
    }
}

impl MatcherConfig {
    pub fn with_sinr_threshold(mut self, threshold: f64) -> Self {
        self.sinr_threshold = threshold;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_pricing(mut self, revenue_param: f64, cost_param: f64) -> Self {
        self.revenue_param = revenue_param;
        self.cost_param = cost_param;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_iterations == 0 {
            return Err(ConfigError::invalid("matcher.max_iterations", "must be > 0"));
        }
        if self.sinr_threshold.is_nan() || self.sinr_threshold < 0.0 {
            return Err(ConfigError::invalid(
                "matcher.sinr_threshold",
                "must be a non-negative number",
            ));
        }
        if !self.revenue_param.is_finite() || !self.cost_param.is_finite() {
            return Err(ConfigError::invalid(
                "matcher.revenue_param",
                "pricing parameters must be finite",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Placement
// ============================================================================

/// K-means relay placement parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Relays available for deployment.
    pub max_relays: usize,
    /// Shared flight altitude, metres.
    pub altitude: f64,
    /// Tasks each relay may carry.
    pub relay_capacity: usize,
    /// Seed for centroid initialization.
    pub seed: u64,
    /// Side of the square coverage area used when padding centroids, metres.
    pub area_size: f64,
    pub max_iterations: usize,
    /// Convergence tolerance on centroid movement, metres.
    pub tolerance: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_relays: 5,
            altitude: 100.0,
            relay_capacity: 10,
            seed: 42,
            area_size: 1000.0,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

impl PlacementConfig {
    pub fn with_max_relays(mut self, max_relays: usize) -> Self {
        self.max_relays = max_relays;
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    pub fn with_relay_capacity(mut self, capacity: usize) -> Self {
        self.relay_capacity = capacity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.relay_capacity == 0 {
            return Err(ConfigError::invalid("placement.relay_capacity", "must be > 0"));
        }
        if !(self.altitude > 0.0) {
            return Err(ConfigError::invalid("placement.altitude", "must be > 0"));
        }
        if !(self.area_size > 0.0) {
            return Err(ConfigError::invalid("placement.area_size", "must be > 0"));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::invalid("placement.max_iterations", "must be > 0"));
        }
        Ok(())
    }
}

// ============================================================================
// Cost
// ============================================================================

/// Unit prices used by the cost model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRates {
    /// $ per CPU-hour at `reference_mips`.
    pub compute_per_cpu_hour: f64,
    /// $ per GB transferred.
    pub bandwidth_per_gb: f64,
    /// $ per millisecond past the deadline.
    pub latency_penalty_per_ms: f64,
    /// $ per kWh.
    pub energy_per_kwh: f64,
    /// MIPS of one reference CPU.
    pub reference_mips: f64,
    /// Draw of a busy edge server, watts.
    pub server_power_watts: f64,
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            compute_per_cpu_hour: 0.0001,
            bandwidth_per_gb: 0.00001,
            latency_penalty_per_ms: 0.01,
            energy_per_kwh: 0.1,
            reference_mips: 1000.0,
            server_power_watts: 50.0,
        }
    }
}

impl CostRates {
    pub fn new(
        compute_per_cpu_hour: f64,
        bandwidth_per_gb: f64,
        latency_penalty_per_ms: f64,
        energy_per_kwh: f64,
    ) -> Self {
        Self {
            compute_per_cpu_hour,
            bandwidth_per_gb,
            latency_penalty_per_ms,
            energy_per_kwh,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.reference_mips > 0.0) {
            return Err(ConfigError::invalid("cost.reference_mips", "must be > 0"));
        }
        let rates = [
            ("cost.compute_per_cpu_hour", self.compute_per_cpu_hour),
            ("cost.bandwidth_per_gb", self.bandwidth_per_gb),
            ("cost.latency_penalty_per_ms", self.latency_penalty_per_ms),
            ("cost.energy_per_kwh", self.energy_per_kwh),
            ("cost.server_power_watts", self.server_power_watts),
        ];
        for (field, value) in rates {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::invalid(field, "must be a non-negative number"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Feedback parameters of the adaptive offloading policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub initial_aggression: f64,
    /// Change applied per update outside the dead band.
    pub step: f64,
    /// Mean utilization above which the policy grows more aggressive.
    pub high_utilization: f64,
    /// Mean utilization below which the policy grows more conservative.
    pub low_utilization: f64,
    /// Aggression level under which late decisions are rejected.
    pub conservative_below: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            initial_aggression: 0.5,
            step: 0.05,
            high_utilization: 0.8,
            low_utilization: 0.4,
            conservative_below: 0.5,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.initial_aggression) {
            return Err(ConfigError::invalid(
                "policy.initial_aggression",
                "must lie in [0, 1]",
            ));
        }
        if self.step.is_nan() || self.step < 0.0 {
            return Err(ConfigError::invalid("policy.step", "must be >= 0"));
        }
        if !(self.low_utilization <= self.high_utilization) {
            return Err(ConfigError::invalid(
                "policy.low_utilization",
                format!(
                    "dead band [{}, {}] is empty",
                    self.low_utilization, self.high_utilization
                ),
            ));
        }
        Ok(())
    }
}
