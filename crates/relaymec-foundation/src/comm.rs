//! Physical-layer link model for the ground device → relay hop.
//!
//! Every function here is pure. Path loss blends a line-of-sight and an
//! obstructed power law, weighted by an elevation-dependent logistic LoS
//! probability; rates follow Shannon capacity over 180 kHz resource blocks.
//!
//! Degenerate inputs are handled by the formulas themselves: a zero rate or
//! a zero server capacity gives an infinite delay rather than an error.

use std::f64::consts::PI;

use relaymec_kernel::{Position, RelayNode, Task};

// ============================================================================
// Constants
// ============================================================================

/// Carrier frequency, Hz.
pub const CARRIER_FREQUENCY_HZ: f64 = 2.4e9;
/// Speed of light, m/s.
pub const SPEED_OF_LIGHT: f64 = 3e8;
/// Thermal noise power at the receiver, W.
pub const NOISE_POWER_W: f64 = 1e-13;
/// Ground device transmit power, W.
pub const TRANSMIT_POWER_W: f64 = 0.1;
/// Bandwidth of one resource block, Hz.
pub const RESOURCE_BLOCK_HZ: f64 = 180e3;

/// Logistic LoS model parameter `A`.
pub const LOS_PARAM_A: f64 = 12.0;
/// Logistic LoS model parameter `B`, per degree.
pub const LOS_PARAM_B: f64 = 0.11;

/// Free-space exponent for the line-of-sight component.
pub const PATH_LOSS_EXP_LOS: f64 = 2.0;
/// Exponent for the obstructed component.
pub const PATH_LOSS_EXP_NLOS: f64 = 2.8;

/// Resource blocks granted to a task upload.
pub const UPLINK_RESOURCE_BLOCKS: u32 = 1;

const BITS_PER_KB: f64 = 1024.0 * 8.0;

// ============================================================================
// Link budget
// ============================================================================

/// Probability of a line-of-sight link at the given elevation angle (degrees).
///
/// `P(θ) = 1 / (1 + A·e^(−B·θ))`
pub fn los_probability(elevation_deg: f64) -> f64 {
    1.0 / (1.0 + LOS_PARAM_A * (-LOS_PARAM_B * elevation_deg).exp())
}

/// Free-space loss at the 1 m reference distance, `(4π/λ)²`.
pub fn reference_path_loss() -> f64 {
    let wavelength = SPEED_OF_LIGHT / CARRIER_FREQUENCY_HZ;
    ((4.0 * PI) / wavelength).powi(2)
}

/// Linear path loss over a slant distance, blended by LoS probability.
pub fn path_loss(distance_3d: f64, elevation_deg: f64) -> f64 {
    let p_los = los_probability(elevation_deg);
    let pl0 = reference_path_loss();

    let los = pl0 * distance_3d.powf(PATH_LOSS_EXP_LOS);
    let nlos = pl0 * distance_3d.powf(PATH_LOSS_EXP_NLOS);

    p_los * los + (1.0 - p_los) * nlos
}

/// Signal-to-interference-plus-noise ratio (linear).
///
/// Returns `+∞` when `interference + noise` is not positive.
pub fn sinr(distance_3d: f64, elevation_deg: f64, interference: f64) -> f64 {
    let received = TRANSMIT_POWER_W / path_loss(distance_3d, elevation_deg);
    let denominator = interference + NOISE_POWER_W;
    if denominator <= 0.0 {
        return f64::INFINITY;
    }
    received / denominator
}

/// SINR of the link between a ground point and a relay, without interference.
pub fn link_sinr(relay: &RelayNode, ground: &Position) -> f64 {
    sinr(relay.distance_3d(ground), relay.elevation_deg(ground), 0.0)
}

// ============================================================================
// Rates and delays
// ============================================================================

/// Shannon capacity in bits/s over `resource_blocks` blocks, floored at 0.
pub fn data_rate(sinr: f64, resource_blocks: u32) -> f64 {
    let bandwidth = f64::from(resource_blocks) * RESOURCE_BLOCK_HZ;
    (bandwidth * (1.0 + sinr).log2()).max(0.0)
}

/// Seconds needed to push `data_size_kb` at `rate_bps`; `+∞` for a dead link.
pub fn transmission_delay(data_size_kb: f64, rate_bps: f64) -> f64 {
    if rate_bps <= 0.0 {
        return f64::INFINITY;
    }
    data_size_kb * BITS_PER_KB / rate_bps
}

/// Seconds of processing on a server; `+∞` for a server without capacity.
pub fn processing_delay(compute_units: f64, server_capacity: f64) -> f64 {
    if server_capacity <= 0.0 {
        return f64::INFINITY;
    }
    compute_units / server_capacity
}

/// Upload over one resource block at `sinr` plus processing at the server.
pub fn total_latency(task: &Task, server_capacity: f64, sinr: f64) -> f64 {
    let rate = data_rate(sinr, UPLINK_RESOURCE_BLOCKS);
    transmission_delay(task.data_size_kb(), rate)
        + processing_delay(task.compute_units(), server_capacity)
}
