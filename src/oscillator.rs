//! Sinusoidal position commands for the module oscillators.
//!
//! This is the thin consumer side of the hand-off channel: each module
//! drives its joint with a single sine evaluated from the oscillator
//! parameters published for it.

use std::f64::consts::TAU;

use crate::schema::{HandoffRecord, OscillatorParams};

/// Joint position command in degrees for one oscillator at simulated time
/// `time_s`.
pub fn position_command(params: &OscillatorParams, time_s: f64) -> f64 {
    let phase_rad = params.phase_deg.to_radians();
    params.offset_deg
        + params.amplitude_deg * (TAU * params.frequency_hz * time_s + phase_rad).sin()
}

/// Position command for one module from a hand-off record.
///
/// `None` when the record is inactive or the module index is out of range;
/// the actuator then performs no motion.
pub fn module_command(record: &HandoffRecord, module_index: usize, time_s: f64) -> Option<f64> {
    if !record.active {
        return None;
    }
    record
        .oscillator(module_index)
        .map(|params| position_command(params, time_s))
}
