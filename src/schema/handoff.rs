//! Hand-off record published to the independent oscillator controllers.

use serde::{Deserialize, Serialize};

use super::{Genotype, OSCILLATOR_COUNT, OscillatorParams};

/// Activation record for the oscillator actuators.
///
/// The trial core is the sole writer and deleter of this record. Absence of
/// the record, or `active == false`, means the actuators perform no motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffRecord {
    /// Whether the actuators should drive the published genotype.
    pub active: bool,
    /// Simulated seconds the genotype will be driven for.
    pub runtime_seconds: f64,
    /// Fixed simulation step in milliseconds.
    pub step_size_ms: u32,
    /// The genotype under test.
    pub genotype: Genotype,
}

impl HandoffRecord {
    /// Oscillator parameters for one module, if the index is in range.
    pub fn oscillator(&self, module_index: usize) -> Option<&OscillatorParams> {
        if module_index < OSCILLATOR_COUNT {
            Some(&self.genotype.oscillators[module_index])
        } else {
            None
        }
    }
}
