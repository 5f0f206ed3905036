//! Genotype and population types for the gait search.

use serde::{Deserialize, Serialize};

/// Number of chain-jointed modules, one oscillator each.
pub const OSCILLATOR_COUNT: usize = 8;

/// Parameters per oscillator (amplitude, offset, phase, frequency).
pub const PARAMS_PER_OSCILLATOR: usize = 4;

/// Total scalar genes in one genotype.
pub const GENE_COUNT: usize = OSCILLATOR_COUNT * PARAMS_PER_OSCILLATOR;

/// Parameters of a single module oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParams {
    /// Swing amplitude in degrees.
    pub amplitude_deg: f64,
    /// Constant offset added to the swing, in degrees.
    pub offset_deg: f64,
    /// Initial phase in degrees.
    pub phase_deg: f64,
    /// Oscillation frequency in Hz.
    pub frequency_hz: f64,
}

/// One individual's full set of oscillator behaviors.
///
/// Produced wholesale by the genetic operators; a genotype is never patched
/// field-by-field across operator invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    /// Per-module oscillator parameters, indexed by module position in the chain.
    pub oscillators: [OscillatorParams; OSCILLATOR_COUNT],
}

impl Genotype {
    /// Iterate over all oscillators.
    pub fn iter(&self) -> impl Iterator<Item = &OscillatorParams> {
        self.oscillators.iter()
    }
}

/// Domain bounds for each oscillator parameter, applied at creation time.
///
/// Mutation is deliberately allowed to drift genes outside these bounds;
/// they constrain random initialization only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenotypeBounds {
    /// Amplitude bounds in degrees.
    pub amplitude_deg: (f64, f64),
    /// Offset bounds in degrees.
    pub offset_deg: (f64, f64),
    /// Phase bounds in degrees.
    pub phase_deg: (f64, f64),
    /// Frequency bounds in Hz.
    pub frequency_hz: (f64, f64),
}

impl Default for GenotypeBounds {
    fn default() -> Self {
        Self {
            amplitude_deg: (0.0, 60.0),
            offset_deg: (-15.0, 15.0),
            phase_deg: (0.0, 360.0),
            frequency_hz: (0.0, 1.5),
        }
    }
}

impl GenotypeBounds {
    /// Check whether every parameter of a genotype lies within its bounds.
    pub fn contains(&self, genotype: &Genotype) -> bool {
        genotype.iter().all(|osc| {
            in_bounds(osc.amplitude_deg, self.amplitude_deg)
                && in_bounds(osc.offset_deg, self.offset_deg)
                && in_bounds(osc.phase_deg, self.phase_deg)
                && in_bounds(osc.frequency_hz, self.frequency_hz)
        })
    }
}

fn in_bounds(value: f64, bounds: (f64, f64)) -> bool {
    value >= bounds.0 && value <= bounds.1
}

/// Fixed-size collection of genotypes.
///
/// Insertion order is the individual's identity: indices are stable and the
/// size never changes after initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    individuals: Vec<Genotype>,
}

impl Population {
    /// Create a population from a list of genotypes.
    pub fn new(individuals: Vec<Genotype>) -> Self {
        Self { individuals }
    }

    /// Number of individuals.
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Whether the population holds no individuals.
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Get an individual by index.
    pub fn get(&self, index: usize) -> Option<&Genotype> {
        self.individuals.get(index)
    }

    /// Replace an individual's genotype wholesale.
    ///
    /// Out-of-range indices are ignored; callers validate indices against the
    /// trial configuration before operating.
    pub fn set(&mut self, index: usize, genotype: Genotype) {
        if let Some(slot) = self.individuals.get_mut(index) {
            *slot = genotype;
        }
    }

    /// Iterate over all individuals in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Genotype> {
        self.individuals.iter()
    }
}
