//! Genetic operators for the gait search.
//!
//! Provides random genotype generation, uniform per-gene crossover, and
//! Gaussian mutation.

use rand::prelude::*;

use crate::schema::{GENE_COUNT, Genotype, GenotypeBounds, OscillatorParams, Population};

/// Probability that a single gene is copied winner-to-loser during crossover.
pub const CROSSOVER_PROBABILITY: f64 = 0.5;

/// Expected number of mutated genes per mutation pass.
pub const AVERAGE_MUTATIONS: f64 = 1.0;

/// Standard deviation of the additive mutation noise, in the gene's own
/// units (degrees or Hz).
pub const MUTATION_STD_DEV: f64 = 0.21;

/// Random number generator wrapper for genotype operations.
pub struct GenotypeRng {
    rng: StdRng,
}

impl GenotypeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generate a random genotype, each parameter uniform within its bounds.
    pub fn random_genotype(&mut self, bounds: &GenotypeBounds) -> Genotype {
        Genotype {
            oscillators: std::array::from_fn(|_| OscillatorParams {
                amplitude_deg: self.uniform(bounds.amplitude_deg),
                offset_deg: self.uniform(bounds.offset_deg),
                phase_deg: self.uniform(bounds.phase_deg),
                frequency_hz: self.uniform(bounds.frequency_hz),
            }),
        }
    }

    /// Generate a random population of the given size.
    pub fn random_population(&mut self, size: usize, bounds: &GenotypeBounds) -> Population {
        Population::new((0..size).map(|_| self.random_genotype(bounds)).collect())
    }

    /// Uniform per-gene crossover: each of the loser's genes is replaced by
    /// the winner's corresponding gene with the given probability (in
    /// `[0, 1]`).
    ///
    /// The loser's genotype is rebuilt and written back wholesale.
    pub fn crossover(
        &mut self,
        population: &mut Population,
        winner: usize,
        loser: usize,
        probability: f64,
    ) {
        let (Some(winner_genotype), Some(loser_genotype)) =
            (population.get(winner), population.get(loser))
        else {
            return;
        };
        let winner_genotype = winner_genotype.clone();
        let mut infected = loser_genotype.clone();

        for (gene, donor) in infected
            .oscillators
            .iter_mut()
            .zip(winner_genotype.oscillators.iter())
        {
            if self.rng.gen_bool(probability) {
                gene.amplitude_deg = donor.amplitude_deg;
            }
            if self.rng.gen_bool(probability) {
                gene.offset_deg = donor.offset_deg;
            }
            if self.rng.gen_bool(probability) {
                gene.phase_deg = donor.phase_deg;
            }
            if self.rng.gen_bool(probability) {
                gene.frequency_hz = donor.frequency_hz;
            }
        }

        population.set(loser, infected);
    }

    /// Gaussian mutation: each gene independently receives additive
    /// N(0, 0.21) noise with probability `average_mutations / GENE_COUNT`.
    ///
    /// Mutated genes are not clamped back into the domain bounds; the bounds
    /// constrain creation only and evolved genes may drift outside them.
    pub fn mutate(&mut self, population: &mut Population, index: usize, average_mutations: f64) {
        let Some(genotype) = population.get(index) else {
            return;
        };
        let rate = average_mutations / GENE_COUNT as f64;
        let mut mutated = genotype.clone();

        for osc in &mut mutated.oscillators {
            if self.rng.gen_bool(rate) {
                osc.amplitude_deg += self.noise();
            }
            if self.rng.gen_bool(rate) {
                osc.offset_deg += self.noise();
            }
            if self.rng.gen_bool(rate) {
                osc.phase_deg += self.noise();
            }
            if self.rng.gen_bool(rate) {
                osc.frequency_hz += self.noise();
            }
        }

        population.set(index, mutated);
    }

    /// Pick a random individual index.
    pub fn pick_individual(&mut self, population_len: usize) -> usize {
        self.rng.gen_range(0..population_len)
    }

    /// Pick a random individual index distinct from `exclude`.
    ///
    /// `population_len` must be at least 2.
    pub fn pick_opponent(&mut self, population_len: usize, exclude: usize) -> usize {
        loop {
            let index = self.rng.gen_range(0..population_len);
            if index != exclude {
                return index;
            }
        }
    }

    /// Uniform random in bounds.
    fn uniform(&mut self, bounds: (f64, f64)) -> f64 {
        self.rng.gen_range(bounds.0..=bounds.1)
    }

    /// Zero-mean Gaussian mutation noise.
    fn noise(&mut self) -> f64 {
        let standard: f64 = self.rng.sample(rand_distr::StandardNormal);
        standard * MUTATION_STD_DEV
    }
}
