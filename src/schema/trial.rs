//! Trial state machine configuration types.
//!
//! `TrialConfiguration` is the single unit of persisted state: everything the
//! state machine needs to resume after the surrounding simulated world (and
//! the process driving it) has been torn down and relaunched.

use serde::{Deserialize, Serialize};

use super::{Genotype, Population};

/// States of the trial state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TrialState {
    /// Randomly initialize the population.
    #[default]
    SetupSimulation,
    /// Simulate the current individual and record its fitness.
    RunSimulation,
    /// Advance the pairing: queue the second competitor or resolve the winner.
    EvaluateSimulation,
    /// Select the best-ever individual for the final demonstration.
    SetupShowcase,
    /// Run the demonstration of the best individual.
    RunShowcase,
    /// Archive the configuration and reset for a future run.
    Shutdown,
}

/// Scalar metric used to rank individuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FitnessCriterion {
    /// Cumulative forward displacement over the trial.
    Distance,
    /// Forward velocity between consecutive samples.
    #[default]
    Velocity,
}

/// Static knobs for a search run, used to mint fresh configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialSettings {
    /// Number of individuals in the population.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Number of pairing competitions to run before the showcase.
    #[serde(default = "default_trials_total")]
    pub trials_total: u32,
    /// Simulated seconds each individual is given per trial.
    #[serde(default = "default_runtime_seconds")]
    pub runtime_seconds: f64,
    /// Fixed simulation step in milliseconds.
    #[serde(default = "default_step_size_ms")]
    pub step_size_ms: u32,
    /// Simulated seconds for the final showcase run.
    #[serde(default = "default_showcase_time_seconds")]
    pub showcase_time_seconds: f64,
    /// Metric used to rank individuals.
    #[serde(default)]
    pub fitness_criterion: FitnessCriterion,
    /// Random seed for reproducible runs.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for TrialSettings {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            trials_total: default_trials_total(),
            runtime_seconds: default_runtime_seconds(),
            step_size_ms: default_step_size_ms(),
            showcase_time_seconds: default_showcase_time_seconds(),
            fitness_criterion: FitnessCriterion::default(),
            random_seed: None,
        }
    }
}

fn default_population_size() -> usize {
    10
}
fn default_trials_total() -> u32 {
    30
}
fn default_runtime_seconds() -> f64 {
    10.0
}
fn default_step_size_ms() -> u32 {
    64
}
fn default_showcase_time_seconds() -> f64 {
    30.0
}

/// Full persisted state of the trial state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialConfiguration {
    /// Current state; the next invocation executes this state's transition.
    pub state: TrialState,
    /// The population under evolution.
    pub population: Population,
    /// Fixed population size.
    pub population_size: usize,
    /// Pairing competitions to run before the showcase.
    pub trials_total: u32,
    /// Completed pairing competitions.
    pub current_trial: u32,
    /// Simulated seconds per individual trial.
    pub runtime_seconds: f64,
    /// Fixed simulation step in milliseconds.
    pub step_size_ms: u32,
    /// Simulated seconds for the showcase run.
    pub showcase_time_seconds: f64,
    /// Metric used to rank individuals.
    pub fitness_criterion: FitnessCriterion,
    /// Individuals of the pairing in progress: 0, 1 or 2 indices.
    pub competed_pair: Vec<usize>,
    /// Individual to simulate next (or being showcased).
    pub current_individual: usize,
    /// Individuals already evaluated in the pairing in progress: 0 or 1.
    pub individuals_evaluated_this_pair: u8,
    /// Best fitness observed for each individual's most recent trial.
    pub fitness_values: Vec<f64>,
}

impl TrialConfiguration {
    /// Build a fresh configuration from settings and an initial population.
    pub fn fresh(settings: &TrialSettings, population: Population) -> Self {
        Self {
            state: TrialState::SetupSimulation,
            population_size: settings.population_size,
            trials_total: settings.trials_total,
            current_trial: 0,
            runtime_seconds: settings.runtime_seconds,
            step_size_ms: settings.step_size_ms,
            showcase_time_seconds: settings.showcase_time_seconds,
            fitness_criterion: settings.fitness_criterion,
            competed_pair: Vec::new(),
            current_individual: 0,
            individuals_evaluated_this_pair: 0,
            fitness_values: vec![0.0; settings.population_size],
            population,
        }
    }

    /// Genotype of an individual, if the index is in range.
    pub fn genotype(&self, index: usize) -> Option<&Genotype> {
        self.population.get(index)
    }

    /// Index of the individual with the globally highest recorded fitness.
    ///
    /// Ties resolve to the lowest index.
    pub fn best_individual(&self) -> usize {
        let mut best = 0;
        for (index, &fitness) in self.fitness_values.iter().enumerate() {
            if fitness > self.fitness_values[best] {
                best = index;
            }
        }
        best
    }

    /// Validate the configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::PopulationTooSmall);
        }
        if self.population.len() != self.population_size {
            return Err(ConfigError::PopulationSizeMismatch {
                expected: self.population_size,
                actual: self.population.len(),
            });
        }
        if self.fitness_values.len() != self.population_size {
            return Err(ConfigError::FitnessRecordSizeMismatch {
                expected: self.population_size,
                actual: self.fitness_values.len(),
            });
        }
        if self.current_trial > self.trials_total {
            return Err(ConfigError::TrialCountExceeded {
                current: self.current_trial,
                total: self.trials_total,
            });
        }
        if self.runtime_seconds <= 0.0 || self.showcase_time_seconds < 0.0 {
            return Err(ConfigError::InvalidRuntime);
        }
        if self.step_size_ms == 0 {
            return Err(ConfigError::InvalidStepSize);
        }
        if self.competed_pair.len() > 2 {
            return Err(ConfigError::InvalidPair);
        }
        if self.individuals_evaluated_this_pair > 1 {
            return Err(ConfigError::InvalidPairCounter(
                self.individuals_evaluated_this_pair,
            ));
        }
        if self.current_individual >= self.population_size {
            return Err(ConfigError::IndividualOutOfRange(self.current_individual));
        }
        for &index in &self.competed_pair {
            if index >= self.population_size {
                return Err(ConfigError::IndividualOutOfRange(index));
            }
        }
        Ok(())
    }
}

/// Configuration invariant violations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Population holds {actual} individuals, expected {expected}")]
    PopulationSizeMismatch { expected: usize, actual: usize },
    #[error("Fitness record holds {actual} entries, expected {expected}")]
    FitnessRecordSizeMismatch { expected: usize, actual: usize },
    #[error("Current trial {current} exceeds total {total}")]
    TrialCountExceeded { current: u32, total: u32 },
    #[error("Runtime and showcase durations must be positive")]
    InvalidRuntime,
    #[error("Step size must be non-zero")]
    InvalidStepSize,
    #[error("Competed pair holds more than two individuals")]
    InvalidPair,
    #[error("Pair evaluation counter {0} out of range")]
    InvalidPairCounter(u8),
    #[error("Individual index {0} out of range")]
    IndividualOutOfRange(usize),
}
