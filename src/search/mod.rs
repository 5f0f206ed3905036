//! Evolutionary trial search for locomotion gaits.
//!
//! The search is a persisted state machine that survives process
//! termination and relaunch, orchestrates one simulated trial at a time,
//! scores individuals by measured physical displacement, and applies
//! asymmetric genetic operators between tournament rounds.
//!
//! # Overview
//!
//! - **Genetic Operators** (`operators`): random initialization, uniform
//!   per-gene crossover, Gaussian mutation
//! - **Fitness Evaluators** (`fitness`): distance and velocity metrics over
//!   position samples
//! - **Simulation Host** (`host`): opaque interface to the simulated world
//! - **Trial State Machine** (`trial`): one transition per invocation
//! - **Driver** (`driver`): load → step → persist → reset discipline

mod driver;
mod fitness;
mod host;
mod operators;
mod trial;

#[cfg(test)]
pub(crate) mod testutil;

pub use driver::TrialDriver;
pub use fitness::{FitnessEvaluator, Position3};
pub use host::{SimulationHost, StepOutcome};
pub use operators::{
    AVERAGE_MUTATIONS, CROSSOVER_PROBABILITY, GenotypeRng, MUTATION_STD_DEV,
};
pub use trial::{Transition, TrialError, TrialMachine};
