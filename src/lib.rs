//! Tournament-style evolution of locomotion gaits for a chain-jointed
//! modular robot.
//!
//! The crate evolves per-module oscillator parameters by repeatedly
//! simulating candidate configurations and competing pairs of individuals
//! against each other. The hard part is not the oscillator motion (a
//! single sine per module) but the trial driver: a persisted state machine
//! that survives process teardown, orchestrates one simulated trial at a
//! time, scores individuals by measured displacement, and applies genetic
//! operators between tournament rounds while the surrounding simulated
//! world is destroyed and recreated between phases.
//!
//! # Architecture
//!
//! - `schema`: serialized types - genotypes, trial configuration, hand-off
//!   record
//! - `search`: genetic operators, fitness evaluators, the trial state
//!   machine and its driver
//! - `store`: durable snapshots and the file-based hand-off channel
//! - `oscillator`: the waveform the actuators compute from a published
//!   genotype
//!
//! # Example
//!
//! ```rust,no_run
//! use gait_evolve::{
//!     schema::TrialSettings,
//!     search::TrialMachine,
//!     store::{ConfigStore, HandoffChannel},
//! };
//!
//! let settings = TrialSettings::default();
//! let store = ConfigStore::new("data").unwrap();
//! let channel = HandoffChannel::new("data/active_gait.json");
//! let mut machine = TrialMachine::new(settings, channel);
//!
//! // A fresh configuration is minted when no snapshot exists yet.
//! let config = store
//!     .load()
//!     .unwrap()
//!     .unwrap_or_else(|| machine.fresh_configuration());
//! store.save(&config).unwrap();
//!
//! println!("resuming from {:?}", config.state);
//! ```

pub mod oscillator;
pub mod schema;
pub mod search;
pub mod store;

// Re-export commonly used types
pub use schema::{
    FitnessCriterion, Genotype, HandoffRecord, OscillatorParams, Population, TrialConfiguration,
    TrialSettings, TrialState,
};
pub use search::{
    FitnessEvaluator, Position3, SimulationHost, StepOutcome, Transition, TrialDriver,
    TrialMachine,
};
pub use store::{ConfigStore, HandoffChannel, StoreError};
