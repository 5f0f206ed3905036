//! Schema module - serialized types for the gait search: genotypes, trial
//! configuration, and the oscillator hand-off record.

mod genotype;
mod handoff;
mod trial;

pub use genotype::*;
pub use handoff::*;
pub use trial::*;
