//! Durable state: configuration snapshots and the oscillator hand-off
//! channel.

mod config;
mod handoff;

pub use config::*;
pub use handoff::*;

/// Persistence layer failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode/decode failure: {0}")]
    Format(#[from] serde_json::Error),
}
