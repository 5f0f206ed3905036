//! File-based hand-off channel to the oscillator actuators.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::schema::HandoffRecord;

use super::StoreError;

/// Publishes the genotype under test to the independently-running
/// oscillator controllers and revokes it afterward.
///
/// The record's presence with `active == true` is itself the activation
/// signal. The trial core and the actuators never run concurrently within a
/// trial window, so no locking primitive is used or needed.
#[derive(Debug, Clone)]
pub struct HandoffChannel {
    path: PathBuf,
}

impl HandoffChannel {
    /// Create a channel over the given record path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the record, activating the actuators.
    pub fn publish(&self, record: &HandoffRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, json)?;
        debug!("published hand-off record to {}", self.path.display());
        Ok(())
    }

    /// Delete the record, deactivating the actuators.
    ///
    /// An already-absent record is fine: the actuator side may never have
    /// been attached.
    pub fn revoke(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Read the record, if present.
    pub fn read(&self) -> Result<Option<HandoffRecord>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Read the record only if it commands motion.
    ///
    /// Absence or `active == false` both mean the actuators stay still.
    pub fn active_record(&self) -> Result<Option<HandoffRecord>, StoreError> {
        Ok(self.read()?.filter(|record| record.active))
    }
}
