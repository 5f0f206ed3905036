//! Persisted trial configuration snapshots.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

use crate::schema::TrialConfiguration;

use super::StoreError;

const CURRENT_SNAPSHOT: &str = "trial_config.json";

/// Single-slot durable store for the current trial configuration, plus
/// timestamp-suffixed archives of completed runs.
///
/// Single-writer/single-reader by construction: only one trial state
/// machine is ever active.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path of the current snapshot.
    pub fn current_path(&self) -> PathBuf {
        self.dir.join(CURRENT_SNAPSHOT)
    }

    /// Load the current snapshot.
    ///
    /// A missing snapshot is a normal first-run condition, not an error.
    pub fn load(&self) -> Result<Option<TrialConfiguration>, StoreError> {
        let raw = match fs::read_to_string(self.current_path()) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Write the current snapshot.
    pub fn save(&self, config: &TrialConfiguration) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(config)?;
        fs::write(self.current_path(), json)?;
        Ok(())
    }

    /// Archive a snapshot under a timestamped name.
    ///
    /// Never clobbers an existing archive; same-second archives get a
    /// counter suffix.
    pub fn archive(&self, config: &TrialConfiguration) -> Result<PathBuf, StoreError> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut path = self.dir.join(format!("trial_config.{secs}.json"));
        let mut attempt = 1;
        while path.exists() {
            path = self.dir.join(format!("trial_config.{secs}-{attempt}.json"));
            attempt += 1;
        }

        let json = serde_json::to_string_pretty(config)?;
        fs::write(&path, json)?;
        info!("archived trial configuration to {}", path.display());
        Ok(path)
    }

    /// Paths of all archived snapshots, oldest first.
    pub fn archived_snapshots(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut archives = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if name.starts_with("trial_config.")
                && name.ends_with(".json")
                && name != CURRENT_SNAPSHOT
            {
                archives.push(path);
            }
        }
        archives.sort();
        Ok(archives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GenotypeBounds, TrialSettings, TrialState};
    use crate::search::GenotypeRng;
    use tempfile::tempdir;

    fn test_configuration() -> TrialConfiguration {
        let settings = TrialSettings {
            population_size: 4,
            random_seed: Some(1),
            ..TrialSettings::default()
        };
        let mut rng = GenotypeRng::new(1);
        let population = rng.random_population(settings.population_size, &GenotypeBounds::default());
        let mut config = TrialConfiguration::fresh(&settings, population);
        config.state = TrialState::EvaluateSimulation;
        config.current_trial = 5;
        config.competed_pair = vec![2, 0];
        config.current_individual = 0;
        config.individuals_evaluated_this_pair = 1;
        config.fitness_values = vec![0.5, 0.0, 1.25, 0.75];
        config
    }

    #[test]
    fn load_missing_snapshot_is_none() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path()).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_and_load_round_trip_every_field() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path()).unwrap();
        let config = test_configuration();

        store.save(&config).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn archives_never_clobber() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path()).unwrap();
        let config = test_configuration();

        let first = store.archive(&config).unwrap();
        let second = store.archive(&config).unwrap();

        assert_ne!(first, second);
        assert!(first.exists());
        assert!(second.exists());
    }

    #[test]
    fn archived_snapshots_exclude_current() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path()).unwrap();
        let config = test_configuration();

        store.save(&config).unwrap();
        store.archive(&config).unwrap();

        let archives = store.archived_snapshots().unwrap();
        assert_eq!(archives.len(), 1);
        assert_ne!(archives[0], store.current_path());
    }
}
