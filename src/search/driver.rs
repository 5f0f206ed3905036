//! Checkpoint/resume driver for the trial state machine.

use log::debug;

use crate::store::ConfigStore;

use super::host::SimulationHost;
use super::trial::{Transition, TrialError, TrialMachine};

/// Drives the state machine one persisted transition at a time.
///
/// Each invocation reloads the configuration from the store (or mints a
/// fresh one on a first run), executes exactly one transition, archives the
/// outgoing snapshot when requested, saves unconditionally, and performs the
/// world reset the machine asked for. Reloading on every invocation is the
/// point: it is the same code path whether the process survived the world
/// reset or was torn down and relaunched by it.
pub struct TrialDriver<H: SimulationHost> {
    machine: TrialMachine,
    store: ConfigStore,
    host: H,
}

impl<H: SimulationHost> TrialDriver<H> {
    /// Create a driver over a machine, a snapshot store, and a host.
    pub fn new(machine: TrialMachine, store: ConfigStore, host: H) -> Self {
        Self {
            machine,
            store,
            host,
        }
    }

    /// Load (or initialize), execute one transition, persist, reset.
    pub fn run_once(&mut self) -> Result<Transition, TrialError> {
        let mut config = match self.store.load()? {
            Some(config) => config,
            None => {
                debug!("no persisted configuration, starting fresh");
                self.machine.fresh_configuration()
            }
        };
        config.validate()?;

        let snapshot = config.clone();
        let transition = self.machine.step(&mut config, &mut self.host)?;

        if transition.archive {
            self.store.archive(&snapshot)?;
        }
        self.store.save(&config)?;

        if transition.reset_world {
            self.host.reset_world();
        }
        Ok(transition)
    }

    /// Run transitions until the terminal one.
    pub fn run(&mut self) -> Result<(), TrialError> {
        loop {
            let transition = self.run_once()?;
            if transition.terminal {
                return Ok(());
            }
        }
    }

    /// The simulation host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The snapshot store.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }
}
