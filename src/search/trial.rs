//! The trial state machine.
//!
//! Orchestrates one simulated trial at a time: it publishes the genotype
//! under test, drives the simulation host through the trial window, scores
//! the individual by measured displacement, and applies the genetic
//! operators between tournament rounds.
//!
//! Strictly one transition executes per invocation of [`TrialMachine::step`],
//! then control returns to the caller. The caller owns persistence and the
//! world reset: the surrounding simulated world is destroyed and recreated
//! after every non-terminal transition, and the process driving this machine
//! is expected to be torn down with it. On relaunch the machine reconstructs
//! exactly where it left off from the reloaded [`TrialConfiguration`].

use log::{debug, info};

use crate::schema::{
    ConfigError, GenotypeBounds, HandoffRecord, TrialConfiguration, TrialSettings, TrialState,
};
use crate::store::{HandoffChannel, StoreError};

use super::fitness::{FitnessEvaluator, Position3};
use super::host::{SimulationHost, StepOutcome};
use super::operators::{AVERAGE_MUTATIONS, CROSSOVER_PROBABILITY, GenotypeRng};

/// Report of one executed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State whose action was executed.
    pub from: TrialState,
    /// State the configuration was left in.
    pub to: TrialState,
    /// Whether the caller must reset the simulated world before the next
    /// invocation.
    pub reset_world: bool,
    /// Whether the caller must archive the pre-transition snapshot.
    pub archive: bool,
    /// Whether the trial loop has finished for this run.
    pub terminal: bool,
}

/// Failures of the trial state machine.
#[derive(Debug, thiserror::Error)]
pub enum TrialError {
    #[error("invalid trial configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("persistence failure: {0}")]
    Store(#[from] StoreError),
}

/// The trial orchestrator.
///
/// Holds everything that is *not* persisted: the random number generator,
/// the creation-time parameter bounds, and the hand-off channel it is the
/// sole writer of. All durable state lives in the [`TrialConfiguration`]
/// passed to each invocation.
pub struct TrialMachine {
    settings: TrialSettings,
    bounds: GenotypeBounds,
    rng: GenotypeRng,
    handoff: HandoffChannel,
}

impl TrialMachine {
    /// Create a machine from settings and the hand-off channel to publish on.
    pub fn new(settings: TrialSettings, handoff: HandoffChannel) -> Self {
        let seed = settings.random_seed.unwrap_or_else(rand::random);
        Self {
            bounds: GenotypeBounds::default(),
            rng: GenotypeRng::new(seed),
            settings,
            handoff,
        }
    }

    /// Override the creation-time parameter bounds.
    pub fn with_bounds(mut self, bounds: GenotypeBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Settings the machine mints fresh configurations from.
    pub fn settings(&self) -> &TrialSettings {
        &self.settings
    }

    /// Mint a fresh configuration with a random population.
    pub fn fresh_configuration(&mut self) -> TrialConfiguration {
        let population = self
            .rng
            .random_population(self.settings.population_size, &self.bounds);
        TrialConfiguration::fresh(&self.settings, population)
    }

    /// Execute exactly one state transition.
    ///
    /// Returns what the caller must do next: persist the configuration
    /// (always), archive the outgoing snapshot, and/or reset the simulated
    /// world.
    pub fn step<H: SimulationHost>(
        &mut self,
        config: &mut TrialConfiguration,
        host: &mut H,
    ) -> Result<Transition, TrialError> {
        config.validate()?;

        let from = config.state;
        let to = match from {
            TrialState::SetupSimulation => self.setup_simulation(config),
            TrialState::RunSimulation => self.run_simulation(config, host)?,
            TrialState::EvaluateSimulation => self.evaluate_simulation(config),
            TrialState::SetupShowcase => self.setup_showcase(config)?,
            TrialState::RunShowcase => self.run_showcase(config, host)?,
            TrialState::Shutdown => self.shutdown(config),
        };
        config.state = to;

        let terminal = from == TrialState::Shutdown;
        debug!("transition {from:?} -> {to:?}");
        Ok(Transition {
            from,
            to,
            reset_world: !terminal,
            archive: terminal,
            terminal,
        })
    }

    /// Randomly initialize the population and pick the first competitor.
    fn setup_simulation(&mut self, config: &mut TrialConfiguration) -> TrialState {
        config.population = self
            .rng
            .random_population(config.population_size, &self.bounds);
        config.fitness_values = vec![0.0; config.population_size];
        config.current_trial = 0;
        config.competed_pair.clear();
        config.individuals_evaluated_this_pair = 0;
        config.current_individual = self.rng.pick_individual(config.population_size);

        info!(
            "population of {} initialized, first competitor is {}",
            config.population_size, config.current_individual
        );
        TrialState::RunSimulation
    }

    /// Simulate the current individual and record `|fitness|`.
    fn run_simulation<H: SimulationHost>(
        &mut self,
        config: &mut TrialConfiguration,
        host: &mut H,
    ) -> Result<TrialState, TrialError> {
        let genotype = match config.genotype(config.current_individual) {
            Some(genotype) => genotype.clone(),
            None => return Err(ConfigError::IndividualOutOfRange(config.current_individual).into()),
        };

        self.handoff.publish(&HandoffRecord {
            active: true,
            runtime_seconds: config.runtime_seconds,
            step_size_ms: config.step_size_ms,
            genotype,
        })?;

        // A fresh evaluator per trial: no stale sample survives from the
        // previous trial.
        let mut evaluator = FitnessEvaluator::new(config.fitness_criterion);
        drive(host, config.step_size_ms, config.runtime_seconds, |t, pos| {
            evaluator.sample(t, pos);
        });

        let fitness = evaluator.value().abs();
        config.fitness_values[config.current_individual] = fitness;
        self.handoff.revoke()?;

        info!(
            "trial {}/{}: individual {} scored {:.4}",
            config.current_trial + 1,
            config.trials_total,
            config.current_individual,
            fitness
        );
        Ok(TrialState::EvaluateSimulation)
    }

    /// Advance the pairing: queue the opponent, or resolve the competition
    /// and apply the genetic operators.
    fn evaluate_simulation(&mut self, config: &mut TrialConfiguration) -> TrialState {
        config.competed_pair.push(config.current_individual);

        if config.competed_pair.len() < 2 {
            config.individuals_evaluated_this_pair = 1;
            config.current_individual = self
                .rng
                .pick_opponent(config.population_size, config.current_individual);
            return TrialState::RunSimulation;
        }

        let first = config.competed_pair[0];
        let second = config.competed_pair[1];
        // Ties favor the first-listed competitor; deterministic tie-break.
        let (winner, loser) = if config.fitness_values[first] >= config.fitness_values[second] {
            (first, second)
        } else {
            (second, first)
        };

        self.rng
            .crossover(&mut config.population, winner, loser, CROSSOVER_PROBABILITY);
        self.rng
            .mutate(&mut config.population, loser, AVERAGE_MUTATIONS);

        config.competed_pair.clear();
        config.individuals_evaluated_this_pair = 0;
        config.current_trial += 1;

        info!(
            "pairing {} of {} resolved: {} beat {}",
            config.current_trial, config.trials_total, winner, loser
        );

        if config.current_trial < config.trials_total {
            config.current_individual = self.rng.pick_individual(config.population_size);
            TrialState::RunSimulation
        } else {
            TrialState::SetupShowcase
        }
    }

    /// Publish the best-ever individual for the final demonstration.
    fn setup_showcase(&mut self, config: &mut TrialConfiguration) -> Result<TrialState, TrialError> {
        let best = config.best_individual();
        config.current_individual = best;

        let genotype = match config.genotype(best) {
            Some(genotype) => genotype.clone(),
            None => return Err(ConfigError::IndividualOutOfRange(best).into()),
        };
        self.handoff.publish(&HandoffRecord {
            active: true,
            runtime_seconds: config.showcase_time_seconds,
            step_size_ms: config.step_size_ms,
            genotype,
        })?;

        info!(
            "showcasing individual {} with fitness {:.4}",
            best, config.fitness_values[best]
        );
        Ok(TrialState::RunShowcase)
    }

    /// Run the showcase window, then revoke the hand-off record.
    fn run_showcase<H: SimulationHost>(
        &mut self,
        config: &mut TrialConfiguration,
        host: &mut H,
    ) -> Result<TrialState, TrialError> {
        drive(
            host,
            config.step_size_ms,
            config.showcase_time_seconds,
            |_, _| {},
        );
        self.handoff.revoke()?;
        Ok(TrialState::Shutdown)
    }

    /// Replace the configuration with a fresh one; the caller archives the
    /// outgoing snapshot.
    fn shutdown(&mut self, config: &mut TrialConfiguration) -> TrialState {
        *config = self.fresh_configuration();
        info!("run complete, configuration reset");
        TrialState::SetupSimulation
    }
}

/// Advance the host in fixed steps until `duration_s` simulated seconds have
/// elapsed or the host terminates, feeding each sample to `on_sample`.
///
/// Elapsed time is measured against the host clock relative to the first
/// reading, so hosts whose clock does not restart at zero still terminate
/// trials correctly.
fn drive<H: SimulationHost>(
    host: &mut H,
    step_size_ms: u32,
    duration_s: f64,
    mut on_sample: impl FnMut(f64, Position3),
) {
    let start = host.simulated_time();
    loop {
        if host.advance(step_size_ms) == StepOutcome::Terminated {
            break;
        }
        let now = host.simulated_time();
        on_sample(now, host.reference_position());
        if now - start >= duration_s {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FitnessCriterion;
    use crate::search::testutil::{MockHost, SpeedModel};
    use tempfile::tempdir;

    fn test_settings(population_size: usize, trials_total: u32) -> TrialSettings {
        TrialSettings {
            population_size,
            trials_total,
            runtime_seconds: 0.2,
            step_size_ms: 100,
            showcase_time_seconds: 0.2,
            fitness_criterion: FitnessCriterion::Velocity,
            random_seed: Some(42),
        }
    }

    fn machine_and_host(
        settings: TrialSettings,
        speed: SpeedModel,
    ) -> (TrialMachine, MockHost, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let channel = HandoffChannel::new(dir.path().join("active_gait.json"));
        let host = MockHost::new(channel.clone(), speed);
        let machine = TrialMachine::new(settings, channel);
        (machine, host, dir)
    }

    #[test]
    fn visits_states_in_order() {
        let (mut machine, mut host, _dir) =
            machine_and_host(test_settings(4, 1), SpeedModel::Fixed(1.0));
        let mut config = machine.fresh_configuration();

        let mut visited = Vec::new();
        loop {
            let transition = machine.step(&mut config, &mut host).unwrap();
            visited.push((transition.from, transition.to));
            if transition.to == TrialState::SetupShowcase {
                assert_eq!(config.current_trial, 1);
            }
            if transition.terminal {
                break;
            }
        }

        assert_eq!(
            visited,
            vec![
                (TrialState::SetupSimulation, TrialState::RunSimulation),
                (TrialState::RunSimulation, TrialState::EvaluateSimulation),
                (TrialState::EvaluateSimulation, TrialState::RunSimulation),
                (TrialState::RunSimulation, TrialState::EvaluateSimulation),
                (TrialState::EvaluateSimulation, TrialState::SetupShowcase),
                (TrialState::SetupShowcase, TrialState::RunShowcase),
                (TrialState::RunShowcase, TrialState::Shutdown),
                (TrialState::Shutdown, TrialState::SetupSimulation),
            ]
        );
    }

    #[test]
    fn trial_counter_increments_once_per_pairing() {
        let (mut machine, mut host, _dir) =
            machine_and_host(test_settings(4, 3), SpeedModel::Fixed(1.0));
        let mut config = machine.fresh_configuration();

        let mut previous = 0;
        loop {
            let transition = machine.step(&mut config, &mut host).unwrap();
            if transition.terminal {
                break;
            }
            assert!(config.current_trial == previous || config.current_trial == previous + 1);
            previous = config.current_trial;
            if transition.to == TrialState::SetupShowcase {
                assert_eq!(config.current_trial, 3);
            }
        }
    }

    #[test]
    fn equal_fitness_favors_first_competitor() {
        // A fixed-speed world gives both competitors identical fitness.
        let (mut machine, mut host, _dir) =
            machine_and_host(test_settings(2, 1), SpeedModel::Fixed(1.0));
        let mut config = machine.fresh_configuration();

        // Setup, first run, pending evaluate, second run.
        for _ in 0..4 {
            machine.step(&mut config, &mut host).unwrap();
        }
        assert_eq!(config.state, TrialState::EvaluateSimulation);
        let first = config.competed_pair[0];
        let winner_genotype = config.genotype(first).unwrap().clone();

        machine.step(&mut config, &mut host).unwrap();

        // The winner is untouched by crossover and mutation; with a tie the
        // first-listed competitor must be the winner.
        assert_eq!(config.genotype(first), Some(&winner_genotype));
        assert!(config.competed_pair.is_empty());
        assert_eq!(config.individuals_evaluated_this_pair, 0);
        assert_eq!(config.current_trial, 1);
    }

    #[test]
    fn host_termination_stops_trial_and_keeps_partial_fitness() {
        let mut settings = test_settings(2, 1);
        settings.runtime_seconds = 10.0;
        settings.step_size_ms = 1000;
        settings.fitness_criterion = FitnessCriterion::Distance;
        let (mut machine, mut host, _dir) = machine_and_host(settings, SpeedModel::Fixed(1.0));
        host.terminate_after_steps = Some(2);
        let mut config = machine.fresh_configuration();

        machine.step(&mut config, &mut host).unwrap();
        let individual = config.current_individual;
        let transition = machine.step(&mut config, &mut host).unwrap();

        assert_eq!(transition.to, TrialState::EvaluateSimulation);
        // Two steps at 1 m/s: the priming sample sees z=1, the second z=2.
        assert!((config.fitness_values[individual] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn handoff_record_is_published_then_revoked() {
        let (mut machine, mut host, _dir) =
            machine_and_host(test_settings(2, 1), SpeedModel::Fixed(1.0));
        let mut config = machine.fresh_configuration();

        machine.step(&mut config, &mut host).unwrap();
        let expected = config.genotype(config.current_individual).unwrap().clone();
        machine.step(&mut config, &mut host).unwrap();

        assert!(host.saw_record);
        let record = host.last_record.clone().unwrap();
        assert!(record.active);
        assert_eq!(record.genotype, expected);
        // Revoked after the trial window.
        assert!(host.channel().read().unwrap().is_none());
    }

    #[test]
    fn showcase_publishes_best_individual_for_showcase_duration() {
        let (mut machine, mut host, _dir) =
            machine_and_host(test_settings(4, 1), SpeedModel::FromGenotype);
        let mut config = machine.fresh_configuration();

        loop {
            let transition = machine.step(&mut config, &mut host).unwrap();
            if transition.from == TrialState::RunShowcase {
                break;
            }
            if transition.to == TrialState::RunShowcase {
                let record = host.channel().read().unwrap().unwrap();
                assert_eq!(
                    Some(&record.genotype),
                    config.genotype(config.best_individual())
                );
                assert_eq!(record.runtime_seconds, config.showcase_time_seconds);
            }
        }
    }

    #[test]
    fn rejects_invalid_configuration() {
        let (mut machine, mut host, _dir) =
            machine_and_host(test_settings(4, 1), SpeedModel::Fixed(1.0));
        let mut config = machine.fresh_configuration();
        config.competed_pair = vec![0, 1, 2];

        assert!(matches!(
            machine.step(&mut config, &mut host),
            Err(TrialError::Config(ConfigError::InvalidPair))
        ));
    }
}
