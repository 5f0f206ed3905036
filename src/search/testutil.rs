//! Test double for the simulation host.

use crate::schema::HandoffRecord;
use crate::store::HandoffChannel;

use super::fitness::Position3;
use super::host::{SimulationHost, StepOutcome};

/// Forward speed model of the mock world.
pub(crate) enum SpeedModel {
    /// Constant forward velocity while a trial is active.
    Fixed(f64),
    /// Velocity derived from the published genotype, so different
    /// individuals earn different fitness.
    FromGenotype,
}

/// In-memory stand-in for the external simulator.
///
/// Consumes the hand-off record the way the real oscillator actuators do:
/// while a record is present and active, the reference point moves forward.
pub(crate) struct MockHost {
    channel: HandoffChannel,
    speed: SpeedModel,
    pub time_s: f64,
    pub z: f64,
    pub steps_taken: u32,
    pub terminate_after_steps: Option<u32>,
    pub resets: u32,
    pub saw_record: bool,
    pub last_record: Option<HandoffRecord>,
}

impl MockHost {
    pub fn new(channel: HandoffChannel, speed: SpeedModel) -> Self {
        Self {
            channel,
            speed,
            time_s: 0.0,
            z: 0.0,
            steps_taken: 0,
            terminate_after_steps: None,
            resets: 0,
            saw_record: false,
            last_record: None,
        }
    }

    pub fn channel(&self) -> &HandoffChannel {
        &self.channel
    }

    fn forward_velocity(&self, record: &HandoffRecord) -> f64 {
        match self.speed {
            SpeedModel::Fixed(velocity) => velocity,
            SpeedModel::FromGenotype => {
                let sum: f64 = record
                    .genotype
                    .iter()
                    .map(|osc| osc.amplitude_deg * osc.frequency_hz)
                    .sum();
                sum / record.genotype.oscillators.len() as f64 / 100.0
            }
        }
    }
}

impl SimulationHost for MockHost {
    fn advance(&mut self, step_size_ms: u32) -> StepOutcome {
        if let Some(limit) = self.terminate_after_steps
            && self.steps_taken >= limit
        {
            return StepOutcome::Terminated;
        }
        self.steps_taken += 1;

        let dt = step_size_ms as f64 / 1000.0;
        if let Ok(Some(record)) = self.channel.read()
            && record.active
        {
            self.saw_record = true;
            self.z += self.forward_velocity(&record) * dt;
            self.last_record = Some(record);
        }
        self.time_s += dt;
        StepOutcome::Ok
    }

    fn simulated_time(&self) -> f64 {
        self.time_s
    }

    fn reference_position(&mut self) -> Position3 {
        Position3::new(0.0, 0.0, self.z)
    }

    fn reset_world(&mut self) {
        self.time_s = 0.0;
        self.z = 0.0;
        self.steps_taken = 0;
        self.resets += 1;
    }
}
