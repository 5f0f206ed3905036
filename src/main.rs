//! Gait evolution CLI - Run the trial loop from JSON settings.
//!
//! Thin bootstrap around the library: it wires the snapshot store, the
//! hand-off channel, and the trial state machine together and drives them
//! with a built-in kinematic dry-run host, so the full search loop can be
//! exercised without a simulator attached.

use std::fs;
use std::path::PathBuf;

use gait_evolve::{
    oscillator,
    schema::TrialSettings,
    search::{Position3, SimulationHost, StepOutcome, TrialDriver, TrialMachine},
    store::{ConfigStore, HandoffChannel},
};

/// Kinematic stand-in for the external simulator.
///
/// Advances a clock and drags the reference point forward at a rate derived
/// from the published oscillator commands. It is deliberately crude: the
/// point is to exercise the trial loop end-to-end, not to model physics.
struct DryRunHost {
    channel: HandoffChannel,
    time_s: f64,
    z: f64,
}

impl DryRunHost {
    fn new(channel: HandoffChannel) -> Self {
        Self {
            channel,
            time_s: 0.0,
            z: 0.0,
        }
    }
}

impl SimulationHost for DryRunHost {
    fn advance(&mut self, step_size_ms: u32) -> StepOutcome {
        let dt = step_size_ms as f64 / 1000.0;
        if let Ok(Some(record)) = self.channel.active_record() {
            // Mean absolute joint command, in degrees, as a drive proxy.
            let modules = record.genotype.oscillators.len();
            let drive: f64 = (0..modules)
                .filter_map(|module| oscillator::module_command(&record, module, self.time_s))
                .map(f64::abs)
                .sum::<f64>()
                / modules as f64;
            self.z += drive * 1e-3 * dt;
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
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <data-dir> [settings.json]", args[0]);
        eprintln!();
        eprintln!("Run the gait evolution trial loop against a dry-run host.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  data-dir       Directory for snapshots and the hand-off record");
        eprintln!("  settings.json  Optional trial settings file");
        eprintln!();
        eprintln!("Example settings are generated with --example.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_settings();
        return;
    }

    let data_dir = PathBuf::from(&args[1]);

    let settings: TrialSettings = match args.get(2) {
        Some(path) => {
            let raw = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading settings file: {}", e);
                std::process::exit(1);
            });
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                eprintln!("Error parsing settings: {}", e);
                std::process::exit(1);
            })
        }
        None => TrialSettings::default(),
    };

    println!("Gait Evolution");
    println!("==============");
    println!(
        "Population: {} | trials: {} | {:?} fitness",
        settings.population_size, settings.trials_total, settings.fitness_criterion
    );
    println!(
        "Trial: {}s in {}ms steps | showcase: {}s",
        settings.runtime_seconds, settings.step_size_ms, settings.showcase_time_seconds
    );
    println!();

    let store = ConfigStore::new(&data_dir).unwrap_or_else(|e| {
        eprintln!("Error opening data directory: {}", e);
        std::process::exit(1);
    });
    let channel = HandoffChannel::new(data_dir.join("active_gait.json"));
    let host = DryRunHost::new(channel.clone());
    let machine = TrialMachine::new(settings, channel);
    let mut driver = TrialDriver::new(machine, store, host);

    match driver.store().load() {
        Ok(Some(config)) => println!(
            "Resuming from {:?} (trial {}/{})",
            config.state, config.current_trial, config.trials_total
        ),
        Ok(None) => println!("No snapshot found, starting a fresh run"),
        Err(e) => {
            eprintln!("Error loading snapshot: {}", e);
            std::process::exit(1);
        }
    }

    println!("Running trial loop...");
    loop {
        let transition = match driver.run_once() {
            Ok(transition) => transition,
            Err(e) => {
                eprintln!("Trial loop failed: {}", e);
                std::process::exit(1);
            }
        };
        println!("  {:?} -> {:?}", transition.from, transition.to);
        if transition.terminal {
            break;
        }
    }

    let archives = driver.store().archived_snapshots().unwrap_or_default();
    println!();
    println!("Run complete.");
    if let Some(latest) = archives.last() {
        println!("Archived result: {}", latest.display());
    }
    println!("Archived runs in {}: {}", data_dir.display(), archives.len());
}

fn print_example_settings() {
    let settings = TrialSettings::default();
    println!("Example settings (settings.json):");
    println!("{}", serde_json::to_string_pretty(&settings).unwrap());
}
