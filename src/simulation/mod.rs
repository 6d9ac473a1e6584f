//! # Simulation Module - Duration-Driven Runner
//!
//! This module wraps the Monte Carlo engine in a runner that integrates a
//! configured span of simulated time. The engine reports a time increment
//! per event; the runner accumulates those increments, writes a checkpoint
//! whenever the accumulated time crosses into a new checkpoint interval, and
//! reports a summary of the completed run.
//!
//! ## Construction
//!
//! A runner is built from a [`SimulationConfig`] document: the kernel
//! selection is resolved, the ensemble is constructed with the configured
//! fragmentation rate and seed, and the population is either seeded from the
//! configured initial conditions or restored from a checkpoint when
//! `load_options` is present.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use aggregation_lib::config;
//! use aggregation_lib::simulation::Simulation;
//! use std::path::Path;
//!
//! let config = config::load_config(Path::new("simulation.toml")).unwrap();
//! let mut simulation = Simulation::from_config(&config).unwrap();
//! let summary = simulation.run().unwrap();
//! println!(
//!     "{} steps covered {} time units",
//!     summary.total_steps, summary.simulation_time
//! );
//! ```


use crate::config::{DistributionType, InitialConditions, SaveOptions, SimulationConfig};
use crate::ensemble::Ensemble;
use crate::io::checkpoint;
use log::info;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Monte Carlo steps executed by this run.
    pub total_steps: u64,
    /// Simulated time accumulated so far, including restored runs' offsets
    /// only insofar as the caller carried them.
    pub simulation_time: f64,
    /// Wall-clock time spent inside `run`.
    pub wall_time: Duration,
    /// Number of checkpoint files written.
    pub checkpoints_saved: u64,
}

/// A configured simulation: the engine plus its run and save parameters.
pub struct Simulation {
    ensemble: Ensemble,
    duration: f64,
    save_options: SaveOptions,
    simulation_time: f64,
}

impl Simulation {
    /// Builds a runnable simulation from a configuration document.
    ///
    /// Resolves the kernel, constructs the ensemble, and populates it from
    /// either the configured initial conditions or, when `load_options` is
    /// present, a saved checkpoint.
    ///
    /// # Returns
    ///
    /// * `Ok(Simulation)` - Ready to run
    /// * `Err(String)` - Unrecognized kernel or initial condition, invalid
    ///   parameters, or a checkpoint that could not be restored
    pub fn from_config(config: &SimulationConfig) -> Result<Self, String> {
        if !(config.save_options.checkpoint_interval > 0.0) {
            return Err(format!(
                "checkpoint interval must be positive, got {}",
                config.save_options.checkpoint_interval
            ));
        }

        let kernel = config.collision_kernel()?;
        let mut ensemble = Ensemble::new(kernel, config.fragmentation_rate, config.seed)?;

        if let Some(load) = &config.load_options {
            checkpoint::load_checkpoint(&mut ensemble, &load.checkpoint_path).map_err(|err| {
                format!(
                    "failed to restore checkpoint {}: {}",
                    load.checkpoint_path.display(),
                    err
                )
            })?;
            info!(
                "restored {} particles from {}",
                ensemble.num_particles(),
                load.checkpoint_path.display()
            );
        } else {
            let initial = config
                .initial_conditions
                .as_ref()
                .ok_or("initial conditions are unknown")?;
            seed_initial_conditions(&mut ensemble, initial)?;
        }

        Ok(Simulation {
            ensemble,
            duration: config.duration,
            save_options: config.save_options.clone(),
            simulation_time: 0.0,
        })
    }

    /// Returns the engine driven by this runner.
    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Returns the simulated time accumulated so far.
    pub fn simulation_time(&self) -> f64 {
        self.simulation_time
    }

    /// Integrates the configured duration of simulated time.
    ///
    /// Steps the engine until the accumulated time reaches the duration,
    /// writing a checkpoint whenever the time crosses into a new interval.
    /// The very first step therefore always produces checkpoint index 0.
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - Steps taken, simulated time, wall time and
    ///   checkpoints written
    /// * `Err(String)` - The engine could not step (for example, the
    ///   population collapsed to a single particle) or a checkpoint failed
    ///   to write
    pub fn run(&mut self) -> Result<RunSummary, String> {
        let start_time = Instant::now();
        let steps_before = self.ensemble.step_count();
        let mut last_checkpoint_num: i64 = -1;
        let mut checkpoints_saved = 0u64;

        while self.simulation_time < self.duration {
            self.simulation_time += self.ensemble.run_step()?;

            let checkpoint_num =
                (self.simulation_time / self.save_options.checkpoint_interval) as i64;
            if checkpoint_num > last_checkpoint_num {
                last_checkpoint_num = checkpoint_num;
                let path = checkpoint::save_checkpoint(
                    &self.ensemble,
                    &self.save_options.output_dir,
                    self.simulation_time,
                    start_time.elapsed(),
                )
                .map_err(|err| format!("failed to save checkpoint: {}", err))?;
                checkpoints_saved += 1;
                info!(
                    "checkpoint {} written at simulated time {}",
                    path.display(),
                    self.simulation_time
                );
            }
        }

        Ok(RunSummary {
            total_steps: self.ensemble.step_count() - steps_before,
            simulation_time: self.simulation_time,
            wall_time: start_time.elapsed(),
            checkpoints_saved,
        })
    }
}

/// Seeds a fresh ensemble from the configured initial conditions.
fn seed_initial_conditions(
    ensemble: &mut Ensemble,
    initial: &InitialConditions,
) -> Result<(), String> {
    match initial.distribution_type {
        DistributionType::MonomerCount => {
            let count = initial
                .monomer_count
                .ok_or("MONOMER_COUNT initial conditions require monomer_count")?;
            if count == 0 {
                return Err("monomer count cannot be 0".to_string());
            }
            ensemble.add_monomers(count);
        }
        DistributionType::SmallestN => {
            let params = initial
                .smallest_n_params
                .ok_or("SMALLEST_N initial conditions require smallest_n_params")?;
            if params.num_sizes == 0 {
                return Err("number of sizes in smallest N cannot be 0".to_string());
            }
            if params.particle_count_for_each_size == 0 {
                return Err("particle count for each size cannot be 0".to_string());
            }
            ensemble.add_monomers(params.particle_count_for_each_size);
            for size in 2..=params.num_sizes {
                ensemble.add_particle_repeated(size, params.particle_count_for_each_size);
            }
        }
        DistributionType::Unknown => {
            return Err("initial conditions are unknown".to_string());
        }
    }
    Ok(())
}
