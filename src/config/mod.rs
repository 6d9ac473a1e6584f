//! # Config Module - Simulation Configuration Documents
//!
//! This module defines the structured configuration record consumed by the
//! binary and the loader that reads it from disk. A document selects the
//! collision kernel and its parameters, the fragmentation rate, the initial
//! particle population, the simulated duration and the checkpointing
//! options, plus an optional checkpoint to restore instead of seeding fresh
//! initial conditions.
//!
//! Documents are accepted in TOML or JSON; the loader dispatches on the
//! file extension. A TOML example:
//!
//! ```toml
//! kernel_type = "BROWNIAN"
//! fragmentation_rate = 0.2
//! duration = 10.0
//! seed = 42
//!
//! [brownian_kernel_params]
//! alpha = 0.9
//!
//! [initial_conditions]
//! distribution_type = "MONOMER_COUNT"
//! monomer_count = 10000
//!
//! [save_options]
//! output_dir = "./data/checkpoints"
//! checkpoint_interval = 1.0
//! ```
//!
//! Enum-valued fields tolerate unrecognized strings at parse time by
//! mapping them to an `Unknown` variant; construction of the simulation
//! rejects them afterwards, so a typo in `kernel_type` fails with a clear
//! message rather than a deserializer backtrace.

use crate::kernel::{CollisionKernel, DEFAULT_MULTIPLICATIVE_NORMALIZATION};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};


/// Kernel family selector of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KernelType {
    Constant,
    Multiplicative,
    Ballistic,
    Brownian,
    /// Catch-all for unrecognized kernel names; rejected at construction.
    #[serde(other)]
    Unknown,
}

/// Parameters of the Brownian kernel family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrownianKernelParams {
    pub alpha: f64,
}

/// Parameters of the multiplicative kernel family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplicativeKernelParams {
    pub normalization: f64,
}

/// Initial-population selector of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionType {
    /// Seed the ensemble with a flat batch of monomers.
    MonomerCount,
    /// Seed the same particle count for every mass 1..=num_sizes.
    SmallestN,
    /// Catch-all for unrecognized names; rejected at construction.
    #[serde(other)]
    Unknown,
}

/// Parameters of the `SMALLEST_N` initial condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmallestNParams {
    pub num_sizes: u64,
    pub particle_count_for_each_size: u64,
}

/// Initial particle population of a fresh simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    pub distribution_type: DistributionType,
    #[serde(default)]
    pub monomer_count: Option<u64>,
    #[serde(default)]
    pub smallest_n_params: Option<SmallestNParams>,
}

/// Checkpoint output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOptions {
    /// Directory receiving `<simulation_time>.cpt` files; created if absent.
    pub output_dir: PathBuf,
    /// Simulated-time spacing between checkpoints.
    pub checkpoint_interval: f64,
}

/// Checkpoint restore settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadOptions {
    pub checkpoint_path: PathBuf,
}

/// A complete simulation configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub kernel_type: KernelType,
    #[serde(default)]
    pub brownian_kernel_params: Option<BrownianKernelParams>,
    #[serde(default)]
    pub multiplicative_kernel_params: Option<MultiplicativeKernelParams>,
    /// Relative fragmentation propensity; 0 gives pure aggregation.
    pub fragmentation_rate: f64,
    /// Simulated duration to integrate.
    pub duration: f64,
    /// Seed of the ensemble's random engine.
    #[serde(default)]
    pub seed: u64,
    /// Fresh-start population; ignored when `load_options` is present.
    #[serde(default)]
    pub initial_conditions: Option<InitialConditions>,
    pub save_options: SaveOptions,
    #[serde(default)]
    pub load_options: Option<LoadOptions>,
}

impl SimulationConfig {
    /// Resolves the document's kernel selection into a concrete kernel.
    ///
    /// # Returns
    ///
    /// * `Ok(CollisionKernel)` - The selected kernel with its parameters
    /// * `Err(String)` - Unrecognized kernel name or invalid parameters
    pub fn collision_kernel(&self) -> Result<CollisionKernel, String> {
        match self.kernel_type {
            KernelType::Constant => Ok(CollisionKernel::Constant),
            KernelType::Multiplicative => {
                let normalization = self
                    .multiplicative_kernel_params
                    .map(|params| params.normalization)
                    .unwrap_or(DEFAULT_MULTIPLICATIVE_NORMALIZATION);
                if normalization <= 0.0 || !normalization.is_finite() {
                    return Err(format!(
                        "multiplicative kernel normalization must be positive, got {}",
                        normalization
                    ));
                }
                Ok(CollisionKernel::Multiplicative { normalization })
            }
            KernelType::Ballistic => Ok(CollisionKernel::Ballistic),
            KernelType::Brownian => {
                let params = self
                    .brownian_kernel_params
                    .ok_or("Brownian kernel requires brownian_kernel_params.alpha")?;
                if !(params.alpha > 0.0 && params.alpha < 1.0) {
                    return Err(format!(
                        "Brownian kernel alpha must lie in (0, 1), got {}",
                        params.alpha
                    ));
                }
                Ok(CollisionKernel::Brownian { alpha: params.alpha })
            }
            KernelType::Unknown => Err("kernel unknown".to_string()),
        }
    }
}

/// Reads and parses a configuration document from disk.
///
/// A `.json` extension selects the JSON parser; every other extension is
/// parsed as TOML.
///
/// # Arguments
///
/// * `path` - Location of the configuration document
///
/// # Returns
///
/// * `Ok(SimulationConfig)` - The parsed document
/// * `Err(String)` - The file could not be read or parsed
pub fn load_config(path: &Path) -> Result<SimulationConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("cannot read configuration {}: {}", path.display(), err))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&contents)
            .map_err(|err| format!("invalid JSON configuration {}: {}", path.display(), err))
    } else {
        toml::from_str(&contents)
            .map_err(|err| format!("invalid TOML configuration {}: {}", path.display(), err))
    }
}
