//! # Ensemble Module - Particle Population and Collision Rates
//!
//! This module holds the core state of the aggregation-fragmentation Monte
//! Carlo engine: the particle population bucketed by integer mass, the
//! per-bucket aggregated collision rates, and the scalar total rate that
//! normalizes pair sampling and the Gillespie time increment.
//!
//! ## Overview
//!
//! The ensemble module is responsible for:
//! - Storing one bucket per distinct particle mass, split into a dense
//!   direct-indexed region for small masses and a packed dynamic region for
//!   large ones
//! - Maintaining every bucket's aggregated collision rate and the scalar
//!   total rate incrementally under insertions, deletions and monomer batches
//! - Sampling collision pairs proportionally to their kernel-weighted
//!   multiplicities
//! - Driving single Monte Carlo steps, including the periodic rate resync
//!   and the population-doubling control
//!
//! ## Key Concepts
//!
//! ### Buckets
//! All particles of one mass share a single [`Bucket`] carrying the mass,
//! the multiplicity and the per-particle collision rate against the rest of
//! the population. Per-step cost therefore scales with the number of
//! distinct masses, not with the particle count.
//!
//! ### Logical indices
//! A bucket is addressed by a logical index spanning both storage regions.
//! Dense-region indices coincide with the mass they hold; dynamic-region
//! indices are ephemeral and may be invalidated by any deletion or step, so
//! callers must never retain them across mutations.
//!
//! ### Total rate
//! The scalar total rate tracks the sum of `count * collision_rate` over all
//! buckets. It is advanced incrementally with every mutation, asserted
//! against the directly summed value at every step boundary, and rewritten
//! from scratch on a fixed cadence to bound floating-point drift.
//!
//! ## Usage Example
//!
//! ```rust
//! use aggregation_lib::ensemble::Ensemble;
//! use aggregation_lib::kernel::CollisionKernel;
//!
//! let mut ensemble = Ensemble::new(CollisionKernel::Constant, 0.0, 42).unwrap();
//! ensemble.add_monomers(1000);
//!
//! let mut simulated_time = 0.0;
//! for _ in 0..100 {
//!     simulated_time += ensemble.run_step().unwrap();
//! }
//!
//! for bucket in ensemble.distribution() {
//!     println!("mass {} x{} (rate {})", bucket.size, bucket.count, bucket.collision_rate);
//! }
//! ```

use crate::kernel::CollisionKernel;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

// Unit Tests
pub mod tests;
// Bucket storage across the dense and dynamic regions
pub mod store;
// Incremental collision-rate maintenance
pub mod rates;
// Weighted two-stage pair selection
pub mod sampler;
// Monte Carlo step driver and population control
pub mod step;

/// Number of masses held in the dense direct-indexed region. Bucket `i` of
/// that region is permanently pinned to mass `i`; index 0 is an always-empty
/// sentinel.
pub(crate) const DENSE_REGION_SIZE: usize = 1000;

/// Logical index of the monomer bucket. Monomers always live in the dense
/// region.
pub(crate) const MONOMER_INDEX: usize = 1;

/// Storage cell for all particles sharing one integer mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Particle mass in monomer units
    pub size: u64,
    /// Number of particles of this mass
    pub count: u64,
    /// Aggregated collision rate of one particle of this mass against every
    /// other particle in the ensemble
    pub collision_rate: f64,
}

/// The particle population of one simulation, together with its collision
/// kernel, fragmentation rate and random engine.
///
/// An `Ensemble` owns all of its state exclusively; independent instances
/// may run on separate threads without coordination.
pub struct Ensemble {
    /// Dense region: bucket `i` holds mass `i`, kept for the ensemble's
    /// lifetime with count 0 when unoccupied.
    small_buckets: Vec<Bucket>,
    /// Dynamic region for masses past the dense limit, packed and compacted
    /// by swap-removal when a bucket empties.
    large_buckets: Vec<Bucket>,
    /// Collision kernel shared by every rate computation.
    kernel: CollisionKernel,
    /// Relative fragmentation propensity; an event fragments with
    /// probability `fragmentation_rate / (1 + fragmentation_rate)`.
    fragmentation_rate: f64,
    /// Running total of `count * collision_rate` over all buckets.
    total_rate: f64,
    /// One past the highest logical index ever occupied; bounds all index
    /// iteration. May cover stale empty dense buckets.
    total_size: usize,
    /// Current particle count across all buckets.
    num_particles: u64,
    /// High-water mark of `num_particles`, the reference for population
    /// doubling.
    max_num_particles: u64,
    /// Number of completed Monte Carlo steps.
    step_counter: u64,
    /// Deterministic random engine owned exclusively by this ensemble.
    rng: StdRng,
}

impl Ensemble {
    /// Creates an empty ensemble.
    ///
    /// # Arguments
    ///
    /// * `kernel` - Collision kernel used for every rate computation
    /// * `fragmentation_rate` - Non-negative relative fragmentation
    ///   propensity; 0 gives pure aggregation
    /// * `seed` - Seed for the owned random engine; equal seeds give
    ///   identical step sequences
    ///
    /// # Returns
    ///
    /// * `Ok(Ensemble)` - Fresh ensemble with no particles
    /// * `Err(String)` - The fragmentation rate was negative
    pub fn new(
        kernel: CollisionKernel,
        fragmentation_rate: f64,
        seed: u64,
    ) -> Result<Self, String> {
        if fragmentation_rate < 0.0 || !fragmentation_rate.is_finite() {
            return Err(format!(
                "fragmentation rate must be finite and non-negative, got {}",
                fragmentation_rate
            ));
        }

        let small_buckets = (0..DENSE_REGION_SIZE)
            .map(|size| Bucket {
                size: size as u64,
                count: 0,
                collision_rate: 0.0,
            })
            .collect();

        Ok(Ensemble {
            small_buckets,
            large_buckets: Vec::new(),
            kernel,
            fragmentation_rate,
            total_rate: 0.0,
            total_size: 0,
            num_particles: 0,
            max_num_particles: 0,
            step_counter: 0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Returns the collision kernel this ensemble evaluates.
    pub fn kernel(&self) -> CollisionKernel {
        self.kernel
    }

    /// Returns the relative fragmentation propensity.
    pub fn fragmentation_rate(&self) -> f64 {
        self.fragmentation_rate
    }

    /// Returns the running total collision rate.
    pub fn total_rate(&self) -> f64 {
        self.total_rate
    }

    /// Returns the current number of particles.
    pub fn num_particles(&self) -> u64 {
        self.num_particles
    }

    /// Returns the high-water mark of the particle count.
    pub fn max_num_particles(&self) -> u64 {
        self.max_num_particles
    }

    /// Returns the number of completed Monte Carlo steps.
    pub fn step_count(&self) -> u64 {
        self.step_counter
    }

    /// Returns every occupied bucket, ordered by ascending mass.
    ///
    /// The returned buckets are copies; they stay valid across later
    /// mutations but do not reflect them.
    pub fn distribution(&self) -> Vec<Bucket> {
        let dense_limit = self.total_size.min(DENSE_REGION_SIZE);
        let mut result: Vec<Bucket> = self.small_buckets[..dense_limit]
            .iter()
            .filter(|bucket| bucket.count > 0)
            .copied()
            .collect();

        // Dynamic buckets are packed in insertion order; the dense region
        // covers every smaller mass, so sorting and appending keeps the
        // whole sequence ascending.
        let mut large: Vec<Bucket> = self.large_buckets.clone();
        large.sort_by_key(|bucket| bucket.size);
        result.extend(large);

        result
    }

    /// Adds `count` particles of the given mass one at a time.
    ///
    /// Convenience wrapper over [`Ensemble::add_particle`]; monomer batches
    /// should use [`Ensemble::add_monomers`] instead, which inserts the
    /// whole batch at the cost of a single rate sweep.
    pub fn add_particle_repeated(&mut self, size: u64, count: u64) {
        for _ in 0..count {
            self.add_particle(size);
        }
    }
}
