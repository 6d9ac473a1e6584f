//! Monte Carlo step driver and population control.

use super::Ensemble;
use rand_distr::{Distribution, Uniform};

/// Steps between full recomputations of the running total rate.
const RATE_RESYNC_INTERVAL: u64 = 1000;

/// Largest tolerated gap between the running total rate and the directly
/// summed value before the step aborts.
const MAX_RATE_DRIFT: f64 = 1.0;

impl Ensemble {
    /// Executes one Monte Carlo event and returns its simulated-time
    /// increment.
    ///
    /// A collision pair is sampled proportionally to its kernel weight, then
    /// a second draw on `[0, 1 + fragmentation_rate)` decides the branch:
    /// below 1 the pair aggregates into one particle of the combined mass,
    /// otherwise the combined mass shatters entirely into monomers. Either
    /// way the sampled pair is removed afterwards, so both branches conserve
    /// total mass.
    ///
    /// After the event the running total rate is checked against the
    /// directly summed value, resynchronized on a fixed cadence, and the
    /// population is doubled when aggregation has consumed half of its peak
    /// count.
    ///
    /// # Returns
    ///
    /// * `Ok(dt)` - The time increment `1 / R`, with `R` the total rate at
    ///   the moment the pair was drawn
    /// * `Err(String)` - Fewer than two particles, or a non-positive total
    ///   rate that admits no draw
    ///
    /// # Panics
    ///
    /// Panics if the running total rate has drifted from the per-bucket
    /// rates by 1.0 or more, which indicates a rate-bookkeeping bug.
    pub fn run_step(&mut self) -> Result<f64, String> {
        if self.num_particles < 2 {
            return Err(format!(
                "a collision step needs at least two particles, have {}",
                self.num_particles
            ));
        }
        let step_rate = self.total_rate;
        let pair_draw = Uniform::new(0.0, step_rate)
            .map_err(|_| format!("total collision rate {} admits no draw", step_rate))?
            .sample(&mut self.rng);
        let (first_idx, second_idx) = self.find_pair(pair_draw);

        let branch_draw = Uniform::new(0.0, 1.0 + self.fragmentation_rate)
            .unwrap()
            .sample(&mut self.rng);
        let combined_size = self.bucket(first_idx).size + self.bucket(second_idx).size;

        if branch_draw < 1.0 {
            self.add_particle(combined_size);
        } else {
            self.add_monomers(combined_size);
        }
        self.delete_pair(first_idx, second_idx);

        // Drift is checked before the resync so a broken update cannot be
        // papered over by the rewrite that follows.
        let summed = self.summed_rate();
        assert!(
            (self.total_rate - summed).abs() < MAX_RATE_DRIFT,
            "total collision rate drifted: running {} vs summed {}",
            self.total_rate,
            summed
        );
        if self.step_counter % RATE_RESYNC_INTERVAL == 0 {
            self.total_rate = summed;
        }

        if self.num_particles <= self.max_num_particles / 2 {
            self.duplicate_particles();
        }

        self.step_counter += 1;
        Ok(1.0 / step_rate)
    }

    /// Doubles every bucket's multiplicity in place.
    ///
    /// Aggregation steadily shrinks the sampled population; doubling it once
    /// it falls to half its peak restores statistical resolution without
    /// changing the normalized mass distribution. The occupied buckets are
    /// snapshotted first, then replayed through the ordinary insertion
    /// paths, and the total rate is rebuilt at the end.
    pub fn duplicate_particles(&mut self) {
        let snapshot: Vec<(u64, u64)> = (1..self.total_size)
            .map(|idx| {
                let bucket = self.bucket(idx);
                (bucket.size, bucket.count)
            })
            .filter(|&(_, count)| count > 0)
            .collect();

        for (size, count) in snapshot {
            if size == 1 {
                self.add_monomers(count);
            } else {
                for _ in 0..count {
                    self.add_particle(size);
                }
            }
        }

        self.recompute_total();
    }
}
