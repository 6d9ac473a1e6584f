//! Incremental maintenance of per-bucket and total collision rates.
//!
//! Every mutation sweeps the existing buckets once, adjusting each stored
//! per-particle rate by the kernel value against the inserted or removed
//! mass while accumulating the newcomer's own aggregated rate in the same
//! pass. The scalar total advances by twice the aggregated rate because
//! each unordered pair is counted once in either member's bucket.
//!
//! All arithmetic is double precision; the accumulated drift of the running
//! total against the directly summed value is asserted below 1.0 at every
//! step boundary and periodically rewritten by [`Ensemble::recompute_total`].

use super::{Ensemble, MONOMER_INDEX};

impl Ensemble {
    /// Adds one particle of the given mass.
    ///
    /// Sweeps every occupied bucket, raising its per-particle rate by the
    /// kernel value against the newcomer while summing the newcomer's own
    /// rate over the pre-existing population. The newcomer's bucket stores
    /// exactly that sum: the particle has no peer of its own yet, and if the
    /// bucket already existed the overwrite equals the old rate corrected
    /// for the extra peer.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn add_particle(&mut self, size: u64) {
        assert!(size > 0, "particle mass must be positive");

        let kernel = self.kernel;
        let mut rate = 0.0;
        for idx in 0..self.total_size {
            let bucket = self.bucket_mut(idx);
            if bucket.count == 0 {
                continue;
            }
            let collision_value = kernel.evaluate(size, bucket.size);
            rate += bucket.count as f64 * collision_value;
            bucket.collision_rate += collision_value;
        }

        self.insert(size, rate);
        self.total_rate += 2.0 * rate;
        self.num_particles += 1;
        self.max_num_particles = self.max_num_particles.max(self.num_particles);
    }

    /// Adds a batch of monomers in a single sweep.
    ///
    /// Existing buckets gain the full batch's contribution at once. The
    /// monomer bucket stores the rate of one newcomer against everything
    /// else including its new siblings, and the remaining count is added
    /// without another sweep. The total is raised by twice the batch's
    /// aggregated rate and then corrected downward, since newcomer pairs
    /// would otherwise be counted on both sides.
    ///
    /// # Panics
    ///
    /// Panics if `num_monomers` is zero.
    pub fn add_monomers(&mut self, num_monomers: u64) {
        assert!(num_monomers > 0, "monomer batch must not be empty");

        let kernel = self.kernel;
        let kappa = kernel.evaluate(1, 1);
        let batch = num_monomers as f64;
        let mut rate = (batch - 1.0) * kappa;
        for idx in 0..self.total_size {
            let bucket = self.bucket_mut(idx);
            if bucket.count == 0 {
                continue;
            }
            let collision_value = kernel.evaluate(1, bucket.size);
            rate += bucket.count as f64 * collision_value;
            bucket.collision_rate += batch * collision_value;
        }

        self.insert(1, rate);
        self.small_buckets[MONOMER_INDEX].count += num_monomers - 1;
        self.total_rate += 2.0 * batch * rate;
        self.total_rate -= kappa * batch * (batch - 1.0);
        self.num_particles += num_monomers;
        self.max_num_particles = self.max_num_particles.max(self.num_particles);
    }

    /// Removes one particle at the given logical index.
    ///
    /// The sweep runs over the population that remains after the removal,
    /// so the aggregated rate being unwound is recomputed fresh rather than
    /// read from the deleted bucket; this keeps long-accumulated drift out
    /// of the running total.
    pub fn delete_particle(&mut self, idx: usize) {
        let deleted_size = self.bucket(idx).size;
        self.remove(idx);

        let kernel = self.kernel;
        let mut rate = 0.0;
        for i in 0..self.total_size {
            let bucket = self.bucket_mut(i);
            if bucket.count == 0 {
                continue;
            }
            let collision_value = kernel.evaluate(deleted_size, bucket.size);
            rate += bucket.count as f64 * collision_value;
            bucket.collision_rate -= collision_value;
        }

        self.total_rate -= 2.0 * rate;
        self.num_particles -= 1;
    }

    /// Removes both particles of a sampled pair.
    ///
    /// The higher logical index is removed first so that a swap-removal in
    /// the dynamic region cannot invalidate the other index. The two indices
    /// may denote the same bucket, meaning two distinct particles of one
    /// mass.
    pub fn delete_pair(&mut self, first_idx: usize, second_idx: usize) {
        let (upper, lower) = if first_idx >= second_idx {
            (first_idx, second_idx)
        } else {
            (second_idx, first_idx)
        };
        self.delete_particle(upper);
        self.delete_particle(lower);
    }

    /// Rewrites the running total from the per-bucket rates.
    pub fn recompute_total(&mut self) {
        self.total_rate = self.summed_rate();
    }

    /// Directly sums `count * collision_rate` over all buckets.
    pub(crate) fn summed_rate(&self) -> f64 {
        (0..self.total_size)
            .map(|idx| {
                let bucket = self.bucket(idx);
                bucket.count as f64 * bucket.collision_rate
            })
            .sum()
    }
}
