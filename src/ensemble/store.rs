//! Bucket storage across the dense and dynamic regions.
//!
//! The physical split is a locality optimization only: logical index `i`
//! resolves to the dense array for `i` below the region limit and to the
//! packed dynamic list past it. Nothing outside this module depends on
//! which region a bucket lives in.

use super::{Bucket, DENSE_REGION_SIZE, Ensemble};

impl Ensemble {
    /// Resolves a logical index to its bucket.
    pub(crate) fn bucket(&self, idx: usize) -> &Bucket {
        if idx < DENSE_REGION_SIZE {
            &self.small_buckets[idx]
        } else {
            &self.large_buckets[idx - DENSE_REGION_SIZE]
        }
    }

    /// Resolves a logical index to its bucket, mutably.
    pub(crate) fn bucket_mut(&mut self, idx: usize) -> &mut Bucket {
        if idx < DENSE_REGION_SIZE {
            &mut self.small_buckets[idx]
        } else {
            &mut self.large_buckets[idx - DENSE_REGION_SIZE]
        }
    }

    /// Adds one particle of the given mass with the given stored rate.
    ///
    /// If a bucket for the mass already exists its count is incremented and
    /// its collision rate overwritten; otherwise a bucket with count 1 is
    /// created. Dense-region buckets are addressed directly by mass, so the
    /// iteration bound ratchets up to cover them; dynamic insertions pin the
    /// bound to the end of the dynamic list.
    pub(crate) fn insert(&mut self, size: u64, rate: f64) {
        if (size as usize) < DENSE_REGION_SIZE {
            let bucket = &mut self.small_buckets[size as usize];
            bucket.count += 1;
            bucket.collision_rate = rate;
            self.total_size = self.total_size.max(size as usize + 1);
        } else if let Some(bucket) = self
            .large_buckets
            .iter_mut()
            .find(|bucket| bucket.size == size)
        {
            bucket.count += 1;
            bucket.collision_rate = rate;
        } else {
            self.large_buckets.push(Bucket {
                size,
                count: 1,
                collision_rate: rate,
            });
            self.total_size = DENSE_REGION_SIZE + self.large_buckets.len();
        }
    }

    /// Removes one particle at the given logical index.
    ///
    /// A dynamic bucket whose count reaches zero is swap-removed, so logical
    /// indices of other dynamic buckets may change. Dense buckets stay in
    /// place for the ensemble's lifetime.
    pub(crate) fn remove(&mut self, idx: usize) {
        if idx < DENSE_REGION_SIZE {
            self.small_buckets[idx].count -= 1;
        } else {
            let large_idx = idx - DENSE_REGION_SIZE;
            self.large_buckets[large_idx].count -= 1;
            if self.large_buckets[large_idx].count == 0 {
                self.large_buckets.swap_remove(large_idx);
                self.total_size = DENSE_REGION_SIZE + self.large_buckets.len();
            }
        }
    }
}
