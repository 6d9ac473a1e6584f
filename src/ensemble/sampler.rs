//! Weighted two-stage selection of a collision pair.
//!
//! A uniform draw on `[0, total_rate)` walks the buckets twice. The first
//! stage spends the draw against whole bucket groups weighted by
//! `count * collision_rate`; the second spends the residual against the
//! selected mass's kernel row, with the selected bucket's count reduced by
//! one so a particle can never collide with itself. Both stages cost one
//! pass over the distinct masses.

use super::Ensemble;
use log::error;

/// Position reached by one search stage: the chosen logical index and the
/// rate left to spend in the next stage.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchResult {
    pub idx: usize,
    pub remaining_rate: f64,
}

impl Ensemble {
    /// Converts a uniform draw on `[0, total_rate)` into an ordered pair of
    /// logical bucket indices.
    ///
    /// The pair is distributed proportionally to
    /// `count_i * count_j * K(size_i, size_j)` for distinct buckets and to
    /// `count_i * (count_i - 1) * K(size_i, size_i)` within one bucket.
    /// Equal indices denote two distinct particles of the same mass.
    ///
    /// The returned indices are invalidated by any subsequent deletion or
    /// step; they must be consumed immediately.
    pub fn find_pair(&self, rate: f64) -> (usize, usize) {
        let first = self.find_first(rate);
        let second = self.find_second(first);
        (first.idx, second.idx)
    }

    /// Stage 1: spends the draw against `count * collision_rate` bucket
    /// groups and selects the bucket where it runs out.
    ///
    /// The residual handed to stage 2 is snapped down to a whole multiple
    /// of the terminal bucket's per-particle rate, which keeps the choice of
    /// peer uniform over that bucket's particles.
    fn find_first(&self, mut rate: f64) -> SearchResult {
        let mut last_valid = 0;
        for idx in 1..self.total_size {
            let bucket = self.bucket(idx);
            if bucket.count == 0 {
                continue;
            }
            last_valid = idx;
            let group_rate = bucket.count as f64 * bucket.collision_rate;
            if rate - group_rate <= 0.0 {
                rate -= (rate / bucket.collision_rate).floor() * bucket.collision_rate;
                return SearchResult {
                    idx: last_valid,
                    remaining_rate: rate,
                };
            }
            rate -= group_rate;
        }

        // Reaching here means the draw outran the per-bucket rates, which
        // only accumulated drift can cause; the next periodic resync heals
        // it. Fall back to the degenerate index.
        error!(
            "pair search exhausted {} buckets with residual rate {}",
            self.total_size, rate
        );
        SearchResult {
            idx: 0,
            remaining_rate: rate,
        }
    }

    /// Stage 2: spends the residual against the selected mass's kernel row.
    ///
    /// The first bucket's effective count is reduced by one, removing the
    /// self-pair of a single physical particle while leaving same-bucket
    /// pairs of distinct particles selectable.
    fn find_second(&self, first: SearchResult) -> SearchResult {
        let mut rate = first.remaining_rate;
        let first_size = self.bucket(first.idx).size;
        let mut last_valid = 0;
        for idx in 1..self.total_size {
            let bucket = self.bucket(idx);
            let mut count = bucket.count as f64;
            if idx == first.idx {
                count -= 1.0;
            }
            if count <= 0.0 {
                continue;
            }
            last_valid = idx;
            let group_rate = count * self.kernel.evaluate(first_size, bucket.size);
            if rate - group_rate <= 0.0 {
                return SearchResult {
                    idx: last_valid,
                    remaining_rate: rate,
                };
            }
            rate -= group_rate;
        }

        error!(
            "peer search for mass {} exhausted {} buckets with residual rate {}",
            first_size, self.total_size, rate
        );
        SearchResult {
            idx: last_valid,
            remaining_rate: rate,
        }
    }
}
