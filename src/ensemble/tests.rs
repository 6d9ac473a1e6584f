#[cfg(test)]
mod units {
    use crate::ensemble::{DENSE_REGION_SIZE, Ensemble};
    use crate::kernel::CollisionKernel;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Uniform};

    /// Helper building an empty ensemble with the plain product kernel
    /// K(a, b) = a * b, the form all hand-computed rate values below assume.
    fn product_ensemble() -> Ensemble {
        Ensemble::new(
            CollisionKernel::Multiplicative { normalization: 1.0 },
            0.0,
            7,
        )
        .expect("valid construction parameters")
    }

    /// Helper asserting the occupied buckets in ascending mass order.
    fn assert_distribution(ensemble: &Ensemble, expected: &[(u64, u64, f64)]) {
        let actual = ensemble.distribution();
        assert_eq!(
            actual.len(),
            expected.len(),
            "bucket count mismatch: {:?} vs {:?}",
            actual,
            expected
        );
        for (bucket, &(size, count, rate)) in actual.iter().zip(expected) {
            assert_eq!(bucket.size, size, "mass mismatch in {:?}", actual);
            assert_eq!(bucket.count, count, "count mismatch for mass {}", size);
            assert!(
                (bucket.collision_rate - rate).abs() < 1e-8,
                "rate mismatch for mass {}: {} vs {}",
                size,
                bucket.collision_rate,
                rate
            );
        }
    }

    /// Helper checking every stored bucket rate against a direct pairwise
    /// summation over the distribution.
    fn assert_bucket_rates_consistent(ensemble: &Ensemble) {
        let buckets = ensemble.distribution();
        let kernel = ensemble.kernel();
        for bucket in &buckets {
            let mut expected = kernel.evaluate(bucket.size, bucket.size) * (bucket.count - 1) as f64;
            for other in &buckets {
                if other.size != bucket.size {
                    expected += kernel.evaluate(bucket.size, other.size) * other.count as f64;
                }
            }
            let scale = expected.abs().max(1.0);
            assert!(
                (bucket.collision_rate - expected).abs() < 1e-9 * scale,
                "bucket for mass {} stores rate {} but pairwise sum gives {}",
                bucket.size,
                bucket.collision_rate,
                expected
            );
        }
    }

    /// Helper checking the running total against the per-bucket rates.
    fn assert_total_rate_consistent(ensemble: &Ensemble) {
        let summed: f64 = ensemble
            .distribution()
            .iter()
            .map(|bucket| bucket.count as f64 * bucket.collision_rate)
            .sum();
        assert!(
            (ensemble.total_rate() - summed).abs() < 1.0,
            "running total {} drifted from summed {}",
            ensemble.total_rate(),
            summed
        );
    }

    /// Helper summing `count * size` over the distribution.
    fn total_mass(ensemble: &Ensemble) -> u64 {
        ensemble
            .distribution()
            .iter()
            .map(|bucket| bucket.count * bucket.size)
            .sum()
    }

    #[test]
    fn adding_particles_tracks_rates_exactly() {
        let mut ensemble = product_ensemble();

        ensemble.add_particle(1);
        assert_distribution(&ensemble, &[(1, 1, 0.0)]);

        ensemble.add_particle(1);
        assert_distribution(&ensemble, &[(1, 2, 1.0)]);

        ensemble.add_particle(2);
        assert_distribution(&ensemble, &[(1, 2, 3.0), (2, 1, 4.0)]);

        ensemble.add_particle(10000);
        assert_distribution(
            &ensemble,
            &[(1, 2, 10003.0), (2, 1, 20004.0), (10000, 1, 40000.0)],
        );

        assert_eq!(ensemble.num_particles(), 4);
        assert_total_rate_consistent(&ensemble);
        assert_bucket_rates_consistent(&ensemble);
    }

    #[test]
    fn find_pair_walks_the_rate_intervals() {
        let mut ensemble = product_ensemble();
        ensemble.add_particle(1);
        ensemble.add_particle(1);
        ensemble.add_particle(2);
        ensemble.add_particle(10000);

        // Bucket groups in index order: mass 1 spans [0, 20006), mass 2
        // spans [20006, 40010), mass 10000 spans [40010, 80010).
        let big = DENSE_REGION_SIZE;
        let cases = [
            (0.0, (1, 1)),
            (2.0, (1, 2)),
            (5000.0, (1, big)),
            (10003.5, (1, 1)),
            (10005.0, (1, 2)),
            (15000.0, (1, big)),
            (20007.0, (2, 1)),
            (20009.0, (2, 1)),
            (25000.0, (2, big)),
            (45000.0, (big, 1)),
            (55000.0, (big, 1)),
            (65000.0, (big, 2)),
        ];
        for (draw, expected) in cases {
            assert_eq!(
                ensemble.find_pair(draw),
                expected,
                "draw {} selected the wrong pair",
                draw
            );
        }
    }

    #[test]
    fn monomer_batch_matches_single_insertions() {
        let mut ensemble = product_ensemble();
        ensemble.add_particle(2);
        ensemble.add_particle(10000);

        ensemble.add_monomers(2);
        assert_distribution(
            &ensemble,
            &[(1, 2, 10003.0), (2, 1, 20004.0), (10000, 1, 40000.0)],
        );
        assert_eq!(ensemble.num_particles(), 4);
        assert_total_rate_consistent(&ensemble);
    }

    #[test]
    fn monomer_batch_updates_existing_buckets() {
        let mut ensemble = product_ensemble();
        ensemble.add_particle(2);
        ensemble.add_particle(2);
        ensemble.add_particle(1);

        ensemble.add_monomers(2);
        assert_distribution(&ensemble, &[(1, 3, 6.0), (2, 2, 10.0)]);
        assert_eq!(ensemble.num_particles(), 5);
        assert_total_rate_consistent(&ensemble);
        assert_bucket_rates_consistent(&ensemble);
    }

    #[test]
    fn deleting_particles_unwinds_rates() {
        let mut ensemble = product_ensemble();
        ensemble.add_particle(1);
        ensemble.add_particle(1);
        ensemble.add_particle(2);
        ensemble.add_particle(10000);

        ensemble.delete_particle(2);
        assert_distribution(&ensemble, &[(1, 2, 10001.0), (10000, 1, 20000.0)]);

        ensemble.delete_particle(1);
        assert_distribution(&ensemble, &[(1, 1, 10000.0), (10000, 1, 10000.0)]);

        ensemble.delete_particle(DENSE_REGION_SIZE);
        assert_distribution(&ensemble, &[(1, 1, 0.0)]);

        ensemble.delete_particle(1);
        assert_distribution(&ensemble, &[]);
        assert_eq!(ensemble.num_particles(), 0);
        assert!(ensemble.total_rate().abs() < 1e-8);
    }

    #[test]
    fn deleting_pairs_survives_dynamic_compaction() {
        let mut ensemble = product_ensemble();
        ensemble.add_particle(5000);
        ensemble.add_particle(6000);
        ensemble.add_particle(7000);
        ensemble.add_particle(7000);

        // Removing the higher index first keeps the lower one valid even
        // though the dynamic region compacts by swap-removal.
        ensemble.delete_pair(DENSE_REGION_SIZE + 1, DENSE_REGION_SIZE);
        let masses: Vec<u64> = ensemble
            .distribution()
            .iter()
            .map(|bucket| bucket.size)
            .collect();
        assert_eq!(masses, vec![7000]);
        assert_eq!(ensemble.num_particles(), 2);
        assert_bucket_rates_consistent(&ensemble);
        assert_total_rate_consistent(&ensemble);

        // A same-bucket pair removes two distinct particles of one mass.
        let seven_idx = DENSE_REGION_SIZE;
        ensemble.delete_pair(seven_idx, seven_idx);
        assert_distribution(&ensemble, &[]);
        assert_eq!(ensemble.num_particles(), 0);
    }

    #[test]
    fn dynamic_buckets_share_one_slot_per_mass() {
        let mut ensemble = product_ensemble();
        ensemble.add_particle(4321);
        ensemble.add_particle(4321);
        ensemble.add_particle(4321);

        let buckets = ensemble.distribution();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 3);
        assert_bucket_rates_consistent(&ensemble);
    }

    #[test]
    fn bucket_rates_match_direct_summation() {
        let mut ensemble = Ensemble::new(CollisionKernel::Brownian { alpha: 0.9 }, 0.0, 11)
            .expect("valid construction parameters");
        ensemble.add_monomers(40);
        ensemble.add_particle(3);
        ensemble.add_particle(3);
        ensemble.add_particle(17);
        ensemble.add_particle(2500);
        ensemble.add_particle(2500);
        ensemble.add_monomers(5);

        assert_bucket_rates_consistent(&ensemble);
        assert_total_rate_consistent(&ensemble);
    }

    #[test]
    fn running_total_survives_mixed_mutations() {
        let mut ensemble = Ensemble::new(CollisionKernel::Ballistic, 0.0, 13)
            .expect("valid construction parameters");
        ensemble.add_monomers(30);
        ensemble.add_particle(9);
        ensemble.add_particle(9);
        ensemble.add_particle(1500);
        assert_total_rate_consistent(&ensemble);

        ensemble.delete_pair(1, 9);
        assert_total_rate_consistent(&ensemble);

        ensemble.delete_particle(DENSE_REGION_SIZE);
        assert_total_rate_consistent(&ensemble);
        assert_bucket_rates_consistent(&ensemble);
    }

    #[test]
    fn duplication_doubles_every_count() {
        let mut ensemble = product_ensemble();
        ensemble.add_monomers(6);
        ensemble.add_particle(4);
        ensemble.add_particle(4);
        ensemble.add_particle(2000);

        let before = ensemble.distribution();
        let particles_before = ensemble.num_particles();

        ensemble.duplicate_particles();

        let after = ensemble.distribution();
        assert_eq!(ensemble.num_particles(), 2 * particles_before);
        assert_eq!(before.len(), after.len());
        for (old, new) in before.iter().zip(&after) {
            assert_eq!(old.size, new.size);
            assert_eq!(2 * old.count, new.count);
        }
        assert_bucket_rates_consistent(&ensemble);
        assert_total_rate_consistent(&ensemble);
    }

    #[test]
    fn sampler_frequencies_follow_kernel_weights() {
        let mut ensemble = product_ensemble();
        ensemble.add_monomers(2);
        ensemble.add_particle(2);

        // Ordered-pair weights: (1,1) carries 2, (1,2) and (2,1) carry 4
        // each, for a total rate of 10.
        assert!((ensemble.total_rate() - 10.0).abs() < 1e-9);

        let mut rng = StdRng::seed_from_u64(2718);
        let draw = Uniform::new(0.0, ensemble.total_rate()).unwrap();
        let samples = 50_000;
        let mut monomer_monomer = 0u32;
        let mut monomer_dimer = 0u32;
        let mut dimer_monomer = 0u32;
        for _ in 0..samples {
            match ensemble.find_pair(draw.sample(&mut rng)) {
                (1, 1) => monomer_monomer += 1,
                (1, 2) => monomer_dimer += 1,
                (2, 1) => dimer_monomer += 1,
                other => panic!("impossible pair {:?}", other),
            }
        }

        let fraction = |count: u32| count as f64 / samples as f64;
        assert!(
            (fraction(monomer_monomer) - 0.2).abs() < 0.02,
            "monomer-monomer fraction off: {}",
            fraction(monomer_monomer)
        );
        assert!(
            (fraction(monomer_dimer) - 0.4).abs() < 0.02,
            "monomer-dimer fraction off: {}",
            fraction(monomer_dimer)
        );
        assert!(
            (fraction(dimer_monomer) - 0.4).abs() < 0.02,
            "dimer-monomer fraction off: {}",
            fraction(dimer_monomer)
        );
    }

    #[test]
    fn add_particle_repeated_matches_individual_adds() {
        let mut batched = product_ensemble();
        batched.add_particle_repeated(5, 4);

        let mut manual = product_ensemble();
        for _ in 0..4 {
            manual.add_particle(5);
        }

        assert_eq!(batched.distribution(), manual.distribution());
        assert_eq!(batched.num_particles(), manual.num_particles());
    }

    #[test]
    fn constructor_rejects_negative_fragmentation_rate() {
        assert!(Ensemble::new(CollisionKernel::Constant, -0.5, 1).is_err());
        assert!(Ensemble::new(CollisionKernel::Constant, f64::NAN, 1).is_err());
        assert!(Ensemble::new(CollisionKernel::Constant, 0.0, 1).is_ok());
    }

    #[test]
    fn stepping_requires_a_collision_partner() {
        let mut empty = product_ensemble();
        assert!(empty.run_step().is_err());

        let mut single = product_ensemble();
        single.add_particle(3);
        assert!(single.run_step().is_err());
    }

    #[test]
    fn aggregation_steps_conserve_mass() {
        let mut ensemble = Ensemble::new(CollisionKernel::Constant, 0.0, 21)
            .expect("valid construction parameters");
        ensemble.add_monomers(64);
        assert_eq!(total_mass(&ensemble), 64);

        for _ in 0..40 {
            let dt = ensemble.run_step().expect("population stays steppable");
            assert!(dt > 0.0 && dt.is_finite());
            // Population doubling scales mass deterministically, so mass
            // stays a power-of-two multiple of the seeded amount.
            let mass = total_mass(&ensemble);
            assert!(
                mass.is_power_of_two() && mass >= 64,
                "mass {} is not a doubling of the seed",
                mass
            );
            assert_total_rate_consistent(&ensemble);
        }
        assert_eq!(ensemble.step_count(), 40);
    }

    #[test]
    fn fragmentation_dominates_for_large_rates() {
        let mut ensemble = Ensemble::new(
            CollisionKernel::Multiplicative { normalization: 1.0 },
            10000.0,
            5,
        )
        .expect("valid construction parameters");
        ensemble.add_particle(10000);
        ensemble.add_particle(20000);

        ensemble.run_step().expect("two particles are steppable");

        // The pair is forced; only the branch is random. Fragmentation
        // shatters the combined mass into monomers and carries probability
        // 10000/10001. Aggregation leaves a single particle, which
        // immediately triggers population doubling.
        if ensemble.num_particles() == 30000 {
            assert_eq!(total_mass(&ensemble), 30000);
            assert_distribution(&ensemble, &[(1, 30000, 29999.0)]);
        } else {
            assert_eq!(ensemble.num_particles(), 2);
            assert_distribution(&ensemble, &[(30000, 2, 900_000_000.0)]);
        }
        assert_total_rate_consistent(&ensemble);
    }

    #[test]
    fn two_steps_from_four_monomers_reach_an_admissible_state() {
        let mut ensemble = product_ensemble();
        ensemble.add_monomers(4);

        ensemble.run_step().expect("steppable");
        ensemble.run_step().expect("steppable");

        // Pure aggregation takes four monomers to three particles and then
        // to two, which triggers population doubling. Depending on the
        // second pair the result is four dimers, or two monomers and two
        // trimers.
        assert_eq!(ensemble.num_particles(), 4);
        let admissible: [&[(u64, u64, f64)]; 2] =
            [&[(2, 4, 12.0)], &[(1, 2, 7.0), (3, 2, 15.0)]];
        let buckets: Vec<(u64, u64)> = ensemble
            .distribution()
            .iter()
            .map(|bucket| (bucket.size, bucket.count))
            .collect();
        let matched = admissible.iter().find(|expected| {
            expected.len() == buckets.len()
                && expected
                    .iter()
                    .zip(&buckets)
                    .all(|(&(size, count, _), &(actual_size, actual_count))| {
                        size == actual_size && count == actual_count
                    })
        });
        let expected = matched.unwrap_or_else(|| panic!("unexpected state {:?}", buckets));
        assert_distribution(&ensemble, expected);
        assert_bucket_rates_consistent(&ensemble);
        assert_total_rate_consistent(&ensemble);
    }

    #[test]
    fn equal_seeds_reproduce_identical_runs() {
        let build = || {
            let mut ensemble = Ensemble::new(CollisionKernel::Brownian { alpha: 0.5 }, 0.5, 99)
                .expect("valid construction parameters");
            ensemble.add_monomers(50);
            ensemble
        };
        let mut first = build();
        let mut second = build();

        for _ in 0..30 {
            let dt_first = first.run_step().expect("steppable");
            let dt_second = second.run_step().expect("steppable");
            assert_eq!(dt_first, dt_second);
        }
        assert_eq!(first.distribution(), second.distribution());
        assert_eq!(first.num_particles(), second.num_particles());
    }
}
