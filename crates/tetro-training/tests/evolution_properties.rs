//! Property tests for the weight operators and the generation loop.
//!
//! Invariants covered:
//! - Repeated mutation never leaves the weight range, whatever the step size.
//! - Every crossover policy keeps children inside the weight range.
//! - The population size is the same in every generation.
//! - A run is a deterministic function of its configuration.

use proptest::prelude::*;
use rand::SeedableRng as _;
use rand_pcg::Pcg64Mcg;
use tetro_training::{
    config::TrainingConfig,
    genetic::GeneticOptimizer,
    weights::{self, CrossoverPolicy, Mutation},
};

fn weight_vector(range: f32) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-range..=range, 4)
}

fn crossover_strategy() -> impl Strategy<Value = CrossoverPolicy> {
    prop_oneof![
        Just(CrossoverPolicy::SinglePoint),
        Just(CrossoverPolicy::Average),
        Just(CrossoverPolicy::Blend),
    ]
}

proptest! {
    #[test]
    fn mutation_stays_in_range(
        seed in any::<u64>(),
        start in weight_vector(1.0),
        sigma in 0.0f32..4.0,
        max_delta in 0.01f32..4.0,
    ) {
        let mutation = Mutation::new(1.0, sigma, max_delta, 1.0).unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let mut w = start;
        for _ in 0..10_000 {
            mutation.apply(&mut w, &mut rng);
            prop_assert!(w.iter().all(|c| (-1.0..=1.0).contains(c)), "{w:?}");
        }
    }

    #[test]
    fn crossover_stays_in_range(
        seed in any::<u64>(),
        policy in crossover_strategy(),
        p1 in weight_vector(0.5),
        p2 in weight_vector(0.5),
        alpha in 0.0f32..3.0,
    ) {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let child = policy.combine(&p1, &p2, alpha, 0.5, &mut rng);
        prop_assert_eq!(child.len(), 4);
        prop_assert!(weights::validate(&child, 0.5).is_ok(), "{child:?}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn population_size_is_invariant(
        seed in any::<u64>(),
        population_size in 2usize..10,
        elite_fraction in 0.0f64..1.0,
        crossover in crossover_strategy(),
    ) {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss,
            clippy::cast_sign_loss
        )]
        let elite_count = ((population_size - 1) as f64 * elite_fraction) as usize;
        let config = TrainingConfig {
            population_size,
            elite_count,
            tournament_size: 2,
            crossover,
            max_generations: 3,
            move_cap: 25,
            seed,
            ..TrainingConfig::default()
        };
        let mut optimizer = GeneticOptimizer::new(config).unwrap();
        while optimizer.step().is_some() {
            prop_assert_eq!(optimizer.population().len(), population_size);
        }
    }

    #[test]
    fn seeded_runs_are_reproducible(seed in any::<u64>()) {
        let config = TrainingConfig {
            population_size: 5,
            max_generations: 3,
            move_cap: 40,
            seed,
            ..TrainingConfig::default()
        };
        let run = || {
            let mut optimizer = GeneticOptimizer::new(config.clone()).unwrap();
            let mut reports = Vec::new();
            let outcome = optimizer.run(|report| {
                reports.push((report.best.clone(), report.summary, report.seeds.clone()));
            });
            (reports, outcome.best)
        };
        prop_assert_eq!(run(), run());
    }
}
