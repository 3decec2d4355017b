//! Genetic algorithm over heuristic weight vectors.
//!
//! [`GeneticOptimizer`] evolves a [`Population`] of [`Individual`]s, each a weight vector
//! for the default heuristic agent plus its fitness (lines cleared).
//!
//! # Algorithm Overview
//!
//! ```text
//! Initialize → Evaluate → Select → Reproduce → (loop to Evaluate) → Terminate
//! ```
//!
//! 1. **Initialize** - `population_size` random weight vectors, every coefficient uniform
//!    in `[-weight_range, weight_range]`
//! 2. **Evaluate** - Every individual without a fitness plays `games_per_individual` games.
//!    The piece seeds are drawn once per run and shared by every individual of every
//!    generation, so a kept fitness stays comparable with a fresh one
//! 3. **Select** - Tournament selection: `tournament_size` distinct individuals are drawn
//!    and the fittest wins, the lower population index winning ties
//! 4. **Reproduce** - The `elite_count` best individuals are copied unchanged, fitness
//!    included. Every other slot is filled by a child of two selected parents
//!    ([`CrossoverPolicy`](crate::weights::CrossoverPolicy) then
//!    [`Mutation`](crate::weights::Mutation)) whose fitness is unknown
//! 5. **Terminate** - After `max_generations` evaluated generations, or as soon as the best
//!    fitness reaches `target_fitness`
//!
//! # Restart
//!
//! A generation whose best individual clears no more than `restart_fitness` lines carries
//! no useful signal for selection. Its offspring are replaced by fresh random individuals;
//! elites are still kept.
//!
//! # Corrupt Children
//!
//! A child with a non-finite or out-of-range coefficient is bred again a few times and
//! finally repaired by [`weights::repair`]. Corrupt vectors never reach evaluation.
//!
//! # Parallelization
//!
//! With `parallel_evaluation`, each individual is evaluated on its own scoped thread.
//! Evaluation does not touch the optimizer's random number generator, so the result of a
//! run does not depend on this setting.
//!
//! A panicking evaluation is caught, logged and assigned fitness 0; the rest of the
//! generation is unaffected.

use std::{
    cmp::Reverse,
    fmt,
    panic::{self, AssertUnwindSafe},
    thread,
};

use rand::{Rng, SeedableRng as _, seq::index};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use tetro_engine::{PieceBag, PieceSeed};
use tetro_evaluator::{
    WeightDimensionMismatch,
    board_feature::BoardFeature,
    placement_evaluator::FeatureEvaluator,
    simulator::{GameSimulator, HeuristicAgent},
};

use crate::{
    config::{ConfigError, TrainingConfig},
    summary::FitnessSummary,
    weights::{self, Mutation},
};

/// A weight vector and its fitness, `None` until evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    weights: Vec<f32>,
    fitness: Option<u64>,
}

impl Individual {
    #[must_use]
    pub fn new(weights: Vec<f32>) -> Self {
        Self {
            weights,
            fitness: None,
        }
    }

    pub fn random<R>(rng: &mut R, range: f32, feature_count: usize) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::new(weights::random(rng, range, feature_count))
    }

    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Lines cleared over the games of the run's piece seeds.
    #[must_use]
    pub fn fitness(&self) -> Option<u64> {
        self.fitness
    }
}

/// The individuals of one generation.
///
/// After evaluation the individuals are ordered by fitness, best first; the order of equally
/// fit individuals is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    #[must_use]
    pub fn new(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    pub fn random<R>(count: usize, feature_count: usize, range: f32, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let individuals = (0..count)
            .map(|_| Individual::random(rng, range, feature_count))
            .collect();
        Self { individuals }
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// The fittest individual; the lowest index wins ties and unevaluated individuals lose.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .enumerate()
            .min_by_key(|(i, ind)| (Reverse(ind.fitness), *i))
            .map(|(_, ind)| ind)
    }

    /// Evaluates every individual whose fitness is unknown, then orders by fitness.
    pub fn evaluate(&mut self, evaluator: &FitnessEvaluator, parallel: bool) {
        self.evaluate_with(|weights| evaluator.evaluate(weights), parallel);
    }

    fn evaluate_with<F, E>(&mut self, fitness: F, parallel: bool)
    where
        F: Fn(&[f32]) -> Result<u64, E> + Sync,
        E: fmt::Display,
    {
        let fitness = &fitness;
        let pending = self
            .individuals
            .iter_mut()
            .filter(|ind| ind.fitness.is_none());
        if parallel {
            thread::scope(|s| {
                for ind in pending {
                    s.spawn(move || {
                        ind.fitness = Some(evaluate_isolated(fitness, &ind.weights));
                    });
                }
            });
        } else {
            for ind in pending {
                ind.fitness = Some(evaluate_isolated(fitness, &ind.weights));
            }
        }

        // stable sort by fitness descending
        self.individuals.sort_by_key(|ind| Reverse(ind.fitness));
    }

    /// Summary of the fitness values, counting unevaluated individuals as 0.
    #[must_use]
    pub fn fitness_summary(&self) -> Option<FitnessSummary> {
        FitnessSummary::new(self.individuals.iter().map(|ind| ind.fitness.unwrap_or(0)))
    }
}

/// Plays the games of a run for a weight vector.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    simulator: GameSimulator,
    features: Vec<BoardFeature>,
    seeds: Vec<PieceSeed>,
}

impl FitnessEvaluator {
    #[must_use]
    pub fn new(
        simulator: GameSimulator,
        features: Vec<BoardFeature>,
        seeds: Vec<PieceSeed>,
    ) -> Self {
        Self {
            simulator,
            features,
            seeds,
        }
    }

    #[must_use]
    pub fn seeds(&self) -> &[PieceSeed] {
        &self.seeds
    }

    /// Total lines cleared over one game per seed.
    ///
    /// ```
    /// use tetro_engine::{BoardSize, PieceSeed};
    /// use tetro_evaluator::{board_feature::BoardFeature, simulator::GameSimulator};
    /// use tetro_training::genetic::FitnessEvaluator;
    ///
    /// let evaluator = FitnessEvaluator::new(
    ///     GameSimulator::new(BoardSize::STANDARD, 100),
    ///     BoardFeature::DEFAULT.to_vec(),
    ///     vec![PieceSeed::from_u64(1), PieceSeed::from_u64(2)],
    /// );
    /// let weights = [-0.51, 0.76, -0.36, -0.18];
    /// assert_eq!(evaluator.evaluate(&weights)?, evaluator.evaluate(&weights)?);
    /// assert!(evaluator.evaluate(&weights[..3]).is_err());
    /// # Ok::<(), tetro_evaluator::WeightDimensionMismatch>(())
    /// ```
    pub fn evaluate(&self, weights: &[f32]) -> Result<u64, WeightDimensionMismatch> {
        let evaluator = FeatureEvaluator::new(self.features.clone(), weights.to_vec())?;
        let mut agent = HeuristicAgent::new(evaluator);
        Ok(self
            .seeds
            .iter()
            .map(|&seed| {
                self.simulator
                    .run(&mut agent, PieceBag::with_seed(seed))
                    .total_score()
            })
            .sum())
    }
}

/// Runs `fitness`, turning an error or a panic into the worst fitness.
fn evaluate_isolated<F, E>(fitness: &F, weights: &[f32]) -> u64
where
    F: Fn(&[f32]) -> Result<u64, E>,
    E: fmt::Display,
{
    match panic::catch_unwind(AssertUnwindSafe(|| fitness(weights))) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            tracing::warn!(%e, ?weights, "evaluation failed, assigning fitness 0");
            0
        }
        Err(_) => {
            tracing::warn!(?weights, "evaluation panicked, assigning fitness 0");
            0
        }
    }
}

/// Why training stopped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant,
)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationReason {
    #[display("generation limit reached")]
    MaxGenerations,
    #[display("target fitness reached")]
    TargetReached,
}

/// Where the optimizer is in its generation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum OptimizerState {
    /// The current population has individuals without fitness.
    Evaluate,
    /// The current population is evaluated and the next one has to be bred.
    Reproduce,
    Terminated(TerminationReason),
}

/// Result of evaluating one generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Zero-based generation index.
    pub generation: usize,
    pub best: Individual,
    pub summary: FitnessSummary,
    /// Piece seeds behind every fitness in the population, fixed for the whole run.
    pub seeds: Vec<PieceSeed>,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Best individual of the last generation.
    pub best: Individual,
    /// Number of evaluated generations.
    pub generations: usize,
    pub reason: TerminationReason,
}

/// Generation loop of the genetic algorithm.
///
/// The whole run is a deterministic function of the configuration: the only randomness is a
/// [`Pcg64Mcg`] seeded with `seed`, drawn from in a fixed order (initial population, piece
/// seeds, then the reproduction of each generation).
#[derive(Debug, Clone)]
pub struct GeneticOptimizer {
    config: TrainingConfig,
    evaluator: FitnessEvaluator,
    mutation: Mutation,
    rng: Pcg64Mcg,
    population: Population,
    generation: usize,
    state: OptimizerState,
}

impl GeneticOptimizer {
    const MAX_BREED_ATTEMPTS: usize = 4;

    /// Validates `config` and creates the random initial population.
    pub fn new(config: TrainingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = Pcg64Mcg::seed_from_u64(config.seed);
        let population = Population::random(
            config.population_size,
            config.features.len(),
            config.weight_range,
            &mut rng,
        );
        Self::with_rng(config, population, rng)
    }

    /// Like [`Self::new`], but starts from the given weight vectors, e.g. a saved model.
    ///
    /// The vectors take the first slots of the initial population and the rest is random.
    /// Out-of-range coefficients are clamped.
    pub fn with_initial_weights<I>(config: TrainingConfig, initial: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Vec<f32>>,
    {
        config.validate()?;
        let mut rng = Pcg64Mcg::seed_from_u64(config.seed);
        let mut individuals = Vec::with_capacity(config.population_size);
        for mut weights in initial.into_iter().take(config.population_size) {
            if weights.len() != config.features.len() {
                return Err(ConfigError::invalid(
                    "features",
                    format!(
                        "initial weight vector has {} coefficients for {} features",
                        weights.len(),
                        config.features.len()
                    ),
                ));
            }
            weights::repair(&mut weights, config.weight_range);
            individuals.push(Individual::new(weights));
        }
        while individuals.len() < config.population_size {
            individuals.push(Individual::random(
                &mut rng,
                config.weight_range,
                config.features.len(),
            ));
        }
        Self::with_rng(config, Population::new(individuals), rng)
    }

    fn with_rng(
        config: TrainingConfig,
        population: Population,
        mut rng: Pcg64Mcg,
    ) -> Result<Self, ConfigError> {
        let simulator = GameSimulator::new(config.board_size()?, config.move_cap);
        let mutation = config.mutation()?;
        let seeds = (0..config.games_per_individual)
            .map(|_| rng.random())
            .collect();
        let evaluator = FitnessEvaluator::new(simulator, config.features.clone(), seeds);
        Ok(Self {
            config,
            evaluator,
            mutation,
            rng,
            population,
            generation: 0,
            state: OptimizerState::Evaluate,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Piece seeds every individual is evaluated on.
    #[must_use]
    pub fn seeds(&self) -> &[PieceSeed] {
        self.evaluator.seeds()
    }

    /// Index of the current population's generation.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn state(&self) -> OptimizerState {
        self.state
    }

    #[must_use]
    pub fn termination_reason(&self) -> Option<TerminationReason> {
        match self.state {
            OptimizerState::Terminated(reason) => Some(reason),
            OptimizerState::Evaluate | OptimizerState::Reproduce => None,
        }
    }

    /// Advances to the next evaluated generation and reports it.
    ///
    /// Returns `None` once training has terminated.
    pub fn step(&mut self) -> Option<GenerationReport> {
        loop {
            match self.state {
                OptimizerState::Evaluate => {
                    let report = self.evaluate_generation()?;
                    self.state = match self.termination(&report) {
                        Some(reason) => OptimizerState::Terminated(reason),
                        None => OptimizerState::Reproduce,
                    };
                    return Some(report);
                }
                OptimizerState::Reproduce => {
                    self.reproduce();
                    self.generation += 1;
                    self.state = OptimizerState::Evaluate;
                }
                OptimizerState::Terminated(_) => return None,
            }
        }
    }

    /// Runs until termination, calling `on_generation` with every report.
    pub fn run<F>(&mut self, mut on_generation: F) -> TrainingOutcome
    where
        F: FnMut(&GenerationReport),
    {
        let mut last = None;
        while let Some(report) = self.step() {
            on_generation(&report);
            last = Some(report);
        }
        let reason = self
            .termination_reason()
            .unwrap_or(TerminationReason::MaxGenerations);
        TrainingOutcome {
            best: last.map_or_else(
                || Individual::new(vec![0.0; self.config.features.len()]),
                |report| report.best,
            ),
            generations: self.generation + 1,
            reason,
        }
    }

    fn evaluate_generation(&mut self) -> Option<GenerationReport> {
        self.population
            .evaluate(&self.evaluator, self.config.parallel_evaluation);

        let best = self.population.best()?.clone();
        let summary = self.population.fitness_summary()?;
        tracing::debug!(
            generation = self.generation,
            best = summary.max,
            mean = summary.mean,
            "generation evaluated"
        );
        Some(GenerationReport {
            generation: self.generation,
            best,
            summary,
            seeds: self.evaluator.seeds.clone(),
        })
    }

    fn termination(&self, report: &GenerationReport) -> Option<TerminationReason> {
        let best = report.best.fitness.unwrap_or(0);
        if self.config.target_fitness.is_some_and(|target| best >= target) {
            return Some(TerminationReason::TargetReached);
        }
        (self.generation + 1 >= self.config.max_generations)
            .then_some(TerminationReason::MaxGenerations)
    }

    fn reproduce(&mut self) {
        let current = &self.population.individuals;
        let size = current.len();
        let feature_count = self.config.features.len();
        let range = self.config.weight_range;

        let mut next = current[..self.config.elite_count].to_vec();

        let best_fitness = current.first().and_then(Individual::fitness).unwrap_or(0);
        if best_fitness <= self.config.restart_fitness {
            tracing::info!(
                generation = self.generation,
                best_fitness,
                "best fitness at or below restart threshold, reinitializing population"
            );
            while next.len() < size {
                next.push(Individual::random(&mut self.rng, range, feature_count));
            }
        } else {
            while next.len() < size {
                let p1 = tournament_select(current, self.config.tournament_size, &mut self.rng);
                let p2 = tournament_select(current, self.config.tournament_size, &mut self.rng);
                let child = breed(
                    &self.config,
                    &self.mutation,
                    &p1.weights,
                    &p2.weights,
                    &mut self.rng,
                );
                next.push(Individual::new(child));
            }
        }

        self.population = Population::new(next);
    }
}

/// Crossover then mutation, re-breeding corrupt children before repairing the last one.
fn breed<R>(
    config: &TrainingConfig,
    mutation: &Mutation,
    p1: &[f32],
    p2: &[f32],
    rng: &mut R,
) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    let range = config.weight_range;
    let mut child = Vec::new();
    for attempt in 1..=GeneticOptimizer::MAX_BREED_ATTEMPTS {
        child = config
            .crossover
            .combine(p1, p2, config.blend_alpha, range, rng);
        mutation.apply(&mut child, rng);
        match weights::validate(&child, range) {
            Ok(()) => return child,
            Err(e) => tracing::warn!(attempt, %e, "discarding corrupt child"),
        }
    }
    weights::repair(&mut child, range);
    child
}

/// Selects an individual using tournament selection.
///
/// Draws `tournament_size` distinct individuals and returns the fittest; ties go to the
/// lower population index.
fn tournament_select<'a, R>(
    population: &'a [Individual],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Individual
where
    R: Rng + ?Sized,
{
    assert!(tournament_size > 0 && tournament_size <= population.len());
    let winner = index::sample(rng, population.len(), tournament_size)
        .into_iter()
        .min_by_key(|&i| (Reverse(population[i].fitness), i))
        .unwrap_or(0);
    &population[winner]
}
