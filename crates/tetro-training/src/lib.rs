//! Training system for evolving heuristic weights with a genetic algorithm.
//!
//! Each individual of the population is a weight vector for the placement evaluator of
//! `tetro-evaluator`. Its fitness is the number of lines the resulting agent clears in
//! simulated games, and the population is evolved generation by generation until a
//! generation limit or a target fitness is reached.
//!
//! # How Training Works
//!
//! 1. **Initialize** - Create a population of random weight vectors
//! 2. **Evaluate** - Every unevaluated individual plays the generation's games
//! 3. **Select** - Tournament selection picks parents
//! 4. **Reproduce** - Crossover and mutation produce the next generation; elites survive
//! 5. **Repeat** - Until the generation limit or the target fitness
//!
//! # Architecture
//!
//! ```text
//! Genetic Optimizer (genetic)
//!     ↓ evolves
//! Weight Vectors (weights)
//!     ↓ used by
//! Heuristic Agent (tetro-evaluator)
//!     ↓ plays
//! Game Simulator (tetro-evaluator)
//!     ↓ produces
//! Fitness (lines cleared)
//! ```
//!
//! # Modules
//!
//! - [`config`] - Run configuration loaded from a TOML properties file
//! - [`weights`] - Weight vector initialization, crossover, mutation and validation
//! - [`genetic`] - Population, individuals and the generation loop
//! - [`summary`] - Fitness statistics of a generation
//! - [`record`] - Score log entries, one per generation
//!
//! # Example
//!
//! ```
//! use tetro_training::{config::TrainingConfig, genetic::GeneticOptimizer};
//!
//! let config = TrainingConfig {
//!     population_size: 6,
//!     max_generations: 2,
//!     move_cap: 20,
//!     ..TrainingConfig::default()
//! };
//! let mut optimizer = GeneticOptimizer::new(config)?;
//! let outcome = optimizer.run(|report| {
//!     assert!(report.summary.max >= report.summary.min);
//! });
//!
//! assert_eq!(outcome.generations, 2);
//! assert_eq!(outcome.best.weights().len(), 4);
//! # Ok::<(), tetro_training::config::ConfigError>(())
//! ```

pub mod config;
pub mod genetic;
pub mod record;
pub mod summary;
pub mod weights;
