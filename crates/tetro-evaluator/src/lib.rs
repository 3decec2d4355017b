//! Heuristic play for the Tetro agent.
//!
//! This crate turns a weight vector into a playing agent, in three levels:
//!
//! 1. **Placement Evaluation** ([`placement_evaluator`]) - Scores the board a placement
//!    leaves behind as a weighted sum of [`board_feature`]s.
//! 2. **Move Search** ([`move_search`]) - Tries every rotation and column of the current
//!    piece and keeps the highest-scoring placement.
//! 3. **Game Simulation** ([`simulator`]) - Plays whole games with an [`simulator::Agent`]
//!    and reports the lines cleared.
//!
//! ```text
//! Game Simulation (lines cleared = fitness)
//!     ↓ uses
//! Move Search (select best placement)
//!     ↓ uses
//! Placement Evaluation (score single placement)
//! ```
//!
//! # Supporting Modules
//!
//! - [`board_analysis`] - Lazily computed board metrics (heights, holes, wells, histograms)
//! - [`placement_analysis`] - Lines cleared by a placement plus the analysis of its board

pub mod board_analysis;
pub mod board_feature;
pub mod move_search;
pub mod placement_analysis;
pub mod placement_evaluator;
pub mod simulator;

/// A weight vector whose length does not match the number of features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("expected {expected} weights, one per feature, got {actual}")]
pub struct WeightDimensionMismatch {
    pub expected: usize,
    pub actual: usize,
}
