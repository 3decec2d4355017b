//! Placement evaluation: scoring the board a placement leaves behind.
//!
//! The [`FeatureEvaluator`] computes a linear combination of board features:
//!
//! ```text
//! score = w₁·f₁ + w₂·f₂ + ... + wₙ·fₙ
//! ```
//!
//! where `fᵢ` is the raw feature value (see [`BoardFeature`]) and `wᵢ` is the weight tuned
//! by the genetic optimizer. The sum is accumulated in feature order, so identical inputs
//! always produce bit-identical scores.
//!
//! # Usage
//!
//! ```
//! use tetro_engine::{Board, PieceKind, PieceRotation};
//! use tetro_evaluator::{
//!     placement_analysis::PlacementAnalysis,
//!     placement_evaluator::{FeatureEvaluator, PlacementEvaluator as _},
//! };
//!
//! let evaluator = FeatureEvaluator::with_default_features(vec![-0.51, 0.76, -0.36, -0.18])?;
//! let analysis =
//!     PlacementAnalysis::from_placement(&Board::default(), PieceKind::O, PieceRotation::SPAWN, 0)
//!         .unwrap();
//! // Aggregate height 4, bumpiness 2.
//! assert_eq!(evaluator.evaluate_placement(&analysis), -0.51 * 4.0 - 0.18 * 2.0);
//! # Ok::<(), tetro_evaluator::WeightDimensionMismatch>(())
//! ```

use std::{fmt, iter};

use tetro_engine::Board;

use crate::{
    WeightDimensionMismatch, board_feature::BoardFeature, placement_analysis::PlacementAnalysis,
};

/// Evaluates piece placements by assigning scores (higher is better).
///
/// Implementations must be pure: the same analysis always yields the same score.
pub trait PlacementEvaluator: fmt::Debug + Send + Sync {
    fn evaluate_placement(&self, analysis: &PlacementAnalysis) -> f32;
}

/// Weighted sum of board features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEvaluator {
    features: Vec<BoardFeature>,
    weights: Vec<f32>,
}

impl FeatureEvaluator {
    /// Creates an evaluator, requiring one weight per feature.
    pub fn new(
        features: Vec<BoardFeature>,
        weights: Vec<f32>,
    ) -> Result<Self, WeightDimensionMismatch> {
        if features.len() != weights.len() {
            return Err(WeightDimensionMismatch {
                expected: features.len(),
                actual: weights.len(),
            });
        }
        Ok(Self { features, weights })
    }

    /// Creates an evaluator over [`BoardFeature::DEFAULT`].
    pub fn with_default_features(weights: Vec<f32>) -> Result<Self, WeightDimensionMismatch> {
        Self::new(BoardFeature::DEFAULT.to_vec(), weights)
    }

    #[must_use]
    pub fn features(&self) -> &[BoardFeature] {
        &self.features
    }

    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

impl PlacementEvaluator for FeatureEvaluator {
    #[inline]
    fn evaluate_placement(&self, analysis: &PlacementAnalysis) -> f32 {
        iter::zip(&self.features, &self.weights)
            .map(|(f, w)| f.value(analysis) * w)
            .sum()
    }
}

/// Scores a board produced by a placement that cleared `cleared_lines` lines, using the
/// default feature set.
pub fn score(
    board: &Board,
    cleared_lines: usize,
    weights: &[f32],
) -> Result<f32, WeightDimensionMismatch> {
    let evaluator = FeatureEvaluator::with_default_features(weights.to_vec())?;
    let analysis = PlacementAnalysis::new(board.clone(), cleared_lines);
    Ok(evaluator.evaluate_placement(&analysis))
}
