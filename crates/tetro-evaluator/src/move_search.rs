//! Move search: choosing where the current piece goes.
//!
//! The search is greedy and exhaustive over one piece: every distinct rotation is dropped
//! in every column, each resulting board is scored by a [`PlacementEvaluator`], and the
//! highest score wins.
//!
//! # Enumeration Order
//!
//! Candidates are visited rotation first, then column:
//!
//! ```text
//! (rotation 0, column 0), (rotation 0, column 1), ..., (rotation 1, column 0), ...
//! ```
//!
//! Only the rotations in [`PieceKind::rotations`] are visited, so rotationally identical
//! shapes are not scored twice. Ties keep the first candidate in this order, making the
//! choice a deterministic function of board, piece and weights.
//!
//! Placements that fail ([`InvalidPlacement`](tetro_engine::InvalidPlacement)) or whose
//! resulting board is already game over are not candidates.

use serde::Serialize;
use tetro_engine::{Board, PieceKind, PieceRotation};

use crate::{placement_analysis::PlacementAnalysis, placement_evaluator::PlacementEvaluator};

/// Final rotation and column of a piece; `column` is the leftmost occupied column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Placement {
    pub rotation: PieceRotation,
    pub column: usize,
}

/// Placement selected by move search, with the board it produces.
#[derive(Debug, Clone)]
pub struct MoveChoice {
    pub placement: Placement,
    pub board: Board,
    pub cleared_lines: usize,
    pub score: f32,
}

/// No placement of the piece avoids an immediate game over.
///
/// This is how a game normally ends, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("no placement of {} avoids game over", piece.as_char())]
pub struct NoLegalMove {
    pub piece: PieceKind,
}

/// Enumerates the placements that succeed and do not end the game, in search order.
pub fn legal_placements(
    board: &Board,
    piece: PieceKind,
) -> impl Iterator<Item = (Placement, PlacementAnalysis)> + '_ {
    piece
        .rotations()
        .flat_map(move |rotation| {
            let columns = board.width() - piece.extent(rotation).width();
            (0..=columns).map(move |column| Placement { rotation, column })
        })
        .filter_map(move |placement| {
            let analysis = PlacementAnalysis::from_placement(
                board,
                piece,
                placement.rotation,
                placement.column,
            )
            .ok()?;
            (!analysis.board().is_game_over()).then_some((placement, analysis))
        })
}

/// Returns the highest-scoring legal placement of `piece`.
///
/// ```
/// use tetro_engine::{Board, PieceKind};
/// use tetro_evaluator::{move_search, placement_evaluator::FeatureEvaluator};
///
/// let evaluator = FeatureEvaluator::with_default_features(vec![-0.51, 0.76, -0.36, -0.18])?;
/// let board = Board::from_ascii(
///     "
///     #####.#####
///     #####.#####
///     ",
/// );
/// let choice = move_search::best_move(&board, PieceKind::I, &evaluator)?;
/// assert_eq!(choice.placement.column, 4);
/// assert_eq!(choice.cleared_lines, 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn best_move<E>(
    board: &Board,
    piece: PieceKind,
    evaluator: &E,
) -> Result<MoveChoice, NoLegalMove>
where
    E: PlacementEvaluator + ?Sized,
{
    let mut best: Option<(Placement, PlacementAnalysis, f32)> = None;

    for (placement, analysis) in legal_placements(board, piece) {
        let score = evaluator.evaluate_placement(&analysis);
        if best.as_ref().is_none_or(|(_, _, best_score)| score > *best_score) {
            best = Some((placement, analysis, score));
        }
    }

    let (placement, analysis, score) = best.ok_or(NoLegalMove { piece })?;
    Ok(MoveChoice {
        placement,
        cleared_lines: analysis.cleared_lines(),
        board: analysis.into_board(),
        score,
    })
}

#[cfg(test)]
mod tests {
    use tetro_engine::BoardSize;

    use super::*;
    use crate::{board_feature::BoardFeature, placement_evaluator::FeatureEvaluator};

    fn default_evaluator() -> FeatureEvaluator {
        FeatureEvaluator::with_default_features(vec![-0.51, 0.76, -0.36, -0.18]).unwrap()
    }

    #[test]
    fn test_candidate_counts_on_empty_board() {
        let board = Board::default();
        let count = |piece| legal_placements(&board, piece).count();
        assert_eq!(count(PieceKind::I), 7 + 10);
        assert_eq!(count(PieceKind::O), 9);
        assert_eq!(count(PieceKind::S), 8 + 9);
        assert_eq!(count(PieceKind::T), 8 + 9 + 8 + 9);
    }

    #[test]
    fn test_enumeration_order_is_rotation_then_column() {
        let board = Board::default();
        let order: Vec<_> = legal_placements(&board, PieceKind::Z)
            .map(|(p, _)| (p.rotation.index(), p.column))
            .collect();
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(order, sorted);
        assert_eq!(order[0], (0, 0));
        assert_eq!(order.last(), Some(&(1, 8)));
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let evaluator = FeatureEvaluator::new(vec![BoardFeature::Holes], vec![0.0]).unwrap();
        let choice = best_move(&Board::default(), PieceKind::L, &evaluator).unwrap();
        assert_eq!(choice.placement.rotation, PieceRotation::SPAWN);
        assert_eq!(choice.placement.column, 0);
    }

    #[test]
    fn test_best_move_is_deterministic() {
        let board = Board::from_ascii(
            "
            ..#.......
            .###..#...
            ####.###.#
            ",
        );
        let evaluator = default_evaluator();
        let first = best_move(&board, PieceKind::T, &evaluator).unwrap();
        for _ in 0..5 {
            let again = best_move(&board, PieceKind::T, &evaluator).unwrap();
            assert_eq!(again.placement, first.placement);
            assert_eq!(again.score.to_bits(), first.score.to_bits());
            assert_eq!(again.board, first.board);
        }
    }

    #[test]
    fn test_choice_matches_direct_placement() {
        let board = Board::from_ascii(
            "
            ##.....###
            ###...####
            ",
        );
        let choice = best_move(&board, PieceKind::S, &default_evaluator()).unwrap();
        let (expected, lines) = board
            .place(PieceKind::S, choice.placement.rotation, choice.placement.column)
            .unwrap();
        assert_eq!(choice.board, expected);
        assert_eq!(choice.cleared_lines, lines);
    }

    #[test]
    fn test_no_legal_move_when_every_drop_tops_out() {
        let size = BoardSize::new(4, 4).unwrap();
        let board = Board::from_ascii_with_size(
            size,
            "
            ....
            ....
            ###.
            ###.
            ",
        );
        // Only a vertical I in the last column stays out of the top two rows.
        let err = best_move(&board, PieceKind::O, &default_evaluator()).unwrap_err();
        assert_eq!(err, NoLegalMove { piece: PieceKind::O });
        let choice = best_move(&board, PieceKind::I, &default_evaluator()).unwrap();
        assert_eq!(choice.cleared_lines, 2);
    }
}
