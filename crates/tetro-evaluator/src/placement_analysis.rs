//! Analysis of the board state after a piece placement.
//!
//! [`PlacementAnalysis`] pairs the number of lines a placement cleared with the
//! [`BoardAnalysis`] of the resulting board, which is everything a board feature reads.

use tetro_engine::{Board, InvalidPlacement, PieceKind, PieceRotation};

use crate::board_analysis::BoardAnalysis;

#[derive(Debug)]
pub struct PlacementAnalysis {
    cleared_lines: usize,
    board_analysis: BoardAnalysis,
}

impl PlacementAnalysis {
    /// Wraps a board that resulted from a placement clearing `cleared_lines` lines.
    #[must_use]
    pub fn new(board: Board, cleared_lines: usize) -> Self {
        Self {
            cleared_lines,
            board_analysis: BoardAnalysis::from_board(board),
        }
    }

    /// Places a piece on a copy of `before_placement` and analyzes the result.
    pub fn from_placement(
        before_placement: &Board,
        kind: PieceKind,
        rotation: PieceRotation,
        column: usize,
    ) -> Result<Self, InvalidPlacement> {
        let (board, cleared_lines) = before_placement.place(kind, rotation, column)?;
        Ok(Self::new(board, cleared_lines))
    }

    #[must_use]
    pub fn cleared_lines(&self) -> usize {
        self.cleared_lines
    }

    #[must_use]
    pub fn board_analysis(&self) -> &BoardAnalysis {
        &self.board_analysis
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        self.board_analysis.board()
    }

    #[must_use]
    pub fn into_board(self) -> Board {
        self.board_analysis.into_board()
    }
}
