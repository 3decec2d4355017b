//! Board model and piece supply for the Tetro agent.
//!
//! - [`core`] holds the playfield ([`Board`]) and the tetromino tables ([`PieceKind`]).
//! - [`engine`] holds the piece sources used to drive a game and the [`GameStats`]
//!   accumulated while playing.
//!
//! # Example
//!
//! ```
//! use tetro_engine::{Board, PieceKind, PieceRotation};
//!
//! let board = Board::default();
//! let (board, cleared) = board
//!     .place(PieceKind::I, PieceRotation::SPAWN, 0)
//!     .unwrap();
//! assert_eq!(cleared, 0);
//! assert_eq!(board.occupied_cells(), 4);
//! assert!(!board.is_game_over());
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Reason a piece cannot be placed at the requested rotation and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum InvalidPlacement {
    #[display("column {column} leaves the piece outside the {width}-wide board")]
    OutOfBounds { column: usize, width: usize },
    #[display("piece is obstructed before it enters the board")]
    Obstructed,
}

/// Board dimensions outside what the bit-row layout can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unsupported board size {width}x{height} (width must be 4..=12, height 4..=40)")]
pub struct InvalidBoardSize {
    pub width: usize,
    pub height: usize,
}

/// A character that does not name a tetromino.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid piece character {found:?} at position {position}")]
pub struct InvalidPieceChar {
    pub found: char,
    pub position: usize,
}
