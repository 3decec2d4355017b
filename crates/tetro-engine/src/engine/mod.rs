//! Piece supply and per-game bookkeeping.
//!
//! - [`PieceSource`] - Anything that hands out the next piece of a game
//! - [`PieceBag`] - 7-bag randomizer driven by a [`PieceSeed`]
//! - [`PieceSequence`] - Fixed, literal piece order (replays and tests)
//! - [`GameStats`] - Lines cleared, line-clear histogram and classic score
//!
//! # Example
//!
//! ```
//! use tetro_engine::{PieceBag, PieceSeed, PieceSource as _};
//!
//! let seed = PieceSeed::from_u64(42);
//! let mut a = PieceBag::with_seed(seed);
//! let mut b = PieceBag::with_seed(seed);
//!
//! for _ in 0..14 {
//!     assert_eq!(a.next_piece(), b.next_piece());
//! }
//! ```

pub use self::{game_stats::*, piece_source::*};

mod game_stats;
mod piece_source;
