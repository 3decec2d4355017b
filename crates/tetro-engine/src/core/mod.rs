pub use self::{bit_board::*, piece::*};

pub(crate) mod bit_board;
pub(crate) mod piece;

/// Width of the wall kept on each side of the playable columns.
pub(crate) const SENTINEL_MARGIN_LEFT: usize = 2;
pub(crate) const SENTINEL_MARGIN_RIGHT: usize = 2;
/// Rows above the playable area that a piece's bounding box may reach into.
pub(crate) const SENTINEL_MARGIN_TOP: usize = 2;
/// Fully occupied rows below the playable area that stop a falling piece.
pub(crate) const SENTINEL_MARGIN_BOTTOM: usize = 2;
