use serde::{Deserialize, Serialize};

use super::{SENTINEL_MARGIN_LEFT, SENTINEL_MARGIN_TOP};
use crate::InvalidPieceChar;

/// A tetromino resting (or falling) at a position on the board.
///
/// The position is the top-left corner of the piece's 4×4 bounding box, expressed in
/// board coordinates that include the sentinel walls. Use [`Piece::cells`] to get the
/// occupied cells in playable `(row, column)` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    position: PiecePosition,
    rotation: PieceRotation,
    kind: PieceKind,
}

impl Piece {
    #[must_use]
    pub(crate) const fn new(
        kind: PieceKind,
        rotation: PieceRotation,
        position: PiecePosition,
    ) -> Self {
        Self {
            position,
            rotation,
            kind,
        }
    }

    #[must_use]
    pub fn position(&self) -> PiecePosition {
        self.position
    }

    #[must_use]
    pub fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub(crate) fn mask(&self) -> PieceMask {
        self.kind.mask(self.rotation)
    }

    /// Returns the piece moved one row down, or `None` at the bottom of the coordinate space.
    #[must_use]
    pub fn down(&self) -> Option<Self> {
        Some(Self {
            position: self.position.down()?,
            ..*self
        })
    }

    /// Returns the occupied cells as playable `(row, column)` pairs.
    ///
    /// Cells inside the top margin (above row 0) are skipped.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.kind
            .occupied_positions(self.rotation)
            .filter_map(move |(dx, dy)| {
                let y = (self.position.y() + dy).checked_sub(SENTINEL_MARGIN_TOP)?;
                let x = (self.position.x() + dx).checked_sub(SENTINEL_MARGIN_LEFT)?;
                Some((y, x))
            })
    }
}

/// Top-left corner of a piece's bounding box in board coordinates (walls included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiecePosition {
    x: u8,
    y: u8,
}

impl PiecePosition {
    #[must_use]
    pub(crate) const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn x(self) -> usize {
        usize::from(self.x)
    }

    #[must_use]
    pub fn y(self) -> usize {
        usize::from(self.y)
    }

    #[must_use]
    pub const fn down(self) -> Option<Self> {
        match self.y.checked_add(1) {
            Some(y) => Some(Self::new(self.x, y)),
            None => None,
        }
    }
}

/// Rotation state of a piece.
///
/// - `0`: spawn orientation
/// - `1`: 90° clockwise
/// - `2`: 180°
/// - `3`: 270° clockwise
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PieceRotation(u8);

impl PieceRotation {
    pub const SPAWN: Self = Self(0);
    pub const ALL: [Self; 4] = [Self(0), Self(1), Self(2), Self(3)];

    /// Returns the rotation `index` quarter turns clockwise from spawn, if `index < 4`.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index < 4 { Some(Self(index)) } else { None }
    }

    #[must_use]
    pub fn rotated_right(self) -> Self {
        PieceRotation((self.0 + 1) % 4)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// S-piece.
    S = 2,
    /// Z-piece.
    Z = 3,
    /// J-piece.
    J = 4,
    /// L-piece.
    L = 5,
    /// T-piece.
    T = 6,
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// All piece kinds in bag order.
    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
        PieceKind::T,
    ];

    pub(crate) fn mask(self, rotation: PieceRotation) -> PieceMask {
        PIECE_MASKS[self as usize][rotation.index()]
    }

    /// Returns the occupied bounds of the piece inside its bounding box.
    #[must_use]
    pub fn extent(self, rotation: PieceRotation) -> PieceExtent {
        PIECE_EXTENTS[self as usize][rotation.index()]
    }

    /// Number of rotation states that produce distinct shapes.
    ///
    /// Rotations `0..distinct_rotations()` cover every shape exactly once: the O-piece has
    /// one, the I, S and Z pieces have two, the others four.
    ///
    /// ```
    /// use tetro_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::O.distinct_rotations(), 1);
    /// assert_eq!(PieceKind::S.distinct_rotations(), 2);
    /// assert_eq!(PieceKind::T.distinct_rotations(), 4);
    /// ```
    #[must_use]
    pub const fn distinct_rotations(self) -> usize {
        match self {
            PieceKind::O => 1,
            PieceKind::I | PieceKind::S | PieceKind::Z => 2,
            PieceKind::J | PieceKind::L | PieceKind::T => 4,
        }
    }

    /// Iterates over the rotations returned by [`Self::distinct_rotations`], in order.
    pub fn rotations(self) -> impl Iterator<Item = PieceRotation> {
        PieceRotation::ALL
            .into_iter()
            .take(self.distinct_rotations())
    }

    /// Returns the occupied `(dx, dy)` offsets inside the bounding box.
    pub fn occupied_positions(
        self,
        rotation: PieceRotation,
    ) -> impl Iterator<Item = (usize, usize)> {
        let mask = self.mask(rotation);
        (0..4).flat_map(move |dy| {
            (0..4).filter_map(move |dx| ((mask[dy] & (1 << dx)) != 0).then_some((dx, dy)))
        })
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// ```
    /// use tetro_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    /// Parses a piece kind from a single (case-insensitive) character.
    ///
    /// ```
    /// use tetro_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('I'), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_char('t'), Some(PieceKind::T));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }
}

impl TryFrom<char> for PieceKind {
    type Error = InvalidPieceChar;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Self::from_char(c).ok_or(InvalidPieceChar {
            found: c,
            position: 0,
        })
    }
}

/// Occupied bounds of a rotated piece inside its 4×4 bounding box (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceExtent {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
}

impl PieceExtent {
    /// Number of columns the piece spans.
    #[must_use]
    pub const fn width(self) -> usize {
        self.right - self.left + 1
    }

    /// Number of rows the piece spans.
    #[must_use]
    pub const fn height(self) -> usize {
        self.bottom - self.top + 1
    }
}

/// Bitmask of a piece within its 4×4 bounding box, one `u16` per row (bit `x` = column `x`).
pub(crate) type PieceMask = [u16; 4];

/// Generates all 4 rotation states of a piece mask by rotating 90° clockwise.
///
/// `size` is the effective size of the piece (3 for most pieces, 4 for I, 2 for O).
const fn mask_rotations(size: usize, mask: PieceMask) -> [PieceMask; 4] {
    let mut rotates = [mask; 4];
    let mut i = 1;
    while i < 4 {
        let mut new_mask = [0; 4];
        let mut y = 0;
        while y < size {
            let mut x = 0;
            while x < size {
                if (rotates[i - 1][size - 1 - x] & (1 << y)) != 0 {
                    new_mask[y] |= 1 << x;
                }
                x += 1;
            }
            y += 1;
        }
        rotates[i] = new_mask;
        i += 1;
    }
    rotates
}

const PIECE_MASKS: [[PieceMask; 4]; PieceKind::LEN] = {
    const fn m(bits: [bool; 4]) -> u16 {
        let mut mask = 0;
        let mut i = 0;
        while i < 4 {
            if bits[i] {
                mask |= 1 << i;
            }
            i += 1;
        }
        mask
    }

    const C: bool = true;
    const E: bool = false;
    const EEEE: u16 = m([E; 4]);

    [
        mask_rotations(4, [EEEE, m([C, C, C, C]), EEEE, EEEE]),
        mask_rotations(2, [m([C, C, E, E]), m([C, C, E, E]), EEEE, EEEE]),
        mask_rotations(3, [m([E, C, C, E]), m([C, C, E, E]), EEEE, EEEE]),
        mask_rotations(3, [m([C, C, E, E]), m([E, C, C, E]), EEEE, EEEE]),
        mask_rotations(3, [m([C, E, E, E]), m([C, C, C, E]), EEEE, EEEE]),
        mask_rotations(3, [m([E, E, C, E]), m([C, C, C, E]), EEEE, EEEE]),
        mask_rotations(3, [m([E, C, E, E]), m([C, C, C, E]), EEEE, EEEE]),
    ]
};

const fn mask_extent(mask: PieceMask) -> PieceExtent {
    let mut extent = PieceExtent {
        left: 3,
        right: 0,
        top: 3,
        bottom: 0,
    };
    let mut y = 0;
    while y < 4 {
        if mask[y] != 0 {
            if y < extent.top {
                extent.top = y;
            }
            extent.bottom = y;
            let mut x = 0;
            while x < 4 {
                if mask[y] & (1 << x) != 0 {
                    if x < extent.left {
                        extent.left = x;
                    }
                    if x > extent.right {
                        extent.right = x;
                    }
                }
                x += 1;
            }
        }
        y += 1;
    }
    extent
}

const PIECE_EXTENTS: [[PieceExtent; 4]; PieceKind::LEN] = {
    let mut extents = [[mask_extent([0b1; 4]); 4]; PieceKind::LEN];
    let mut kind = 0;
    while kind < PieceKind::LEN {
        let mut rotation = 0;
        while rotation < 4 {
            extents[kind][rotation] = mask_extent(PIECE_MASKS[kind][rotation]);
            rotation += 1;
        }
        kind += 1;
    }
    extents
};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn normalized_cells(kind: PieceKind, rotation: PieceRotation) -> Vec<(usize, usize)> {
        let extent = kind.extent(rotation);
        let mut cells: Vec<_> = kind
            .occupied_positions(rotation)
            .map(|(dx, dy)| (dx - extent.left, dy - extent.top))
            .collect();
        cells.sort_unstable();
        cells
    }

    #[test]
    fn test_every_rotation_has_four_cells() {
        for kind in PieceKind::ALL {
            for rotation in PieceRotation::ALL {
                assert_eq!(kind.occupied_positions(rotation).count(), 4, "{kind:?}");
            }
        }
    }

    #[test]
    fn test_distinct_rotations_cover_all_shapes() {
        for kind in PieceKind::ALL {
            let distinct: HashSet<_> = kind
                .rotations()
                .map(|rotation| normalized_cells(kind, rotation))
                .collect();
            assert_eq!(distinct.len(), kind.distinct_rotations(), "{kind:?}");

            let all: HashSet<_> = PieceRotation::ALL
                .into_iter()
                .map(|rotation| normalized_cells(kind, rotation))
                .collect();
            assert_eq!(all, distinct, "{kind:?}");
        }
    }

    #[test]
    fn test_extents() {
        let i_flat = PieceKind::I.extent(PieceRotation::SPAWN);
        assert_eq!((i_flat.width(), i_flat.height()), (4, 1));
        assert_eq!((i_flat.left, i_flat.top), (0, 1));

        let i_upright = PieceKind::I.extent(PieceRotation::ALL[1]);
        assert_eq!((i_upright.width(), i_upright.height()), (1, 4));
        assert_eq!(i_upright.left, 2);

        for rotation in PieceRotation::ALL {
            let o = PieceKind::O.extent(rotation);
            assert_eq!((o.left, o.right, o.top, o.bottom), (0, 1, 0, 1));
        }

        let t = PieceKind::T.extent(PieceRotation::ALL[3]);
        assert_eq!((t.left, t.right, t.top, t.bottom), (0, 1, 0, 2));
    }

    #[test]
    fn test_char_round_trip() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(
            PieceKind::try_from('x'),
            Err(InvalidPieceChar {
                found: 'x',
                position: 0
            })
        );
    }

    #[test]
    fn test_rotation_bounds() {
        assert_eq!(PieceRotation::new(3), Some(PieceRotation::ALL[3]));
        assert_eq!(PieceRotation::new(4), None);
        assert_eq!(PieceRotation::ALL[3].rotated_right(), PieceRotation::SPAWN);
    }
}
