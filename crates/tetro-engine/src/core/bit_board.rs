use std::{
    fmt,
    ops::{Range, RangeInclusive},
};

use arrayvec::ArrayVec;

use super::{
    SENTINEL_MARGIN_BOTTOM, SENTINEL_MARGIN_LEFT, SENTINEL_MARGIN_RIGHT, SENTINEL_MARGIN_TOP,
    piece::{Piece, PieceKind, PiecePosition, PieceRotation},
};
use crate::{InvalidBoardSize, InvalidPlacement};

const MAX_PLAYABLE_HEIGHT: usize = 40;
const MAX_TOTAL_HEIGHT: usize = SENTINEL_MARGIN_TOP + MAX_PLAYABLE_HEIGHT + SENTINEL_MARGIN_BOTTOM;

/// Rows at the top of the board that must stay clear in the spawn columns.
const SPAWN_ROWS: usize = 2;
/// Number of centred columns a new piece spawns in.
const SPAWN_WIDTH: usize = 4;

/// Playable dimensions of a board.
///
/// Every row, walls included, must fit in a `u16`, which bounds the width at 12 columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSize {
    width: usize,
    height: usize,
}

impl Default for BoardSize {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl BoardSize {
    /// The standard 10-column, 20-row playfield.
    pub const STANDARD: Self = Self {
        width: 10,
        height: 20,
    };
    pub const WIDTH_RANGE: RangeInclusive<usize> =
        SPAWN_WIDTH..=(u16::BITS as usize - SENTINEL_MARGIN_LEFT - SENTINEL_MARGIN_RIGHT);
    pub const HEIGHT_RANGE: RangeInclusive<usize> = 4..=MAX_PLAYABLE_HEIGHT;

    /// Creates a board size, rejecting dimensions the bit rows cannot hold.
    ///
    /// ```
    /// use tetro_engine::BoardSize;
    ///
    /// assert!(BoardSize::new(10, 20).is_ok());
    /// assert!(BoardSize::new(13, 20).is_err());
    /// ```
    pub fn new(width: usize, height: usize) -> Result<Self, InvalidBoardSize> {
        if Self::WIDTH_RANGE.contains(&width) && Self::HEIGHT_RANGE.contains(&height) {
            Ok(Self { width, height })
        } else {
            Err(InvalidBoardSize { width, height })
        }
    }

    #[must_use]
    pub const fn width(self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(self) -> usize {
        self.height
    }

    /// Columns in which a new piece appears: the centred four columns.
    #[must_use]
    pub const fn spawn_columns(self) -> Range<usize> {
        let start = (self.width - SPAWN_WIDTH) / 2;
        start..start + SPAWN_WIDTH
    }

    const fn total_width(self) -> usize {
        SENTINEL_MARGIN_LEFT + self.width + SENTINEL_MARGIN_RIGHT
    }

    const fn wall_bits(self) -> u16 {
        let left = (1 << SENTINEL_MARGIN_LEFT) - 1;
        let right = ((1 << SENTINEL_MARGIN_RIGHT) - 1) << (SENTINEL_MARGIN_LEFT + self.width);
        left | right
    }

    const fn full_bits(self) -> u16 {
        u16::MAX >> (u16::BITS as usize - self.total_width())
    }
}

/// Single row of the board as a bitmask, walls included.
///
/// Bit `x` is cell `x` counted from the left wall: bits `0..2` are the left wall, the
/// playable cells follow, then two bits of right wall. Wall bits are always set so that
/// collision detection needs no bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRow {
    bits: u16,
}

impl BitRow {
    /// Checks if the playable cell in column `column` is occupied.
    #[inline]
    #[must_use]
    pub fn is_cell_occupied(self, column: usize) -> bool {
        (self.bits & (1 << (column + SENTINEL_MARGIN_LEFT))) != 0
    }

    #[inline]
    fn is_any_cell_occupied(self, x0: usize, mask: u16) -> bool {
        (self.bits & (mask << x0)) != 0
    }

    #[inline]
    fn occupy_cells(&mut self, x0: usize, mask: u16) {
        self.bits |= mask << x0;
    }
}

/// Tetris playfield backed by one [`BitRow`] per row.
///
/// The playable area is surrounded by 2-cell sentinel walls on the left, right and bottom,
/// and by 2 empty rows on top. All pieces are positioned by a 4×4 bounding box; the margins
/// let that box hang over the edges while the occupied cells stay inside the playfield.
///
/// Rows are numbered from the top (row 0) and columns from the left (column 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: BoardSize,
    rows: ArrayVec<BitRow, MAX_TOTAL_HEIGHT>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BoardSize::STANDARD)
    }
}

impl Board {
    /// Creates an empty board.
    #[must_use]
    pub fn new(size: BoardSize) -> Self {
        let empty = BitRow {
            bits: size.wall_bits(),
        };
        let floor = BitRow {
            bits: size.full_bits(),
        };
        let mut rows = ArrayVec::new();
        rows.extend(std::iter::repeat_n(
            empty,
            SENTINEL_MARGIN_TOP + size.height(),
        ));
        rows.extend(std::iter::repeat_n(floor, SENTINEL_MARGIN_BOTTOM));
        Self { size, rows }
    }

    #[must_use]
    pub fn size(&self) -> BoardSize {
        self.size
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.size.width()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.size.height()
    }

    /// Returns a playable row by index (row 0 is the top).
    #[must_use]
    pub fn playable_row(&self, row: usize) -> BitRow {
        self.rows[row + SENTINEL_MARGIN_TOP]
    }

    /// Returns an iterator over the playable rows, top to bottom.
    pub fn playable_rows(&self) -> impl Iterator<Item = BitRow> + '_ {
        self.rows[SENTINEL_MARGIN_TOP..][..self.height()]
            .iter()
            .copied()
    }

    /// Returns the playable cells of a row as a bitmask (bit `c` set = column `c` occupied).
    #[must_use]
    pub fn row_mask(&self, row: usize) -> u16 {
        let playable = (1 << self.width()) - 1;
        (self.playable_row(row).bits >> SENTINEL_MARGIN_LEFT) & playable
    }

    /// Checks if the cell at `(row, column)` is occupied.
    ///
    /// Columns past the right edge read as occupied walls.
    #[must_use]
    pub fn is_occupied(&self, row: usize, column: usize) -> bool {
        self.playable_row(row).is_cell_occupied(column)
    }

    /// Number of occupied playable cells.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        (0..self.height())
            .map(|row| self.row_mask(row).count_ones() as usize)
            .sum()
    }

    /// Checks if the piece collides with occupied cells or walls.
    #[must_use]
    pub fn is_colliding(&self, piece: Piece) -> bool {
        let x0 = piece.position().x();
        let rows = self.rows.get(piece.position().y()..).unwrap_or_default();
        piece
            .mask()
            .into_iter()
            .zip(rows)
            .any(|(mask, row)| row.is_any_cell_occupied(x0, mask))
    }

    /// Locks a piece onto the board by setting its occupied cells.
    pub fn fill_piece(&mut self, piece: Piece) {
        let x0 = piece.position().x();
        let y0 = piece.position().y();
        for (mask, row) in piece.mask().into_iter().zip(&mut self.rows[y0..]) {
            row.occupy_cells(x0, mask);
        }
    }

    /// Clears filled lines and returns the number of lines cleared.
    ///
    /// Rows above each cleared line shift down; empty rows enter at the top.
    pub fn clear_lines(&mut self) -> usize {
        let full = self.size.full_bits();
        let empty = BitRow {
            bits: self.size.wall_bits(),
        };
        let height = self.height();
        let playable_rows = &mut self.rows[SENTINEL_MARGIN_TOP..][..height];
        let mut count = 0;

        for y in (0..height).rev() {
            if playable_rows[y].bits == full {
                count += 1;
                continue;
            }
            if count > 0 {
                playable_rows[y + count] = playable_rows[y];
            }
        }

        playable_rows[..count].fill(empty);
        count
    }

    /// Finds where a piece comes to rest when dropped straight down in `column`.
    ///
    /// `column` is the leftmost column the piece occupies in the given rotation. The piece
    /// enters with its topmost cell on row 0 and falls until the next row would collide.
    pub fn resting_piece(
        &self,
        kind: PieceKind,
        rotation: PieceRotation,
        column: usize,
    ) -> Result<Piece, InvalidPlacement> {
        let extent = kind.extent(rotation);
        let width = self.width();
        if column > width - extent.width() {
            return Err(InvalidPlacement::OutOfBounds { column, width });
        }

        let x = column + SENTINEL_MARGIN_LEFT - extent.left;
        let y = SENTINEL_MARGIN_TOP - extent.top;
        #[expect(clippy::cast_possible_truncation)]
        let mut piece = Piece::new(kind, rotation, PiecePosition::new(x as u8, y as u8));
        if self.is_colliding(piece) {
            return Err(InvalidPlacement::Obstructed);
        }
        while let Some(next) = piece.down().filter(|next| !self.is_colliding(*next)) {
            piece = next;
        }
        Ok(piece)
    }

    /// Drops a piece and returns the resulting board with the number of lines it cleared.
    ///
    /// The board itself is left untouched.
    ///
    /// ```
    /// use tetro_engine::{Board, PieceKind, PieceRotation};
    ///
    /// let board = Board::from_ascii(
    ///     "
    ///     #######....
    ///     ",
    /// );
    /// let (board, cleared) = board.place(PieceKind::I, PieceRotation::SPAWN, 6)?;
    /// assert_eq!(cleared, 1);
    /// assert_eq!(board.occupied_cells(), 0);
    /// # Ok::<(), tetro_engine::InvalidPlacement>(())
    /// ```
    pub fn place(
        &self,
        kind: PieceKind,
        rotation: PieceRotation,
        column: usize,
    ) -> Result<(Self, usize), InvalidPlacement> {
        let piece = self.resting_piece(kind, rotation, column)?;
        let mut board = self.clone();
        board.fill_piece(piece);
        let cleared = board.clear_lines();
        Ok((board, cleared))
    }

    /// Checks if the spawn region (top 2 rows of the centred 4 columns) is occupied.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        let spawn = self.size.spawn_columns();
        let mask = ((1 << spawn.len()) - 1) << (spawn.start + SENTINEL_MARGIN_LEFT);
        self.rows[SENTINEL_MARGIN_TOP..][..SPAWN_ROWS]
            .iter()
            .any(|row| row.is_any_cell_occupied(0, mask))
    }

    /// Creates a standard-size board from ASCII art.
    ///
    /// See [`Self::from_ascii_with_size`].
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        Self::from_ascii_with_size(BoardSize::STANDARD, art)
    }

    /// Creates a board from ASCII art, `#` for occupied and `.` for empty cells.
    ///
    /// Blank lines and other characters are ignored. The rows given are aligned to the
    /// bottom of the board; rows above them are empty.
    ///
    /// # Panics
    ///
    /// Panics if a row does not have exactly `size.width()` cells or if there are more rows
    /// than `size.height()`.
    #[must_use]
    pub fn from_ascii_with_size(size: BoardSize, art: &str) -> Self {
        let mut board = Self::new(size);
        let lines: Vec<&str> = art.lines().filter(|line| !line.trim().is_empty()).collect();
        assert!(
            lines.len() <= size.height(),
            "At most {} rows allowed, got {}",
            size.height(),
            lines.len()
        );
        let offset = size.height() - lines.len();

        for (y, line) in lines.iter().enumerate() {
            let cells: Vec<char> = line.chars().filter(|c| *c == '#' || *c == '.').collect();
            assert_eq!(
                cells.len(),
                size.width(),
                "Each row must have exactly {} cells, got {} at row {}",
                size.width(),
                cells.len(),
                y
            );
            let row = &mut board.rows[SENTINEL_MARGIN_TOP + offset + y];
            for (x, &ch) in cells.iter().enumerate() {
                if ch == '#' {
                    row.occupy_cells(SENTINEL_MARGIN_LEFT + x, 0b1);
                }
            }
        }
        board
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.playable_rows() {
            for column in 0..self.width() {
                let ch = if row.is_cell_occupied(column) { '#' } else { '.' };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(board: &mut Board, row: usize) {
        for column in 0..board.width() {
            board.rows[SENTINEL_MARGIN_TOP + row].occupy_cells(SENTINEL_MARGIN_LEFT + column, 0b1);
        }
    }

    #[test]
    fn test_initial_board() {
        let board = Board::default();
        let total_width = board.size.total_width();

        for (y, row) in board.rows.iter().enumerate() {
            for x in 0..total_width {
                let cell = row.is_any_cell_occupied(x, 0b1);
                if y >= SENTINEL_MARGIN_TOP + board.height() {
                    assert!(cell, "Bottom sentinels should be occupied at ({x}, {y})");
                } else if !(SENTINEL_MARGIN_LEFT..SENTINEL_MARGIN_LEFT + board.width())
                    .contains(&x)
                {
                    assert!(cell, "Side sentinels should be occupied at ({x}, {y})");
                } else {
                    assert!(!cell, "Playable area should be empty at ({x}, {y})");
                }
            }
        }
        assert_eq!(board.occupied_cells(), 0);
    }

    #[test]
    fn test_board_size_limits() {
        assert_eq!(BoardSize::WIDTH_RANGE, 4..=12);
        assert!(BoardSize::new(4, 4).is_ok());
        assert!(BoardSize::new(12, 40).is_ok());
        assert_eq!(
            BoardSize::new(3, 20),
            Err(InvalidBoardSize {
                width: 3,
                height: 20
            })
        );
        assert!(BoardSize::new(10, 41).is_err());
        assert_eq!(BoardSize::STANDARD.spawn_columns(), 3..7);
        assert_eq!(BoardSize::new(4, 10).unwrap().spawn_columns(), 0..4);
    }

    #[test]
    fn test_wide_board_walls_fit() {
        let size = BoardSize::new(12, 6).unwrap();
        let board = Board::new(size);
        assert_eq!(board.row_mask(0), 0);
        let (board, cleared) = board.place(PieceKind::I, PieceRotation::ALL[1], 11).unwrap();
        assert_eq!(cleared, 0);
        assert!((2..6).all(|row| board.is_occupied(row, 11)));
    }

    #[test]
    fn test_clear_lines_single_line() {
        let mut board = Board::default();
        fill_row(&mut board, 19);
        board.rows[SENTINEL_MARGIN_TOP + 18].occupy_cells(SENTINEL_MARGIN_LEFT, 0b1);

        assert_eq!(board.clear_lines(), 1);
        assert!(board.is_occupied(19, 0));
        assert_eq!(board.occupied_cells(), 1);
    }

    #[test]
    fn test_clear_lines_multiple_non_consecutive() {
        let mut board = Board::from_ascii(
            "
            #.........
            ##########
            .#........
            ##########
            ",
        );
        assert_eq!(board.clear_lines(), 2);
        assert_eq!(
            board.to_string().lines().rev().take(3).collect::<Vec<_>>(),
            [".#........", "#.........", ".........."]
        );
    }

    #[test]
    fn test_clear_lines_with_partial_lines() {
        let mut board = Board::from_ascii(
            "
            #########.
            ",
        );
        assert_eq!(board.clear_lines(), 0);
        assert_eq!(board.occupied_cells(), 9);
    }

    #[test]
    fn test_clear_lines_all_filled() {
        let mut board = Board::default();
        for row in 0..board.height() {
            fill_row(&mut board, row);
        }
        assert_eq!(board.clear_lines(), board.height());
        assert_eq!(board, Board::default());
    }

    #[test]
    fn test_place_drops_to_floor() {
        let board = Board::default();
        let (board, cleared) = board.place(PieceKind::T, PieceRotation::SPAWN, 4).unwrap();
        assert_eq!(cleared, 0);
        assert_eq!(
            board.to_string().lines().rev().take(3).collect::<Vec<_>>(),
            ["....###...", ".....#....", ".........."]
        );
    }

    #[test]
    fn test_place_rests_on_stack() {
        let board = Board::from_ascii(
            "
            ....#.....
            ....#.....
            ",
        );
        let (board, _) = board.place(PieceKind::O, PieceRotation::SPAWN, 3).unwrap();
        assert!(board.is_occupied(16, 3));
        assert!(board.is_occupied(17, 4));
        assert!(!board.is_occupied(18, 3));
    }

    #[test]
    fn test_place_does_not_slide_under_overhang() {
        let board = Board::from_ascii(
            "
            ###.......
            ..........
            ",
        );
        let (board, _) = board.place(PieceKind::I, PieceRotation::ALL[1], 0).unwrap();
        assert!((14..18).all(|row| board.is_occupied(row, 0)));
        assert!(!board.is_occupied(19, 0));
    }

    #[test]
    fn test_place_out_of_bounds() {
        let board = Board::default();
        assert_eq!(
            board.place(PieceKind::I, PieceRotation::SPAWN, 7).unwrap_err(),
            InvalidPlacement::OutOfBounds {
                column: 7,
                width: 10
            }
        );
        assert!(board.place(PieceKind::I, PieceRotation::ALL[1], 9).is_ok());
        assert!(board.place(PieceKind::O, PieceRotation::SPAWN, 9).is_err());
    }

    #[test]
    fn test_place_obstructed() {
        let mut art = String::new();
        for _ in 0..20 {
            art.push_str("#.........\n");
        }
        let board = Board::from_ascii(&art);
        assert_eq!(
            board.place(PieceKind::O, PieceRotation::SPAWN, 0).unwrap_err(),
            InvalidPlacement::Obstructed
        );
        assert!(board.place(PieceKind::I, PieceRotation::ALL[1], 1).is_ok());
    }

    #[test]
    fn test_place_leaves_source_board_untouched() {
        let board = Board::default();
        let (placed, _) = board.place(PieceKind::L, PieceRotation::SPAWN, 0).unwrap();
        assert_eq!(board.occupied_cells(), 0);
        assert_eq!(placed.occupied_cells(), 4);
    }

    #[test]
    fn test_game_over_only_in_spawn_region() {
        let mut art = vec![".........."; 20];
        art[1] = "#.........";
        let board = Board::from_ascii(&art.join("\n"));
        assert!(!board.is_game_over());

        art[1] = "...#......";
        let board = Board::from_ascii(&art.join("\n"));
        assert!(board.is_game_over());

        art[1] = "..........";
        art[2] = "...####...";
        let board = Board::from_ascii(&art.join("\n"));
        assert!(!board.is_game_over());
    }

    #[test]
    fn test_display_round_trip() {
        let art = "\
            ..........\n\
            .##.......\n\
            ###..#...#\n";
        let board = Board::from_ascii(art);
        let rendered = board.to_string();
        assert_eq!(rendered.lines().count(), 20);
        assert_eq!(Board::from_ascii(&rendered), board);
    }

    #[test]
    fn test_piece_cells_after_rest() {
        let board = Board::default();
        let piece = board
            .resting_piece(PieceKind::I, PieceRotation::SPAWN, 2)
            .unwrap();
        let mut cells: Vec<_> = piece.cells().collect();
        cells.sort_unstable();
        assert_eq!(cells, [(19, 2), (19, 3), (19, 4), (19, 5)]);
    }
}
