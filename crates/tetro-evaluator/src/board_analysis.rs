//! Lazily computed board metrics.
//!
//! A [`BoardAnalysis`] owns a board snapshot and computes each metric the first time it is
//! requested, caching the result. Move search builds one analysis per candidate placement,
//! and a feature set usually touches only a few metrics, so nothing is computed eagerly.

use std::{cell::OnceCell, iter};

use arrayvec::ArrayVec;
use tetro_engine::Board;

/// Widest supported board.
const MAX_WIDTH: usize = 12;

/// Buckets of [`BoardAnalysis::hole_run_counts`]; the last one also takes longer runs.
pub const HOLE_RUN_BUCKETS: usize = 5;
/// Buckets of [`BoardAnalysis::height_diff_counts`]; the last one also takes larger steps.
pub const HEIGHT_DIFF_BUCKETS: usize = 5;

pub type ColumnValues = ArrayVec<u8, MAX_WIDTH>;
pub type RowFillCounts = ArrayVec<u32, { MAX_WIDTH + 1 }>;

#[derive(Debug)]
pub struct BoardAnalysis {
    board: Board,
    column_heights: OnceCell<ColumnValues>,
    column_occupied_cells: OnceCell<ColumnValues>,
    column_well_depths: OnceCell<ColumnValues>,
    max_height: OnceCell<u8>,
    total_height: OnceCell<u32>,
    num_holes: OnceCell<u32>,
    row_transitions: OnceCell<u32>,
    column_transitions: OnceCell<u32>,
    surface_bumpiness: OnceCell<u32>,
    sum_of_well_depth: OnceCell<u32>,
    row_fill_counts: OnceCell<RowFillCounts>,
    hole_run_counts: OnceCell<[u32; HOLE_RUN_BUCKETS]>,
    height_diff_counts: OnceCell<[u32; HEIGHT_DIFF_BUCKETS]>,
}

impl BoardAnalysis {
    #[must_use]
    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            column_heights: OnceCell::new(),
            column_occupied_cells: OnceCell::new(),
            column_well_depths: OnceCell::new(),
            max_height: OnceCell::new(),
            total_height: OnceCell::new(),
            num_holes: OnceCell::new(),
            row_transitions: OnceCell::new(),
            column_transitions: OnceCell::new(),
            surface_bumpiness: OnceCell::new(),
            sum_of_well_depth: OnceCell::new(),
            row_fill_counts: OnceCell::new(),
            hole_run_counts: OnceCell::new(),
            height_diff_counts: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn into_board(self) -> Board {
        self.board
    }

    /// Height of each column: distance from the floor to its highest occupied cell.
    #[must_use]
    pub fn column_heights(&self) -> &ColumnValues {
        self.column_heights.get_or_init(|| {
            let height = self.board.height();
            (0..self.board.width())
                .map(|x| {
                    let top = self
                        .board
                        .playable_rows()
                        .position(|row| row.is_cell_occupied(x));
                    top.map_or(0, |y| to_u8(height - y))
                })
                .collect()
        })
    }

    #[must_use]
    pub fn column_occupied_cells(&self) -> &ColumnValues {
        self.column_occupied_cells.get_or_init(|| {
            (0..self.board.width())
                .map(|x| {
                    let count = self
                        .board
                        .playable_rows()
                        .filter(|row| row.is_cell_occupied(x))
                        .count();
                    to_u8(count)
                })
                .collect()
        })
    }

    /// Depth of the well in each column, measured against the lower of its neighbours.
    ///
    /// The walls count as infinitely high neighbours.
    #[must_use]
    pub fn column_well_depths(&self) -> &ColumnValues {
        self.column_well_depths.get_or_init(|| {
            let h = self.column_heights();
            let padded: ArrayVec<u8, { MAX_WIDTH + 2 }> = iter::once(u8::MAX)
                .chain(h.iter().copied())
                .chain(iter::once(u8::MAX))
                .collect();
            padded
                .windows(3)
                .map(|w| {
                    if w[1] < w[0] && w[1] < w[2] {
                        u8::min(w[0], w[2]) - w[1]
                    } else {
                        0
                    }
                })
                .collect()
        })
    }

    #[must_use]
    pub fn max_height(&self) -> u8 {
        *self
            .max_height
            .get_or_init(|| self.column_heights().iter().copied().max().unwrap_or(0))
    }

    /// Sum of all column heights.
    #[must_use]
    pub fn total_height(&self) -> u32 {
        *self
            .total_height
            .get_or_init(|| self.column_heights().iter().copied().map(u32::from).sum())
    }

    /// Empty cells with at least one occupied cell above them in the same column.
    #[must_use]
    pub fn num_holes(&self) -> u32 {
        *self.num_holes.get_or_init(|| {
            iter::zip(self.column_heights(), self.column_occupied_cells())
                .map(|(h, occ)| u32::from(h - occ))
                .sum()
        })
    }

    /// Changes between occupied and empty cells along each row.
    #[must_use]
    pub fn row_transitions(&self) -> u32 {
        *self.row_transitions.get_or_init(|| {
            let width = self.board.width();
            (0..self.board.height())
                .map(|y| {
                    let mask = u32::from(self.board.row_mask(y));
                    let changes = (mask ^ (mask >> 1)) & ((1 << (width - 1)) - 1);
                    changes.count_ones()
                })
                .sum()
        })
    }

    /// Changes between occupied and empty cells down each column.
    #[must_use]
    pub fn column_transitions(&self) -> u32 {
        *self.column_transitions.get_or_init(|| {
            let masks: ArrayVec<u16, 40> = (0..self.board.height())
                .map(|y| self.board.row_mask(y))
                .collect();
            masks
                .windows(2)
                .map(|w| (w[0] ^ w[1]).count_ones())
                .sum()
        })
    }

    /// Sum of absolute height differences between adjacent columns.
    #[must_use]
    pub fn surface_bumpiness(&self) -> u32 {
        *self.surface_bumpiness.get_or_init(|| {
            self.column_heights()
                .windows(2)
                .map(|w| {
                    let left = i32::from(w[0]);
                    let right = i32::from(w[1]);
                    (right - left).unsigned_abs()
                })
                .sum()
        })
    }

    #[must_use]
    pub fn sum_of_well_depth(&self) -> u32 {
        *self
            .sum_of_well_depth
            .get_or_init(|| self.column_well_depths().iter().copied().map(u32::from).sum())
    }

    /// Number of rows holding exactly `k` occupied cells, indexed by `k` (`0..=width`).
    ///
    /// Empty rows above the stack count towards `k = 0`.
    #[must_use]
    pub fn row_fill_counts(&self) -> &RowFillCounts {
        self.row_fill_counts.get_or_init(|| {
            let width = self.board.width();
            let mut counts: RowFillCounts = iter::repeat_n(0, width + 1).collect();
            for row in self.board.playable_rows() {
                let filled = (0..width).filter(|&x| row.is_cell_occupied(x)).count();
                counts[filled] += 1;
            }
            counts
        })
    }

    /// Vertical runs of empty cells below each column top, bucketed by run length.
    ///
    /// Index `k - 1` counts runs of length `k`. A run ends at an occupied cell or at the
    /// floor. Runs of [`HOLE_RUN_BUCKETS`] cells or more share the last bucket.
    #[must_use]
    pub fn hole_run_counts(&self) -> &[u32; HOLE_RUN_BUCKETS] {
        self.hole_run_counts.get_or_init(|| {
            let height = self.board.height();
            let mut counts = [0; HOLE_RUN_BUCKETS];
            for (x, &h) in self.column_heights().iter().enumerate() {
                let cells = self
                    .board
                    .playable_rows()
                    .skip(height - usize::from(h))
                    .map(|row| row.is_cell_occupied(x))
                    .chain(iter::once(true));
                let mut run = 0;
                for occupied in cells {
                    if !occupied {
                        run += 1;
                        continue;
                    }
                    if run > 0 {
                        counts[usize::min(run, HOLE_RUN_BUCKETS) - 1] += 1;
                    }
                    run = 0;
                }
            }
            counts
        })
    }

    /// Adjacent column pairs bucketed by their height difference.
    ///
    /// Index `d` counts pairs whose heights differ by `d`; the last bucket also takes
    /// every larger difference.
    #[must_use]
    pub fn height_diff_counts(&self) -> &[u32; HEIGHT_DIFF_BUCKETS] {
        self.height_diff_counts.get_or_init(|| {
            let mut counts = [0; HEIGHT_DIFF_BUCKETS];
            for w in self.column_heights().windows(2) {
                let diff = usize::from(w[0].abs_diff(w[1]));
                counts[usize::min(diff, HEIGHT_DIFF_BUCKETS - 1)] += 1;
            }
            counts
        })
    }
}

/// Board dimensions are bounded well below `u8::MAX`.
fn to_u8(value: usize) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}
