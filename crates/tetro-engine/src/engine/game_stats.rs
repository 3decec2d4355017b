use serde::{Deserialize, Serialize};

/// Score values for line clears, indexed by the number of lines cleared at once.
const SCORE_TABLE: [usize; 5] = [0, 100, 300, 500, 800];

/// Statistics of a single game.
///
/// - **Completed pieces**: Total number of pieces locked
/// - **Cleared lines**: Sum over all placements
/// - **Line clear distribution**: Count of placements clearing 0, 1, 2, 3 and 4 lines
/// - **Score**: Classic scoring without combos or back-to-back bonuses
///
/// # Example
///
/// ```
/// use tetro_engine::GameStats;
///
/// let mut stats = GameStats::new();
/// stats.complete_piece_drop(4);
/// stats.complete_piece_drop(0);
///
/// assert_eq!(stats.score(), 800);
/// assert_eq!(stats.total_cleared_lines(), 4);
/// assert_eq!(stats.completed_pieces(), 2);
/// assert_eq!(stats.line_cleared_counter()[4], 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    score: usize,
    completed_pieces: usize,
    total_cleared_lines: usize,
    line_cleared_counter: [usize; 5],
}

impl GameStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            completed_pieces: 0,
            total_cleared_lines: 0,
            line_cleared_counter: [0; 5],
        }
    }

    #[must_use]
    pub const fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub const fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Returns a histogram of placements by number of lines cleared (index 0 to 4).
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[usize; 5] {
        &self.line_cleared_counter
    }

    /// Records a locked piece that cleared `cleared_lines` lines.
    pub fn complete_piece_drop(&mut self, cleared_lines: usize) {
        self.completed_pieces += 1;
        self.total_cleared_lines += cleared_lines;
        if let Some(count) = self.line_cleared_counter.get_mut(cleared_lines) {
            *count += 1;
        }
        self.score += SCORE_TABLE.get(cleared_lines).copied().unwrap_or(0);
    }
}
