//! Board features scored by the heuristic evaluator.
//!
//! Each feature reads a raw measurement from a [`PlacementAnalysis`]: either a metric of
//! the resulting board or the number of lines the placement cleared. Features are not
//! normalized or signed; the learned weight decides whether a feature is rewarded or
//! penalized.
//!
//! The default set, in weight order, is [`BoardFeature::DEFAULT`]:
//!
//! | id                 | measures                                           |
//! |--------------------|----------------------------------------------------|
//! | `aggregate-height` | sum of column heights                              |
//! | `complete-lines`   | lines cleared by the placement                     |
//! | `holes`            | empty cells covered by an occupied cell            |
//! | `bumpiness`        | sum of height differences between adjacent columns |
//!
//! # Bucketed features
//!
//! Three families count occurrences per bucket, one weight per bucket:
//!
//! | id                | counts                                                        |
//! |-------------------|---------------------------------------------------------------|
//! | `row-filled-{k}`  | rows with exactly `k` occupied cells, `k` in `0..=width`      |
//! | `hole-height-{k}` | empty runs of `k` cells below a column top, `k` in `1..=5`    |
//! | `column-diff-{k}` | adjacent columns whose heights differ by `k`, `k` in `0..=4`  |
//!
//! The last bucket of `hole-height` and `column-diff` also takes every larger value.
//! [`BoardFeature::bucketed`] lists the full family for a board width.

use std::{fmt, iter, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tetro_engine::BoardSize;

use crate::{
    board_analysis::{HEIGHT_DIFF_BUCKETS, HOLE_RUN_BUCKETS},
    placement_analysis::PlacementAnalysis,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardFeature {
    AggregateHeight,
    CompleteLines,
    Holes,
    Bumpiness,
    MaxHeight,
    RowTransitions,
    ColumnTransitions,
    WellDepth,
    /// Rows with exactly this many occupied cells.
    RowFilled(u8),
    /// Empty runs of this length (the last bucket: at least this length).
    HoleHeight(u8),
    /// Adjacent column pairs with this height difference (the last bucket: at least).
    ColumnDiff(u8),
}

impl BoardFeature {
    pub const DEFAULT: [Self; 4] = [
        Self::AggregateHeight,
        Self::CompleteLines,
        Self::Holes,
        Self::Bumpiness,
    ];

    /// Features without a bucket parameter.
    pub const SCALAR: [Self; 8] = [
        Self::AggregateHeight,
        Self::CompleteLines,
        Self::Holes,
        Self::Bumpiness,
        Self::MaxHeight,
        Self::RowTransitions,
        Self::ColumnTransitions,
        Self::WellDepth,
    ];

    /// Every bucket of the row-fill, hole-height and column-difference families.
    ///
    /// ```
    /// use tetro_evaluator::board_feature::BoardFeature;
    ///
    /// let features = BoardFeature::bucketed(10);
    /// assert_eq!(features.len(), 11 + 5 + 5);
    /// assert_eq!(features[0].to_string(), "row-filled-0");
    /// assert_eq!(features[11].to_string(), "hole-height-1");
    /// ```
    #[must_use]
    pub fn bucketed(width: usize) -> Vec<Self> {
        let width = u8::try_from(width).unwrap_or(u8::MAX);
        let holes = (1..=HOLE_RUN_BUCKETS).filter_map(|k| u8::try_from(k).ok());
        let diffs = (0..HEIGHT_DIFF_BUCKETS).filter_map(|k| u8::try_from(k).ok());
        iter::empty()
            .chain((0..=width).map(Self::RowFilled))
            .chain(holes.map(Self::HoleHeight))
            .chain(diffs.map(Self::ColumnDiff))
            .collect()
    }

    /// Id of a scalar feature; `None` for bucketed ones.
    #[must_use]
    pub const fn scalar_id(self) -> Option<&'static str> {
        let id = match self {
            Self::AggregateHeight => "aggregate-height",
            Self::CompleteLines => "complete-lines",
            Self::Holes => "holes",
            Self::Bumpiness => "bumpiness",
            Self::MaxHeight => "max-height",
            Self::RowTransitions => "row-transitions",
            Self::ColumnTransitions => "column-transitions",
            Self::WellDepth => "well-depth",
            Self::RowFilled(_) | Self::HoleHeight(_) | Self::ColumnDiff(_) => return None,
        };
        Some(id)
    }

    /// Smallest board width on which the feature can be non-zero.
    #[must_use]
    pub fn required_width(self) -> usize {
        match self {
            Self::RowFilled(k) => usize::from(k),
            _ => 0,
        }
    }

    #[must_use]
    pub fn extract_raw(self, analysis: &PlacementAnalysis) -> u32 {
        let board = analysis.board_analysis();
        match self {
            Self::AggregateHeight => board.total_height(),
            Self::CompleteLines => u32::try_from(analysis.cleared_lines()).unwrap_or(u32::MAX),
            Self::Holes => board.num_holes(),
            Self::Bumpiness => board.surface_bumpiness(),
            Self::MaxHeight => u32::from(board.max_height()),
            Self::RowTransitions => board.row_transitions(),
            Self::ColumnTransitions => board.column_transitions(),
            Self::WellDepth => board.sum_of_well_depth(),
            Self::RowFilled(k) => bucket(board.row_fill_counts(), usize::from(k)),
            Self::HoleHeight(k) => usize::from(k)
                .checked_sub(1)
                .map_or(0, |i| bucket(board.hole_run_counts(), i)),
            Self::ColumnDiff(k) => bucket(board.height_diff_counts(), usize::from(k)),
        }
    }

    /// Feature value as fed into the weighted sum.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn value(self, analysis: &PlacementAnalysis) -> f32 {
        self.extract_raw(analysis) as f32
    }
}

fn bucket(counts: &[u32], index: usize) -> u32 {
    counts.get(index).copied().unwrap_or(0)
}

impl fmt::Display for BoardFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowFilled(k) => write!(f, "row-filled-{k}"),
            Self::HoleHeight(k) => write!(f, "hole-height-{k}"),
            Self::ColumnDiff(k) => write!(f, "column-diff-{k}"),
            scalar => f.write_str(scalar.scalar_id().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown board feature {name:?}")]
pub struct UnknownFeature {
    pub name: String,
}

impl FromStr for BoardFeature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownFeature { name: s.to_owned() };
        if let Some(feature) = Self::SCALAR
            .into_iter()
            .find(|feature| feature.scalar_id() == Some(s))
        {
            return Ok(feature);
        }

        let max_width = *BoardSize::WIDTH_RANGE.end();
        let families: [(&str, fn(u8) -> Self, usize, usize); 3] = [
            ("row-filled-", Self::RowFilled, 0, max_width),
            ("hole-height-", Self::HoleHeight, 1, HOLE_RUN_BUCKETS),
            ("column-diff-", Self::ColumnDiff, 0, HEIGHT_DIFF_BUCKETS - 1),
        ];
        families
            .into_iter()
            .find_map(|(prefix, make, min, max)| {
                let k: u8 = s.strip_prefix(prefix)?.parse().ok()?;
                (min..=max).contains(&usize::from(k)).then(|| make(k))
            })
            .ok_or_else(unknown)
    }
}

impl Serialize for BoardFeature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BoardFeature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
