use serde::{Deserialize, Serialize};
use tmd_core::{Dimension, KinematicPoint, KinematicRanges, Range};

/// Event counts recorded by the most recent trial on a bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinCounts {
    /// Number of MC events selected by the trial.
    pub events: u64,
    /// Luminosity-scaled event count, rounded to the nearest integer.
    pub expected_events: u64,
}

/// Rectangular region over the four kinematic dimensions.
///
/// Extents start at the `+inf/-inf` sentinel and widen with every sub-cell
/// merged into the bin. Counts are overwritten, never accumulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicBin {
    ranges: KinematicRanges,
    sub_cells: usize,
    counts: BinCounts,
}

impl Default for KinematicBin {
    fn default() -> Self {
        Self::new()
    }
}

impl KinematicBin {
    /// Creates an empty bin whose extents are the running min/max sentinels.
    pub fn new() -> Self {
        Self {
            ranges: KinematicRanges::empty(),
            sub_cells: 0,
            counts: BinCounts::default(),
        }
    }

    /// Creates a bin covering exactly the given ranges.
    pub fn from_ranges(ranges: KinematicRanges) -> Self {
        Self {
            ranges,
            sub_cells: 1,
            counts: BinCounts::default(),
        }
    }

    /// Range along one dimension.
    pub fn range(&self, dim: Dimension) -> Range {
        self.ranges.get(dim)
    }

    /// All four ranges.
    pub fn ranges(&self) -> &KinematicRanges {
        &self.ranges
    }

    /// Lower edge along one dimension.
    pub fn min(&self, dim: Dimension) -> f64 {
        self.ranges.get(dim).min
    }

    /// Upper edge along one dimension.
    pub fn max(&self, dim: Dimension) -> f64 {
        self.ranges.get(dim).max
    }

    /// Number of source cells merged into this bin.
    pub fn sub_cells(&self) -> usize {
        self.sub_cells
    }

    /// Counts written by the most recent trial.
    pub fn counts(&self) -> BinCounts {
        self.counts
    }

    /// Overwrites the trial counts.
    pub fn record_counts(&mut self, counts: BinCounts) {
        self.counts = counts;
    }

    /// Whether any cell has widened the range of `dim`.
    pub fn is_tracked(&self, dim: Dimension) -> bool {
        let range = self.ranges.get(dim);
        range.min <= range.max
    }

    /// Inclusive containment of a point in every tracked dimension.
    ///
    /// A bin with no tracked dimension contains nothing.
    pub fn contains(&self, point: &KinematicPoint) -> bool {
        let mut tracked = Dimension::ALL
            .iter()
            .filter(|dim| self.is_tracked(**dim))
            .peekable();
        tracked.peek().is_some()
            && tracked.all(|dim| self.ranges.get(*dim).contains(point.get(*dim)))
    }

    pub(crate) fn absorb(&mut self, dim: Dimension, range: &Range) {
        self.ranges.get_mut(dim).widen(range);
    }

    pub(crate) fn increment(&mut self) {
        self.sub_cells += 1;
    }
}
