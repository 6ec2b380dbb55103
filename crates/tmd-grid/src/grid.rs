use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tmd_core::{Dimension, KinematicPoint, Range};

use crate::bins::KinematicBin;
use crate::key::{BinCoordinate, RegionKey};

/// Read-only, insertion-ordered grid of main bins with their coordinates.
#[derive(Debug, Clone)]
pub struct Grid {
    main: Vec<Dimension>,
    bins: IndexMap<RegionKey, KinematicBin>,
    coordinates: Vec<BinCoordinate>,
}

/// Borrowed view of one grid entry.
#[derive(Debug, Clone, Copy)]
pub struct GridEntry<'a> {
    /// Insertion position of the bin.
    pub index: usize,
    /// Canonical region key.
    pub key: &'a RegionKey,
    /// Bin extents and counters.
    pub bin: &'a KinematicBin,
    /// Hierarchical coordinate.
    pub coordinate: &'a BinCoordinate,
}

impl Grid {
    pub(crate) fn new(
        main: Vec<Dimension>,
        bins: IndexMap<RegionKey, KinematicBin>,
        coordinates: Vec<BinCoordinate>,
    ) -> Self {
        Self {
            main,
            bins,
            coordinates,
        }
    }

    /// Main dimensions in declared order.
    pub fn main_dimensions(&self) -> &[Dimension] {
        &self.main
    }

    /// Number of main bins.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Whether the grid holds no bins.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Bin at an insertion position.
    pub fn bin(&self, index: usize) -> Option<&KinematicBin> {
        self.bins.get_index(index).map(|(_, bin)| bin)
    }

    /// Full entry at an insertion position.
    pub fn entry(&self, index: usize) -> Option<GridEntry<'_>> {
        let (key, bin) = self.bins.get_index(index)?;
        let coordinate = self.coordinates.get(index)?;
        Some(GridEntry {
            index,
            key,
            bin,
            coordinate,
        })
    }

    /// Iterates over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = GridEntry<'_>> + '_ {
        self.bins
            .iter()
            .zip(self.coordinates.iter())
            .enumerate()
            .map(|(index, ((key, bin), coordinate))| GridEntry {
                index,
                key,
                bin,
                coordinate,
            })
    }

    /// Coordinate assigned to a region key.
    pub fn coordinate(&self, key: &RegionKey) -> Option<&BinCoordinate> {
        self.bins
            .get_index_of(key)
            .and_then(|idx| self.coordinates.get(idx))
    }

    /// Insertion position of the first bin containing the point.
    pub fn locate(&self, point: &KinematicPoint) -> Option<usize> {
        self.bins.values().position(|bin| bin.contains(point))
    }

    /// Distinct indices used on one axis across all bins.
    pub fn distinct_indices(&self, axis: usize) -> BTreeSet<usize> {
        self.coordinates
            .iter()
            .filter_map(|coord| coord.get(axis))
            .collect()
    }

    /// Serializable summary of the grid.
    pub fn summary(&self) -> GridSummary {
        let bins: Vec<GridSummaryEntry> = self
            .iter()
            .map(|entry| GridSummaryEntry {
                index: entry.index,
                key: entry.key.to_string(),
                sub_cells: entry.bin.sub_cells(),
                ranges: Dimension::ALL
                    .iter()
                    .map(|dim| (dim.as_str().to_string(), entry.bin.range(*dim)))
                    .collect(),
                coordinate: entry.coordinate.clone(),
            })
            .collect();
        GridSummary {
            main_dimensions: self.main.clone(),
            total_main_bins: bins.len(),
            total_sub_cells: bins.iter().map(|bin| bin.sub_cells).sum(),
            bins,
        }
    }

    /// Emits the grid summary at debug level, at most `max_entries` bins (0 = all).
    pub fn log_summary(&self, max_entries: usize) {
        let summary = self.summary();
        tracing::debug!(main = ?summary.main_dimensions, "grid main bin names");
        for entry in summary
            .bins
            .iter()
            .take(if max_entries == 0 { usize::MAX } else { max_entries })
        {
            tracing::debug!(
                index = entry.index,
                key = %entry.key,
                count = entry.sub_cells,
                coordinate = %entry.coordinate,
                "main bin"
            );
            for (name, range) in &entry.ranges {
                tracing::debug!(dimension = %name, min = range.min, max = range.max, "  range");
            }
        }
        tracing::debug!(
            main_bins = summary.total_main_bins,
            sub_cells = summary.total_sub_cells,
            "grid totals"
        );
    }
}

/// Summary line for one main bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSummaryEntry {
    /// Insertion position.
    pub index: usize,
    /// Rendered region key, e.g. `X[0.1,0.2]Q[1,2]`.
    pub key: String,
    /// Number of merged source cells.
    pub sub_cells: usize,
    /// Extents in every dimension.
    pub ranges: BTreeMap<String, Range>,
    /// Hierarchical coordinate.
    pub coordinate: BinCoordinate,
}

/// Serializable description of a [`Grid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSummary {
    /// Main dimensions in declared order.
    pub main_dimensions: Vec<Dimension>,
    /// Per-bin summary lines in insertion order.
    pub bins: Vec<GridSummaryEntry>,
    /// Number of main bins.
    pub total_main_bins: usize,
    /// Number of source cells across all bins.
    pub total_sub_cells: usize,
}
