use std::collections::BTreeMap;

use indexmap::IndexMap;
use tmd_core::errors::{ErrorInfo, TmdError};
use tmd_core::{Dimension, Edge, Range};

use crate::bins::KinematicBin;
use crate::grid::Grid;
use crate::key::{BinCoordinate, RegionKey};

/// Builds a rectangular partition over the declared main dimensions.
///
/// Regions are added one at a time with [`BinIndexer::add_region`]; the
/// hierarchical coordinates are assigned once by
/// [`BinIndexer::compute_indices`], which consumes the indexer and returns
/// the read-only [`Grid`].
#[derive(Debug, Clone)]
pub struct BinIndexer {
    main: Vec<Dimension>,
    bins: IndexMap<RegionKey, KinematicBin>,
}

impl BinIndexer {
    /// Creates an indexer keyed on the given main dimensions, in declared order.
    pub fn new(main: Vec<Dimension>) -> Self {
        Self {
            main,
            bins: IndexMap::new(),
        }
    }

    /// Main dimensions in declared order.
    pub fn main_dimensions(&self) -> &[Dimension] {
        &self.main
    }

    /// Number of distinct main bins seen so far.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Whether no region has been added yet.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Adds one source cell.
    ///
    /// The cell's bounds in the main dimensions form its key; a bin is created
    /// on first sight of the key. Every tracked dimension of the bin is then
    /// widened by running min/max over the cell's ranges.
    pub fn add_region(&mut self, ranges: &BTreeMap<Dimension, Range>) -> Result<(), TmdError> {
        let mut bounds = Vec::with_capacity(self.main.len());
        for dim in &self.main {
            let range = ranges.get(dim).ok_or_else(|| {
                TmdError::Grid(
                    ErrorInfo::new("missing-dimension", "region lacks a main dimension")
                        .with_context("dimension", dim.as_str()),
                )
            })?;
            bounds.push((*dim, Edge::new(range.min), Edge::new(range.max)));
        }
        let bin = self.bins.entry(RegionKey::new(bounds)).or_default();
        bin.increment();
        for (dim, range) in ranges {
            bin.absorb(*dim, range);
        }
        Ok(())
    }

    /// Assigns every main bin its hierarchical coordinate and freezes the grid.
    pub fn compute_indices(self) -> Grid {
        let span = tracing::debug_span!("grid.compute_indices", bins = self.bins.len());
        let _guard = span.enter();

        let coordinates = assign_coordinates(self.bins.keys(), self.main.len());
        let unindexed = coordinates.iter().filter(|c| !c.is_indexable()).count();
        if unindexed > 0 {
            tracing::warn!(unindexed, "regions could not be assigned a coordinate");
        }
        Grid::new(self.main, self.bins, coordinates)
    }
}

type Interval = (Edge, Edge);

fn contains(outer: &Interval, inner: &Interval) -> bool {
    outer.0.value() <= inner.0.value() && inner.1.value() <= outer.1.value()
}

/// Collapses overlapping coarse/fine partitions onto one slot per maximal interval.
///
/// Intervals are scanned by ascending low edge, wider first on ties, and kept
/// only when no previously kept interval contains them.
fn kept_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    intervals.dedup();
    let mut kept: Vec<Interval> = Vec::new();
    for interval in intervals {
        if !kept.iter().any(|outer| contains(outer, &interval)) {
            kept.push(interval);
        }
    }
    kept
}

fn assign_coordinates<'a>(
    keys: impl Iterator<Item = &'a RegionKey>,
    ndim: usize,
) -> Vec<BinCoordinate> {
    let keys: Vec<&RegionKey> = keys.collect();
    let mut slots: Vec<Vec<Option<usize>>> = vec![Vec::with_capacity(ndim); keys.len()];
    // Low edges of the kept intervals chosen so far, per region.
    let mut parents: Vec<Vec<Edge>> = vec![Vec::with_capacity(ndim); keys.len()];

    for axis in 0..ndim {
        let mut groups: BTreeMap<Vec<Edge>, Vec<Interval>> = BTreeMap::new();
        for (region, key) in keys.iter().enumerate() {
            if let Some(interval) = key.interval(axis) {
                groups
                    .entry(parents[region].clone())
                    .or_default()
                    .push(interval);
            }
        }
        let kept: BTreeMap<Vec<Edge>, Vec<Interval>> = groups
            .into_iter()
            .map(|(parent, intervals)| (parent, kept_intervals(intervals)))
            .collect();

        for (region, key) in keys.iter().enumerate() {
            let found = key.interval(axis).and_then(|interval| {
                kept.get(&parents[region]).and_then(|group| {
                    group
                        .iter()
                        .position(|outer| contains(outer, &interval))
                        .map(|idx| (idx, group[idx].0))
                })
            });
            match found {
                Some((idx, low)) => {
                    slots[region].push(Some(idx));
                    parents[region].push(low);
                }
                None => {
                    slots[region].push(None);
                    parents[region].push(Edge::new(f64::NAN));
                }
            }
        }
    }

    slots.into_iter().map(BinCoordinate::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(lo: f64, hi: f64) -> Interval {
        (Edge::new(lo), Edge::new(hi))
    }

    #[test]
    fn fine_cell_sharing_low_edge_is_absorbed() {
        let kept = kept_intervals(vec![iv(0.0, 0.5), iv(0.0, 1.0), iv(0.5, 1.0)]);
        assert_eq!(kept, vec![iv(0.0, 1.0)]);
    }

    #[test]
    fn disjoint_intervals_are_kept_in_order() {
        let kept = kept_intervals(vec![iv(0.2, 0.3), iv(0.0, 0.1), iv(0.1, 0.2)]);
        assert_eq!(kept, vec![iv(0.0, 0.1), iv(0.1, 0.2), iv(0.2, 0.3)]);
    }

    #[test]
    fn nan_interval_is_unindexable() {
        let keys = [RegionKey::new(vec![(
            Dimension::X,
            Edge::new(f64::NAN),
            Edge::new(1.0),
        )])];
        let coords = assign_coordinates(keys.iter(), 1);
        assert!(!coords[0].is_indexable());
    }
}
