use std::fmt;

use serde::{Deserialize, Serialize};
use tmd_core::{Dimension, Edge, Range};

/// Canonical key of a main bin: the bounds of the region in each main dimension,
/// in declared order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionKey {
    bounds: Vec<(Dimension, Edge, Edge)>,
}

impl RegionKey {
    pub(crate) fn new(bounds: Vec<(Dimension, Edge, Edge)>) -> Self {
        Self { bounds }
    }

    /// Number of main dimensions in the key.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Whether the key spans no dimensions.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Interval of the key at one axis position.
    pub fn interval(&self, axis: usize) -> Option<(Edge, Edge)> {
        self.bounds.get(axis).map(|(_, lo, hi)| (*lo, *hi))
    }

    /// Range of the key along a named dimension.
    pub fn range(&self, dim: Dimension) -> Option<Range> {
        self.bounds
            .iter()
            .find(|(d, _, _)| *d == dim)
            .map(|(_, lo, hi)| Range::new(lo.value(), hi.value()))
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (dim, lo, hi) in &self.bounds {
            write!(f, "{}[{},{}]", dim, lo.value(), hi.value())?;
        }
        Ok(())
    }
}

/// Hierarchical integer coordinate of a main bin, one slot per main dimension.
///
/// `None` marks an axis on which the region could not be indexed; such bins
/// must be excluded from downstream reporting. Serialized with `-1` for `None`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<i64>", from = "Vec<i64>")]
pub struct BinCoordinate(Vec<Option<usize>>);

impl BinCoordinate {
    pub(crate) fn new(slots: Vec<Option<usize>>) -> Self {
        Self(slots)
    }

    /// Index along one axis.
    pub fn get(&self, axis: usize) -> Option<usize> {
        self.0.get(axis).copied().flatten()
    }

    /// Raw slots.
    pub fn slots(&self) -> &[Option<usize>] {
        &self.0
    }

    /// Whether every axis carries a valid index.
    pub fn is_indexable(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }
}

impl From<BinCoordinate> for Vec<i64> {
    fn from(coord: BinCoordinate) -> Self {
        coord
            .0
            .into_iter()
            .map(|slot| slot.map(|idx| idx as i64).unwrap_or(-1))
            .collect()
    }
}

impl From<Vec<i64>> for BinCoordinate {
    fn from(raw: Vec<i64>) -> Self {
        BinCoordinate(
            raw.into_iter()
                .map(|value| usize::try_from(value).ok())
                .collect(),
        )
    }
}

impl fmt::Display for BinCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, slot) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            match slot {
                Some(value) => write!(f, "{value}")?,
                None => write!(f, "-1")?,
            }
        }
        write!(f, "]")
    }
}
