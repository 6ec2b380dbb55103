//! Kinematic dimensions, closed ranges and points.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, TmdError};

/// One of the four binning dimensions of a semi-inclusive event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Bjorken x.
    X,
    /// Photon virtuality Q in GeV.
    Q,
    /// Hadron energy fraction z.
    Z,
    /// Hadron transverse momentum in GeV.
    PhPerp,
}

impl Dimension {
    /// All dimensions in canonical order.
    pub const ALL: [Dimension; 4] = [Dimension::X, Dimension::Q, Dimension::Z, Dimension::PhPerp];

    /// Canonical name used in tables, configs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::X => "X",
            Dimension::Q => "Q",
            Dimension::Z => "Z",
            Dimension::PhPerp => "PhPerp",
        }
    }

    /// Position of the dimension in [`Dimension::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Dimension::X => 0,
            Dimension::Q => 1,
            Dimension::Z => 2,
            Dimension::PhPerp => 3,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = TmdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" => Ok(Dimension::X),
            "Q" => Ok(Dimension::Q),
            "Z" => Ok(Dimension::Z),
            "PhPerp" => Ok(Dimension::PhPerp),
            other => Err(TmdError::Config(
                ErrorInfo::new("invalid-dimension", format!("invalid bin name: {other}"))
                    .with_context("name", other)
                    .with_hint("expected one of X, Q, Z, PhPerp"),
            )),
        }
    }
}

/// Parses an ordered list of dimension names, rejecting unknown and repeated names.
pub fn parse_dimensions<S: AsRef<str>>(names: &[S]) -> Result<Vec<Dimension>, TmdError> {
    let mut seen = BTreeSet::new();
    let mut dims = Vec::with_capacity(names.len());
    for name in names {
        let dim: Dimension = name.as_ref().parse()?;
        if !seen.insert(dim) {
            return Err(TmdError::Config(
                ErrorInfo::new("duplicate-dimension", "duplicate bin names detected")
                    .with_context("name", dim.as_str()),
            ));
        }
        dims.push(dim);
    }
    if dims.is_empty() {
        return Err(TmdError::config(
            "empty-dimensions",
            "at least one grid dimension is required",
        ));
    }
    Ok(dims)
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Lower edge.
    pub min: f64,
    /// Upper edge.
    pub max: f64,
}

impl Range {
    /// Creates a new range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Sentinel range that any running min/max will overwrite.
    pub const fn empty() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Inclusive containment of a value.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Inclusive containment of another range.
    pub fn contains_range(&self, other: &Range) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    /// Midpoint of the range.
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    /// Widens the range to cover `other` using running min/max.
    pub fn widen(&mut self, other: &Range) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

/// A range per dimension, indexed by [`Dimension`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicRanges {
    /// Ranges ordered as [`Dimension::ALL`].
    pub ranges: [Range; 4],
}

impl KinematicRanges {
    /// Creates the set from one range per dimension.
    pub fn new(x: Range, q: Range, z: Range, ph_perp: Range) -> Self {
        Self {
            ranges: [x, q, z, ph_perp],
        }
    }

    /// All four ranges set to the running min/max sentinel.
    pub fn empty() -> Self {
        Self {
            ranges: [Range::empty(); 4],
        }
    }

    /// Range for one dimension.
    pub fn get(&self, dim: Dimension) -> Range {
        self.ranges[dim.index()]
    }

    /// Mutable range for one dimension.
    pub fn get_mut(&mut self, dim: Dimension) -> &mut Range {
        &mut self.ranges[dim.index()]
    }

    /// Inclusive containment of a point in every dimension.
    pub fn contains(&self, point: &KinematicPoint) -> bool {
        Dimension::ALL
            .iter()
            .all(|dim| self.get(*dim).contains(point.get(*dim)))
    }

    /// Midpoint vector of the four ranges.
    pub fn centroid(&self) -> KinematicPoint {
        KinematicPoint {
            values: self.ranges.map(|range| range.midpoint()),
        }
    }
}

/// A point in (X, Q, Z, PhPerp) space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicPoint {
    /// Values ordered as [`Dimension::ALL`].
    pub values: [f64; 4],
}

impl KinematicPoint {
    /// Creates a point from its coordinates.
    pub fn new(x: f64, q: f64, z: f64, ph_perp: f64) -> Self {
        Self {
            values: [x, q, z, ph_perp],
        }
    }

    /// Coordinate along one dimension.
    pub fn get(&self, dim: Dimension) -> f64 {
        self.values[dim.index()]
    }

    /// Squared euclidean distance to another point.
    pub fn distance_squared(&self, other: &KinematicPoint) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

/// Bin edge with a total order, usable inside map keys.
///
/// Negative zero is folded onto zero so that `-0.0` and `0.0` describe the
/// same edge; NaN sorts after every finite edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Edge(f64);

impl Edge {
    /// Wraps a raw edge value.
    pub fn new(value: f64) -> Self {
        if value == 0.0 {
            Self(0.0)
        } else {
            Self(value)
        }
    }

    /// Raw edge value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Edge {}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}
