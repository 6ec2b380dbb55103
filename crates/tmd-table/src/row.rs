use serde::{Deserialize, Serialize};
use tmd_core::{KinematicPoint, KinematicRanges, Range};

/// Edge used by the built-in default cell to span all kinematics.
pub const DEFAULT_CELL_EDGE: f64 = 999_999.0;

/// One cell of the physical amplitude model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsymmetryTableRow {
    /// Target identifier, opaque to the engine.
    pub itar: i32,
    /// Hadron identifier, opaque to the engine.
    pub ihad: i32,
    /// Cell bounds in (X, Q, Z, PhPerp).
    pub ranges: KinematicRanges,
    /// Sivers-type modulation amplitude inside the cell.
    pub amplitude: f64,
}

impl AsymmetryTableRow {
    /// Cell spanning all kinematics with zero amplitude.
    pub fn default_cell() -> Self {
        let all = Range::new(-DEFAULT_CELL_EDGE, DEFAULT_CELL_EDGE);
        Self {
            itar: 1,
            ihad: 1,
            ranges: KinematicRanges::new(all, all, all, all),
            amplitude: 0.0,
        }
    }

    /// Inclusive containment of a point.
    pub fn contains(&self, point: &KinematicPoint) -> bool {
        self.ranges.contains(point)
    }

    /// Midpoint of the cell bounds.
    pub fn centroid(&self) -> KinematicPoint {
        self.ranges.centroid()
    }
}
