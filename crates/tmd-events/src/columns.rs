//! Column names and capability negotiation.

use serde::{Deserialize, Serialize};
use tmd_core::errors::{ErrorInfo, TmdError};
use tmd_core::KinematicPoint;

use crate::source::EventSource;

/// Optional per-event weight; 1.0 when absent.
pub const WEIGHT: &str = "Weight";

/// Which kinematic variables a trial reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KinematicSet {
    /// Detector-smeared values.
    Reconstructed,
    /// Simulated-truth values.
    True,
}

/// Column names making up one kinematic set.
#[derive(Debug, Clone, Copy)]
pub struct ColumnNames {
    /// Bjorken x.
    pub x: &'static str,
    /// Q in GeV.
    pub q: &'static str,
    /// Q² in GeV², used when `q` is absent.
    pub q2: &'static str,
    /// Hadron energy fraction.
    pub z: &'static str,
    /// Hadron transverse momentum.
    pub ph_perp: &'static str,
    /// Hadron azimuth.
    pub phi_h: &'static str,
    /// Target-spin azimuth.
    pub phi_s: &'static str,
    /// Inelasticity.
    pub y: &'static str,
}

impl KinematicSet {
    /// Column names of this set.
    pub fn names(&self) -> ColumnNames {
        match self {
            KinematicSet::Reconstructed => ColumnNames {
                x: "X",
                q: "Q",
                q2: "Q2",
                z: "Z",
                ph_perp: "PhPerp",
                phi_h: "PhiH",
                phi_s: "PhiS",
                y: "Y",
            },
            KinematicSet::True => ColumnNames {
                x: "TrueX",
                q: "TrueQ",
                q2: "TrueQ2",
                z: "TrueZ",
                ph_perp: "TruePhPerp",
                phi_h: "TruePhiH",
                phi_s: "TruePhiS",
                y: "TrueY",
            },
        }
    }
}

/// How Q is obtained from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QSource {
    /// A Q column is present.
    Direct,
    /// Q is derived as the square root of a Q² column.
    Squared,
}

/// Optional fields present in a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Per-event weights are present.
    pub weight: bool,
    /// Origin of reconstructed Q.
    pub q: QSource,
    /// Origin of true Q, or `None` when true kinematics are absent.
    pub true_kinematics: Option<QSource>,
}

#[derive(Debug, Clone, Copy)]
enum QColumn<'a> {
    Direct(&'a [f64]),
    Squared(&'a [f64]),
}

impl QColumn<'_> {
    fn value(&self, i: usize) -> f64 {
        match self {
            QColumn::Direct(values) => values[i],
            QColumn::Squared(values) => values[i].sqrt(),
        }
    }

    fn source(&self) -> QSource {
        match self {
            QColumn::Direct(_) => QSource::Direct,
            QColumn::Squared(_) => QSource::Squared,
        }
    }
}

/// Kinematics of one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    /// Bjorken x.
    pub x: f64,
    /// Q in GeV.
    pub q: f64,
    /// Hadron energy fraction.
    pub z: f64,
    /// Hadron transverse momentum.
    pub ph_perp: f64,
    /// Hadron azimuth.
    pub phi_h: f64,
    /// Target-spin azimuth.
    pub phi_s: f64,
    /// Inelasticity.
    pub y: f64,
}

impl Kinematics {
    /// Binning coordinates (X, Q, Z, PhPerp).
    pub fn point(&self) -> KinematicPoint {
        KinematicPoint::new(self.x, self.q, self.z, self.ph_perp)
    }
}

/// Resolved columns of one kinematic set.
#[derive(Debug, Clone, Copy)]
pub struct KinematicColumns<'a> {
    x: &'a [f64],
    q: QColumn<'a>,
    z: &'a [f64],
    ph_perp: &'a [f64],
    phi_h: &'a [f64],
    phi_s: &'a [f64],
    y: &'a [f64],
}

impl<'a> KinematicColumns<'a> {
    fn resolve(source: &'a dyn EventSource, set: KinematicSet, len: usize) -> Result<Self, TmdError> {
        let names = set.names();
        let column = |name: &'static str| -> Result<&'a [f64], TmdError> {
            let values = source.column(name).ok_or_else(|| missing_column(name))?;
            if values.len() < len {
                return Err(TmdError::Events(
                    ErrorInfo::new("short-column", "column shorter than the scan length")
                        .with_context("column", name)
                        .with_context("len", values.len().to_string())
                        .with_context("scan_len", len.to_string()),
                ));
            }
            Ok(values)
        };
        let q = if source.has_column(names.q) {
            QColumn::Direct(column(names.q)?)
        } else if source.has_column(names.q2) {
            QColumn::Squared(column(names.q2)?)
        } else {
            return Err(missing_column(names.q));
        };
        Ok(Self {
            x: column(names.x)?,
            q,
            z: column(names.z)?,
            ph_perp: column(names.ph_perp)?,
            phi_h: column(names.phi_h)?,
            phi_s: column(names.phi_s)?,
            y: column(names.y)?,
        })
    }

    /// Kinematics of record `i`.
    pub fn get(&self, i: usize) -> Kinematics {
        Kinematics {
            x: self.x[i],
            q: self.q.value(i),
            z: self.z[i],
            ph_perp: self.ph_perp[i],
            phi_h: self.phi_h[i],
            phi_s: self.phi_s[i],
            y: self.y[i],
        }
    }
}

/// Columns of a source negotiated once for a scan.
#[derive(Debug, Clone, Copy)]
pub struct EventColumns<'a> {
    len: usize,
    reconstructed: KinematicColumns<'a>,
    truth: Option<KinematicColumns<'a>>,
    weight: Option<&'a [f64]>,
}

impl<'a> EventColumns<'a> {
    /// Negotiates the capabilities of `source`.
    ///
    /// Reconstructed kinematics are required. True kinematics and weights are
    /// optional; a partially present true set is treated as absent.
    pub fn resolve(source: &'a dyn EventSource) -> Result<Self, TmdError> {
        let len = source.scan_len();
        let reconstructed = KinematicColumns::resolve(source, KinematicSet::Reconstructed, len)?;
        let truth = match KinematicColumns::resolve(source, KinematicSet::True, len) {
            Ok(columns) => Some(columns),
            Err(err) => {
                tracing::debug!(reason = %err, "true kinematics unavailable");
                None
            }
        };
        let weight = match source.column(WEIGHT) {
            Some(values) if values.len() >= len => Some(values),
            Some(values) => {
                return Err(TmdError::Events(
                    ErrorInfo::new("short-column", "weight column shorter than the scan length")
                        .with_context("len", values.len().to_string())
                        .with_context("scan_len", len.to_string()),
                ))
            }
            None => None,
        };
        Ok(Self {
            len,
            reconstructed,
            truth,
            weight,
        })
    }

    /// Records visited by a scan.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the scan visits no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Negotiated capabilities.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            weight: self.weight.is_some(),
            q: self.reconstructed.q.source(),
            true_kinematics: self.truth.map(|columns| columns.q.source()),
        }
    }

    /// Columns of a kinematic set, if present.
    pub fn set(&self, set: KinematicSet) -> Option<&KinematicColumns<'a>> {
        match set {
            KinematicSet::Reconstructed => Some(&self.reconstructed),
            KinematicSet::True => self.truth.as_ref(),
        }
    }

    /// Physical weight of record `i`.
    pub fn weight(&self, i: usize) -> f64 {
        self.weight.map_or(1.0, |values| values[i])
    }
}

fn missing_column(name: &str) -> TmdError {
    TmdError::Events(
        ErrorInfo::new("missing-column", format!("event source has no column {name}"))
            .with_context("column", name),
    )
}
