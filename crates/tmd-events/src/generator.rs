use std::f64::consts::PI;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tmd_core::errors::{ErrorInfo, TmdError};
use tmd_core::{Range, RngHandle};

use crate::columns::{KinematicSet, WEIGHT};
use crate::store::EventStore;

/// Pseudo-data generation settings.
///
/// True kinematics are drawn uniformly inside the configured ranges and
/// azimuths uniformly in `[-pi, pi)`. Reconstructed values apply relative
/// gaussian smearing to X, Q, Z, PhPerp and Y, and absolute smearing in
/// radians to the azimuths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of events to generate.
    #[serde(default = "default_n_events")]
    pub n_events: usize,
    /// Bjorken x range.
    #[serde(default = "default_x")]
    pub x: Range,
    /// Q range in GeV.
    #[serde(default = "default_q")]
    pub q: Range,
    /// Hadron energy fraction range.
    #[serde(default = "default_z")]
    pub z: Range,
    /// Hadron transverse momentum range.
    #[serde(default = "default_ph_perp")]
    pub ph_perp: Range,
    /// Inelasticity range.
    #[serde(default = "default_y")]
    pub y: Range,
    /// Gaussian smearing width.
    #[serde(default = "default_smearing")]
    pub smearing: f64,
    /// Emit a `Weight` column drawn uniformly in `[0.5, 1.5)`.
    #[serde(default)]
    pub weighted: bool,
}

fn default_n_events() -> usize {
    10_000
}

fn default_x() -> Range {
    Range::new(0.05, 0.3)
}

fn default_q() -> Range {
    Range::new(1.0, 10.0)
}

fn default_z() -> Range {
    Range::new(0.2, 0.8)
}

fn default_ph_perp() -> Range {
    Range::new(0.0, 1.0)
}

fn default_y() -> Range {
    Range::new(0.1, 0.9)
}

fn default_smearing() -> f64 {
    0.02
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            n_events: default_n_events(),
            x: default_x(),
            q: default_q(),
            z: default_z(),
            ph_perp: default_ph_perp(),
            y: default_y(),
            smearing: default_smearing(),
            weighted: false,
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> Result<(), TmdError> {
        if !self.smearing.is_finite() || self.smearing < 0.0 {
            return Err(TmdError::Config(
                ErrorInfo::new("invalid-smearing", "smearing must be finite and non-negative")
                    .with_context("smearing", self.smearing.to_string()),
            ));
        }
        for (name, range) in [
            ("x", self.x),
            ("q", self.q),
            ("z", self.z),
            ("ph_perp", self.ph_perp),
            ("y", self.y),
        ] {
            if !(range.min.is_finite() && range.max.is_finite() && range.min <= range.max) {
                return Err(TmdError::Config(
                    ErrorInfo::new("invalid-range", "generator range must satisfy min <= max")
                        .with_context("field", name)
                        .with_context("min", range.min.to_string())
                        .with_context("max", range.max.to_string()),
                ));
            }
        }
        Ok(())
    }
}

fn uniform(rng: &mut RngHandle, range: Range) -> f64 {
    rng.gen_range(range.min..=range.max)
}

/// Generates a pseudo-data sample carrying both true and reconstructed kinematics.
pub fn generate_events(config: &GeneratorConfig, seed: u64) -> Result<EventStore, TmdError> {
    config.validate()?;
    let mut rng = RngHandle::from_seed(seed);
    let n = config.n_events;
    let truth = KinematicSet::True.names();
    let reco = KinematicSet::Reconstructed.names();
    let names = [
        truth.x, truth.q, truth.z, truth.ph_perp, truth.phi_h, truth.phi_s, truth.y, reco.x,
        reco.q, reco.z, reco.ph_perp, reco.phi_h, reco.phi_s, reco.y,
    ];
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(n); names.len()];
    let mut weights = Vec::with_capacity(if config.weighted { n } else { 0 });
    let smear = Normal::new(0.0, config.smearing).map_err(|err| {
        TmdError::Config(
            ErrorInfo::new("invalid-smearing", err.to_string())
                .with_context("smearing", config.smearing.to_string()),
        )
    })?;
    for _ in 0..n {
        let true_values = [
            uniform(&mut rng, config.x),
            uniform(&mut rng, config.q),
            uniform(&mut rng, config.z),
            uniform(&mut rng, config.ph_perp),
            rng.gen_range(-PI..PI),
            rng.gen_range(-PI..PI),
            uniform(&mut rng, config.y),
        ];
        for (slot, value) in true_values.iter().enumerate() {
            let smeared = if slot == 4 || slot == 5 {
                value + smear.sample(&mut rng)
            } else {
                value * (1.0 + smear.sample(&mut rng))
            };
            columns[slot].push(*value);
            columns[slot + 7].push(smeared);
        }
        if config.weighted {
            weights.push(rng.gen_range(0.5..1.5));
        }
    }
    let mut named: Vec<(String, Vec<f64>)> = names
        .iter()
        .map(|name| name.to_string())
        .zip(columns)
        .collect();
    if config.weighted {
        named.push((WEIGHT.to_string(), weights));
    }
    tracing::info!(events = n, seed, weighted = config.weighted, "generated pseudo-data");
    EventStore::from_columns(named)
}
