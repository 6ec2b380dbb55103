//! One Monte Carlo injection trial on one kinematic bin.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tmd_core::errors::{ErrorInfo, TmdError};
use tmd_core::RngHandle;
use tmd_events::{EventColumns, EventSource, KinematicSet, Kinematics};
use tmd_grid::{BinCounts, KinematicBin};
use tmd_table::AsymmetryTable;

use crate::fit::{fit_amplitude, FitEntry, FitResult, FitStatus};
use crate::kinematics::{depolarization, sanitize, spin_projection};

/// Source of the amplitude injected into each event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmplitudeMode {
    /// The same amplitude for every event.
    Fixed(f64),
    /// Table lookup at each event's true kinematics.
    Table,
}

/// Kinematics used for bin selection and the fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Detector-smeared kinematics.
    Reconstructed,
    /// Simulated-truth kinematics.
    True,
}

impl ExtractionMode {
    /// Mode for an `extract_with_true` flag.
    pub fn from_flag(extract_with_true: bool) -> Self {
        if extract_with_true {
            ExtractionMode::True
        } else {
            ExtractionMode::Reconstructed
        }
    }

    /// Event columns read in this mode.
    pub fn kinematic_set(&self) -> KinematicSet {
        match self {
            ExtractionMode::Reconstructed => KinematicSet::Reconstructed,
            ExtractionMode::True => KinematicSet::True,
        }
    }
}

/// Data-quality counters gathered during one trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialDiagnostics {
    /// Records visited by the scan.
    pub scanned: usize,
    /// Records inside the bin.
    pub selected: usize,
    /// Non-finite derived quantities replaced by zero.
    pub non_finite: usize,
    /// Spins were generated from reconstructed kinematics for lack of true ones.
    pub reconstructed_injection: bool,
}

/// Outcome of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// Extracted amplitude.
    pub amplitude: f64,
    /// Standard error projected onto the expected luminosity.
    pub error: f64,
    /// Fit outcome.
    pub status: FitStatus,
    /// Selected and luminosity-scaled event counts.
    pub counts: BinCounts,
    /// Data-quality counters.
    pub diagnostics: TrialDiagnostics,
}

impl TrialResult {
    fn failed(status: FitStatus, counts: BinCounts, diagnostics: TrialDiagnostics) -> Self {
        let fit = FitResult::failed(status);
        Self {
            amplitude: fit.amplitude,
            error: fit.error,
            status: fit.status,
            counts,
            diagnostics,
        }
    }
}

/// Injects spin asymmetries into selected events and extracts them again.
#[derive(Debug, Clone, Copy)]
pub struct SpinInjector<'t> {
    table: &'t AsymmetryTable,
    target_polarization: f64,
    scale: f64,
}

impl<'t> SpinInjector<'t> {
    /// Creates an injector for a target polarization in `[0, 1]` and a
    /// non-negative luminosity scale.
    pub fn new(
        table: &'t AsymmetryTable,
        target_polarization: f64,
        scale: f64,
    ) -> Result<Self, TmdError> {
        if !(0.0..=1.0).contains(&target_polarization) {
            return Err(TmdError::Config(
                ErrorInfo::new("invalid-polarization", "target polarization must lie in [0, 1]")
                    .with_context("target_polarization", target_polarization.to_string()),
            ));
        }
        if !(scale.is_finite() && scale >= 0.0) {
            return Err(TmdError::Config(
                ErrorInfo::new("invalid-scale", "luminosity scale must be finite and non-negative")
                    .with_context("scale", scale.to_string()),
            ));
        }
        Ok(Self {
            table,
            target_polarization,
            scale,
        })
    }

    /// Target polarization.
    pub fn target_polarization(&self) -> f64 {
        self.target_polarization
    }

    /// Luminosity scale applied to event weights.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Runs one trial.
    ///
    /// Events are selected with the kinematics of `extraction`; spins are
    /// generated from true kinematics when the source carries them. The bin
    /// is only read; the selected counts are returned in the result.
    pub fn run_trial(
        &self,
        bin: &KinematicBin,
        source: &dyn EventSource,
        extraction: ExtractionMode,
        amplitude: AmplitudeMode,
        seed: u64,
    ) -> TrialResult {
        let span = tracing::debug_span!("trial", seed, extraction = ?extraction);
        let _guard = span.enter();
        let mut diagnostics = TrialDiagnostics::default();

        let columns = match EventColumns::resolve(source) {
            Ok(columns) => columns,
            Err(err) => {
                tracing::error!(error = %err, "event source invalid");
                return TrialResult::failed(FitStatus::SourceInvalid, BinCounts::default(), diagnostics);
            }
        };
        let selection_set = extraction.kinematic_set();
        let Some(selection) = columns.set(selection_set) else {
            tracing::error!("extraction with true kinematics requested but the source has none");
            return TrialResult::failed(FitStatus::SourceInvalid, BinCounts::default(), diagnostics);
        };
        let (injection_set, injection) = match columns.set(KinematicSet::True) {
            Some(truth) => (KinematicSet::True, truth),
            None => {
                tracing::warn!("source has no true kinematics, injecting with reconstructed ones");
                diagnostics.reconstructed_injection = true;
                (KinematicSet::Reconstructed, selection)
            }
        };

        let mut rng = RngHandle::from_seed(seed);
        let mut entries = Vec::new();
        let mut sum_w = 0.0;
        let mut sum_w2 = 0.0;
        let mut expected_events = 0.0;
        for i in 0..columns.len() {
            diagnostics.scanned += 1;
            let measured = selection.get(i);
            if !bin.contains(&measured.point()) {
                continue;
            }
            let truth = injection.get(i);
            let true_modulation = modulation(&truth, &mut diagnostics);
            let measured_modulation = if injection_set == selection_set {
                true_modulation
            } else {
                modulation(&measured, &mut diagnostics)
            };

            let injected = match amplitude {
                AmplitudeMode::Fixed(value) => value,
                AmplitudeMode::Table => self.table.lookup_point(&truth.point()),
            };
            let p_plus = 0.5 * (1.0 + true_modulation * injected);
            let mut spin = if rng.gen::<f64>() < p_plus { 1.0 } else { -1.0 };
            if rng.gen::<f64>() > self.target_polarization {
                spin = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            }

            let weight = finite_or_zero(columns.weight(i), "weight", &mut diagnostics);
            entries.push(FitEntry {
                coefficient: measured_modulation * self.target_polarization * spin,
                weight,
            });
            sum_w += weight;
            sum_w2 += weight * weight;
            expected_events += weight * self.scale;
        }
        diagnostics.selected = entries.len();
        let counts = BinCounts {
            events: entries.len() as u64,
            expected_events: expected_events.round().max(0.0) as u64,
        };

        let fit = fit_amplitude(&entries);
        if !fit.status.is_usable() {
            tracing::debug!(status = ?fit.status, selected = diagnostics.selected, "trial without estimate");
            return TrialResult::failed(fit.status, counts, diagnostics);
        }

        let n_eff = sum_w * sum_w / sum_w2;
        let error = if expected_events > 0.0 {
            fit.error * (n_eff / expected_events).sqrt()
        } else {
            tracing::warn!("no expected events, leaving the error unscaled");
            fit.error
        };
        tracing::debug!(
            amplitude = fit.amplitude,
            error,
            status = ?fit.status,
            selected = diagnostics.selected,
            "trial finished"
        );
        TrialResult {
            amplitude: fit.amplitude,
            error,
            status: fit.status,
            counts,
            diagnostics,
        }
    }
}

/// `S_T * depol * sin(phi_h + phi_s)` with non-finite factors zeroed.
fn modulation(kinematics: &Kinematics, diagnostics: &mut TrialDiagnostics) -> f64 {
    let s_t = finite_or_zero(
        spin_projection(kinematics.x, kinematics.q, kinematics.y, kinematics.phi_s),
        "spin_projection",
        diagnostics,
    );
    let depol = finite_or_zero(depolarization(kinematics.y), "depolarization", diagnostics);
    let sine = finite_or_zero(
        (kinematics.phi_h + kinematics.phi_s).sin(),
        "sin(phi_h + phi_s)",
        diagnostics,
    );
    s_t * depol * sine
}

fn finite_or_zero(value: f64, quantity: &'static str, diagnostics: &mut TrialDiagnostics) -> f64 {
    let (value, replaced) = sanitize(value);
    if replaced {
        diagnostics.non_finite += 1;
        tracing::warn!(quantity, "non-finite value replaced by zero");
    }
    value
}
