//! Weighted one-parameter maximum-likelihood fit of the spin modulation.

use serde::{Deserialize, Serialize};

const MAX_ITERATIONS: usize = 200;
const TOLERANCE: f64 = 1e-12;
const BOUND_MARGIN: f64 = 1e-9;

/// Outcome of an amplitude fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStatus {
    /// Interior maximum found.
    Converged,
    /// Maximum lies on the edge of the feasible interval.
    AtBound,
    /// Root search did not converge or the sample carries no information.
    NotConverged,
    /// No event was selected.
    EmptySample,
    /// The event source could not be read.
    SourceInvalid,
}

impl FitStatus {
    /// Whether the fit produced a usable estimate.
    pub fn is_usable(&self) -> bool {
        matches!(self, FitStatus::Converged | FitStatus::AtBound)
    }
}

/// One selected event as seen by the likelihood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitEntry {
    /// Modulation coefficient `S_T * depol * P * spin * sin(phi_h + phi_s)`.
    pub coefficient: f64,
    /// Physical event weight.
    pub weight: f64,
}

/// Fitted amplitude and its standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Point estimate.
    pub amplitude: f64,
    /// Standard error from the observed information.
    pub error: f64,
    /// Fit outcome; unusable outcomes report `(0, 0)`.
    pub status: FitStatus,
    /// Root-search iterations used.
    pub iterations: usize,
}

impl FitResult {
    /// Degenerate `(0, 0)` result carrying a failure status.
    pub fn failed(status: FitStatus) -> Self {
        Self {
            amplitude: 0.0,
            error: 0.0,
            status,
            iterations: 0,
        }
    }
}

struct NormalisedSample {
    coefficients: Vec<f64>,
    weights: Vec<f64>,
}

impl NormalisedSample {
    /// Rescales weights so that they sum to the Kish effective sample size.
    fn new(entries: &[FitEntry]) -> Option<Self> {
        let (sum_w, sum_w2) = entries.iter().fold((0.0, 0.0), |(s, s2), entry| {
            (s + entry.weight, s2 + entry.weight * entry.weight)
        });
        if !(sum_w > 0.0 && sum_w2 > 0.0 && sum_w.is_finite() && sum_w2.is_finite()) {
            return None;
        }
        let norm = sum_w / sum_w2;
        Some(Self {
            coefficients: entries.iter().map(|entry| entry.coefficient).collect(),
            weights: entries.iter().map(|entry| entry.weight * norm).collect(),
        })
    }

    fn terms(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.coefficients.iter().copied().zip(self.weights.iter().copied())
    }

    fn score(&self, a: f64) -> f64 {
        self.terms().map(|(c, w)| w * c / (1.0 + c * a)).sum()
    }

    fn information(&self, a: f64) -> f64 {
        self.terms()
            .map(|(c, w)| {
                let d = 1.0 + c * a;
                w * c * c / (d * d)
            })
            .sum()
    }

    /// Part of `[-1, 1]` where every `1 + c A` stays positive.
    fn feasible_interval(&self) -> (f64, f64) {
        let mut lo = -1.0_f64;
        let mut hi = 1.0_f64;
        for &c in &self.coefficients {
            if c > 0.0 {
                lo = lo.max(-1.0 / c + BOUND_MARGIN);
            } else if c < 0.0 {
                hi = hi.min(-1.0 / c - BOUND_MARGIN);
            }
        }
        (lo, hi)
    }
}

/// Maximises `sum w ln(1 + c A)` over the feasible part of `[-1, 1]`.
///
/// The score is strictly decreasing in `A`, so the maximum is either its
/// unique root or an interval edge. The root is found by Newton steps that
/// fall back to bisection whenever they leave the current bracket.
pub fn fit_amplitude(entries: &[FitEntry]) -> FitResult {
    if entries.is_empty() {
        return FitResult::failed(FitStatus::EmptySample);
    }
    let Some(sample) = NormalisedSample::new(entries) else {
        return FitResult::failed(FitStatus::EmptySample);
    };
    if sample.information(0.0) <= 0.0 {
        return FitResult::failed(FitStatus::NotConverged);
    }
    let (lo, hi) = sample.feasible_interval();
    if lo > hi {
        return FitResult::failed(FitStatus::NotConverged);
    }

    let (amplitude, status, iterations) = if sample.score(lo) <= 0.0 {
        (lo, FitStatus::AtBound, 0)
    } else if sample.score(hi) >= 0.0 {
        (hi, FitStatus::AtBound, 0)
    } else {
        match find_root(&sample, lo, hi) {
            Some((root, iterations)) => (root, FitStatus::Converged, iterations),
            None => return FitResult::failed(FitStatus::NotConverged),
        }
    };

    let information = sample.information(amplitude);
    if !(information.is_finite() && information > 0.0) {
        return FitResult::failed(FitStatus::NotConverged);
    }
    FitResult {
        amplitude,
        error: 1.0 / information.sqrt(),
        status,
        iterations,
    }
}

fn find_root(sample: &NormalisedSample, mut lo: f64, mut hi: f64) -> Option<(f64, usize)> {
    let mut a = 0.0_f64.clamp(lo, hi);
    for iteration in 1..=MAX_ITERATIONS {
        let score = sample.score(a);
        if !score.is_finite() {
            return None;
        }
        if score == 0.0 {
            return Some((a, iteration));
        }
        if score > 0.0 {
            lo = a;
        } else {
            hi = a;
        }
        let newton = a + score / sample.information(a);
        let next = if newton.is_finite() && newton >= lo && newton <= hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
        if (next - a).abs() <= TOLERANCE * (1.0 + a.abs()) || hi - lo <= TOLERANCE {
            return Some((next, iteration));
        }
        a = next;
    }
    None
}
