use serde::{Deserialize, Serialize};
use tmd_inject::TrialResult;

/// Sample mean of `values`; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bessel-corrected sample standard deviation; 0 when fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Pull summary of a fixed-amplitude injection study.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PullSummary {
    /// Mean pull `(A_hat - A) / sigma` over usable trials.
    pub pull_mean: f64,
    /// Standard deviation of the pulls; near 1 when errors are calibrated.
    pub pull_std: f64,
    /// Trials whose fit produced a usable estimate.
    pub n_converged: usize,
}

impl PullSummary {
    /// Pulls of the usable trials with a positive error.
    pub fn from_trials(injected: f64, trials: &[TrialResult]) -> Self {
        let usable: Vec<&TrialResult> = trials.iter().filter(|t| t.status.is_usable()).collect();
        let pulls: Vec<f64> = usable
            .iter()
            .filter(|t| t.error > 0.0)
            .map(|t| (t.amplitude - injected) / t.error)
            .collect();
        Self {
            pull_mean: mean(&pulls),
            pull_std: sample_std(&pulls),
            n_converged: usable.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bessel_corrected_std() {
        assert_eq!(sample_std(&[]), 0.0);
        assert_eq!(sample_std(&[3.0]), 0.0);
        assert!((sample_std(&[1.0, 2.0, 3.0, 4.0]) - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }
}
