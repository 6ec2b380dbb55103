use serde::{Deserialize, Serialize};
use tmd_core::errors::{ErrorInfo, TmdError};

/// Scale from Monte Carlo statistics to an expected integrated luminosity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LuminosityScale {
    /// Number of generated events in the sample.
    pub total_events: f64,
    /// Total cross-section of the generated process.
    pub xs_total: f64,
    /// Integrated luminosity to project onto, in the inverse units of `xs_total`.
    pub expected_luminosity: f64,
}

impl LuminosityScale {
    /// Per-event weight factor `expected_luminosity / (total_events / xs_total)`.
    pub fn factor(&self) -> Result<f64, TmdError> {
        let valid = self.total_events.is_finite()
            && self.total_events > 0.0
            && self.xs_total.is_finite()
            && self.xs_total > 0.0
            && self.expected_luminosity.is_finite()
            && self.expected_luminosity >= 0.0;
        if !valid {
            return Err(TmdError::Config(
                ErrorInfo::new("invalid-luminosity", "luminosity inputs must be finite and positive")
                    .with_context("total_events", self.total_events.to_string())
                    .with_context("xs_total", self.xs_total.to_string())
                    .with_context("expected_luminosity", self.expected_luminosity.to_string()),
            ));
        }
        let generated_luminosity = self.total_events / self.xs_total;
        Ok(self.expected_luminosity / generated_luminosity)
    }

    /// Factor of an optional scale; 1.0 when absent.
    pub fn factor_or_unit(scale: Option<&LuminosityScale>) -> Result<f64, TmdError> {
        scale.map_or(Ok(1.0), LuminosityScale::factor)
    }
}
