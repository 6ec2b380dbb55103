use serde::{Deserialize, Serialize};
use tmd_core::errors::{ErrorInfo, TmdError};
use tmd_inject::{AmplitudeMode, ExtractionMode};

/// One declared batch of trials on one bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InjectionJob {
    /// Insertion position of the bin in the grid.
    pub bin_index: usize,
    /// Number of trials.
    pub n: usize,
    /// Select and fit with true kinematics.
    #[serde(default)]
    pub extract_with_true: bool,
    /// Fixed injected amplitude; table lookup when absent.
    #[serde(default)]
    pub a_opt: Option<f64>,
}

impl InjectionJob {
    /// Amplitude source of the job.
    pub fn amplitude_mode(&self) -> AmplitudeMode {
        self.a_opt.map_or(AmplitudeMode::Table, AmplitudeMode::Fixed)
    }

    /// Kinematics used for selection and fit.
    pub fn extraction_mode(&self) -> ExtractionMode {
        ExtractionMode::from_flag(self.extract_with_true)
    }

    pub(crate) fn validate(&self) -> Result<(), TmdError> {
        if self.n == 0 {
            return Err(TmdError::Config(
                ErrorInfo::new("zero-trials", "a job needs at least one trial")
                    .with_context("bin_index", self.bin_index.to_string()),
            ));
        }
        if let Some(value) = self.a_opt {
            if !value.is_finite() {
                return Err(TmdError::Config(
                    ErrorInfo::new("invalid-amplitude", "injected amplitude must be finite")
                        .with_context("bin_index", self.bin_index.to_string()),
                ));
            }
        }
        Ok(())
    }
}
