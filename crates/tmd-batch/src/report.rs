use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tmd_core::errors::{ErrorInfo, TmdError};
use tmd_core::provenance::RunProvenance;
use tmd_core::serde::{to_canonical_json_bytes, to_yaml_string};
use tmd_core::{Dimension, Range};
use tmd_grid::BinCoordinate;
use tmd_inject::FitStatus;

use crate::stats::PullSummary;

const TABLE_SENTINEL: &str = "table";

/// Injected amplitude as reported: a number, or `"table"` for per-event lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InjectedAmplitude {
    /// Fixed amplitude.
    Value(f64),
    /// Looked up per event from the amplitude table.
    Table,
}

impl Serialize for InjectedAmplitude {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InjectedAmplitude::Value(value) => serializer.serialize_f64(*value),
            InjectedAmplitude::Table => serializer.serialize_str(TABLE_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for InjectedAmplitude {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Value(f64),
            Label(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Value(value) => Ok(InjectedAmplitude::Value(value)),
            Repr::Label(label) if label == TABLE_SENTINEL => Ok(InjectedAmplitude::Table),
            Repr::Label(label) => Err(serde::de::Error::custom(format!(
                "expected a number or \"{TABLE_SENTINEL}\", found {label:?}"
            ))),
        }
    }
}

/// One raw trial in the report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Extracted amplitude.
    pub value: f64,
    /// Projected standard error.
    pub error: f64,
    /// Fit outcome; `(0, 0)` trials carry a failure status.
    pub status: FitStatus,
}

/// Extent of a bin along one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionBounds {
    /// Dimension.
    pub dimension: Dimension,
    /// Lower edge.
    pub min: f64,
    /// Upper edge.
    pub max: f64,
}

impl DimensionBounds {
    /// Bounds of `dimension` taken from a range.
    pub fn new(dimension: Dimension, range: Range) -> Self {
        Self {
            dimension,
            min: range.min,
            max: range.max,
        }
    }
}

/// Full record of one executed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Position of the job in the queue.
    pub job_index: usize,
    /// Insertion position of the bin.
    pub bin_index: usize,
    /// Canonical region key of the bin.
    pub key: String,
    /// Hierarchical coordinate of the bin.
    pub coordinate: BinCoordinate,
    /// Extents in every tracked dimension.
    pub bounds: Vec<DimensionBounds>,
    /// Events selected by the last trial.
    pub events: u64,
    /// Luminosity-scaled events of the last trial.
    pub expected_events: u64,
    /// Whether selection and fit used true kinematics.
    pub extract_with_true: bool,
    /// Number of trials.
    pub n: usize,
    /// Injected amplitude or the table sentinel.
    pub injected: InjectedAmplitude,
    /// Every trial in order.
    pub trials: Vec<TrialRecord>,
    /// Mean of the extracted amplitudes.
    pub mean: f64,
    /// Bessel-corrected standard deviation of the extracted amplitudes.
    pub stddev: f64,
    /// Pull summary when the injected amplitude is fixed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulls: Option<PullSummary>,
    /// Non-finite derived quantities replaced across all trials.
    pub non_finite: usize,
}

/// Job that was declared but not executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedJob {
    /// Position of the job in the queue.
    pub job_index: usize,
    /// Requested bin.
    pub bin_index: usize,
    /// Why the job was skipped.
    pub reason: String,
}

/// Report document written by a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Run provenance.
    pub provenance: RunProvenance,
    /// Executed jobs in queue order.
    pub jobs: Vec<JobRecord>,
    /// Skipped jobs in queue order.
    #[serde(default)]
    pub skipped: Vec<SkippedJob>,
}

/// Encoding of the report document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Canonical pretty JSON.
    Json,
    /// YAML.
    Yaml,
}

impl ReportFormat {
    /// JSON for a `.json` extension, YAML otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Yaml,
        }
    }
}

impl BatchReport {
    /// Encodes the report.
    pub fn to_bytes(&self, format: ReportFormat) -> Result<Vec<u8>, TmdError> {
        match format {
            ReportFormat::Json => to_canonical_json_bytes(self),
            ReportFormat::Yaml => to_yaml_string(self).map(String::into_bytes),
        }
    }

    /// Writes the report to `path`, encoding chosen by extension.
    pub fn write(&self, path: &Path) -> Result<(), TmdError> {
        let bytes = self.to_bytes(ReportFormat::from_path(path))?;
        write_atomic(path, &bytes)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

/// Writes `bytes` to a temporary sibling of `path` and renames it into place.
///
/// On failure the temporary file is removed and `path` is left untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TmdError> {
    let tmp = temp_sibling(path);
    let result = fs::File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));
    result.map_err(|err| {
        let _ = fs::remove_file(&tmp);
        TmdError::Io(
            ErrorInfo::new("output-write", err.to_string())
                .with_context("path", path.display().to_string())
                .with_hint("check that the output directory exists and is writable"),
        )
    })
}
