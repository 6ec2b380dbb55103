use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tmd_batch::{InjectionJob, OrchestratorOpts};
use tmd_core::errors::{ErrorInfo, TmdError};
use tmd_events::LuminosityScale;
use tmd_table::{AsymmetryTable, EnergyConfig};

pub const DEFAULT_TABLES_DIR: &str = "tables";

/// YAML-configurable parameters of an injection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// CSV event file.
    #[serde(default)]
    pub events: Option<PathBuf>,
    /// Explicit amplitude table; wins over `energy`.
    #[serde(default)]
    pub table: Option<PathBuf>,
    /// Beam-energy identifier resolved under `tables_dir`.
    #[serde(default)]
    pub energy: Option<String>,
    #[serde(default = "default_tables_dir")]
    pub tables_dir: PathBuf,
    /// Main grid dimensions.
    #[serde(default = "default_grid")]
    pub grid: Vec<String>,
    #[serde(default = "default_target_polarization")]
    pub target_polarization: f64,
    /// Upper bound on scanned event records.
    #[serde(default)]
    pub max_entries: Option<usize>,
    #[serde(default)]
    pub luminosity: Option<LuminosityScale>,
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub jobs: Vec<JobSpec>,
}

fn default_tables_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TABLES_DIR)
}

fn default_grid() -> Vec<String> {
    vec!["X".to_string(), "Q".to_string()]
}

fn default_target_polarization() -> f64 {
    0.7
}

fn default_concurrency() -> usize {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            events: None,
            table: None,
            energy: None,
            tables_dir: default_tables_dir(),
            grid: default_grid(),
            target_polarization: default_target_polarization(),
            max_entries: None,
            luminosity: None,
            seed_policy: SeedPolicy::default(),
            concurrency: default_concurrency(),
            output: OutputConfig::default(),
            jobs: Vec::new(),
        }
    }
}

/// Master seed for every derived trial seed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    #[serde(default)]
    pub master_seed: u64,
}

/// Report destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// Also write per-job trial CSVs.
    #[serde(default)]
    pub trial_csv: bool,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("injection_report.yaml")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            trial_csv: false,
        }
    }
}

/// One job declaration: a single bin or an inclusive bin range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default)]
    pub bin_index: Option<usize>,
    #[serde(default)]
    pub bin_range: Option<[usize; 2]>,
    #[serde(default = "default_trials")]
    pub n: usize,
    #[serde(default)]
    pub extract_with_true: bool,
    #[serde(default)]
    pub a_opt: Option<f64>,
}

pub fn default_trials() -> usize {
    100
}

impl JobSpec {
    /// One job per bin of the declaration, for a grid of `n_bins` bins.
    ///
    /// A range is cut at the last bin of the grid; a range starting past
    /// the grid keeps only its first bin so the batch records it as skipped.
    pub fn expand(&self, n_bins: usize) -> Result<Vec<InjectionJob>, TmdError> {
        let bins = match (self.bin_index, self.bin_range) {
            (Some(index), None) => index..=index,
            (None, Some([start, end])) if start <= end => {
                let last = end.min(n_bins.saturating_sub(1).max(start));
                if last < end {
                    tracing::warn!(start, end, last, bins = n_bins, "bin range exceeds the grid, truncating");
                }
                start..=last
            }
            (None, Some([start, end])) => {
                return Err(TmdError::Config(
                    ErrorInfo::new("invalid-bin-range", "bin range start exceeds its end")
                        .with_context("start", start.to_string())
                        .with_context("end", end.to_string()),
                ))
            }
            _ => {
                return Err(TmdError::config(
                    "invalid-job",
                    "a job needs exactly one of bin_index or bin_range",
                ))
            }
        };
        Ok(bins
            .map(|bin_index| InjectionJob {
                bin_index,
                n: self.n,
                extract_with_true: self.extract_with_true,
                a_opt: self.a_opt,
            })
            .collect())
    }
}

impl RunConfig {
    /// Parses a YAML run configuration.
    pub fn load(path: &Path) -> Result<Self, TmdError> {
        let contents = fs::read(path).map_err(|err| TmdError::io("config-read", path, err))?;
        tmd_core::serde::from_yaml_slice(&contents)
    }

    /// Jobs of every declaration in order, for a grid of `n_bins` bins.
    pub fn expand_jobs(&self, n_bins: usize) -> Result<Vec<InjectionJob>, TmdError> {
        let mut jobs = Vec::new();
        for spec in &self.jobs {
            jobs.extend(spec.expand(n_bins)?);
        }
        Ok(jobs)
    }

    /// Luminosity weight scale; 1.0 without a luminosity section.
    pub fn scale(&self) -> Result<f64, TmdError> {
        LuminosityScale::factor_or_unit(self.luminosity.as_ref())
    }

    pub fn table(&self) -> Result<AsymmetryTable, TmdError> {
        load_table(self.table.as_deref(), self.energy.as_deref(), &self.tables_dir)
    }

    pub fn orchestrator_opts(&self) -> Result<OrchestratorOpts, TmdError> {
        Ok(OrchestratorOpts {
            target_polarization: self.target_polarization,
            scale: self.scale()?,
            master_seed: self.seed_policy.master_seed,
            concurrency: self.concurrency,
            output: self.output.path.clone(),
            trial_csv: self.output.trial_csv,
        })
    }
}

/// Explicit table path, else energy identifier, else the built-in table.
pub fn load_table(
    table: Option<&Path>,
    energy: Option<&str>,
    tables_dir: &Path,
) -> Result<AsymmetryTable, TmdError> {
    if let Some(path) = table {
        return Ok(AsymmetryTable::load(path));
    }
    let energy = match energy {
        Some(identifier) => identifier.parse::<EnergyConfig>()?,
        None => EnergyConfig::Default,
    };
    Ok(AsymmetryTable::for_energy(energy, tables_dir).0)
}
