use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rayon::prelude::*;
use tmd_core::errors::{ErrorInfo, TmdError};
use tmd_core::provenance::RunProvenance;
use tmd_core::{trial_seed, Dimension};
use tmd_events::EventSource;
use tmd_grid::{Grid, GridEntry};
use tmd_inject::{AmplitudeMode, SpinInjector, TrialResult};
use tmd_table::AsymmetryTable;

use crate::job::InjectionJob;
use crate::report::{
    write_atomic, BatchReport, DimensionBounds, InjectedAmplitude, JobRecord, SkippedJob,
    TrialRecord,
};
use crate::stats::{mean, sample_std, PullSummary};

/// Options governing a batch run.
#[derive(Debug, Clone)]
pub struct OrchestratorOpts {
    /// Fraction of the target carrying the intended spin, in `[0, 1]`.
    pub target_polarization: f64,
    /// MC-to-luminosity weight scale.
    pub scale: f64,
    /// Master seed from which every trial seed is derived.
    pub master_seed: u64,
    /// Number of trials executed in parallel.
    pub concurrency: usize,
    /// Report destination; `.json` selects JSON, anything else YAML.
    pub output: PathBuf,
    /// Also write one `injected,extracted,err` CSV per job next to the report.
    pub trial_csv: bool,
}

impl Default for OrchestratorOpts {
    fn default() -> Self {
        Self {
            target_polarization: 0.7,
            scale: 1.0,
            master_seed: 0,
            concurrency: 1,
            output: PathBuf::from("injection_report.yaml"),
            trial_csv: false,
        }
    }
}

/// Runs queued injection jobs against one grid, table and event source.
pub struct TrialOrchestrator<'a> {
    grid: &'a Grid,
    table: &'a AsymmetryTable,
    source: &'a dyn EventSource,
    opts: OrchestratorOpts,
    jobs: Vec<InjectionJob>,
}

impl<'a> TrialOrchestrator<'a> {
    /// Creates an orchestrator after validating polarization and scale.
    pub fn new(
        grid: &'a Grid,
        table: &'a AsymmetryTable,
        source: &'a dyn EventSource,
        opts: OrchestratorOpts,
    ) -> Result<Self, TmdError> {
        SpinInjector::new(table, opts.target_polarization, opts.scale)?;
        Ok(Self {
            grid,
            table,
            source,
            opts,
            jobs: Vec::new(),
        })
    }

    /// Appends a job to the queue.
    pub fn add_job(&mut self, job: InjectionJob) -> Result<(), TmdError> {
        job.validate()?;
        self.jobs.push(job);
        Ok(())
    }

    /// Queued jobs.
    pub fn jobs(&self) -> &[InjectionJob] {
        &self.jobs
    }

    /// Executes every queued job in order and writes the report.
    ///
    /// Jobs naming a bin outside the grid, or a bin without a valid
    /// coordinate, are logged and skipped. The only error is an output that
    /// cannot be written, in which case neither the report nor any trial CSV
    /// is left behind.
    pub fn run(&self) -> Result<BatchReport, TmdError> {
        let span = tracing::info_span!(
            "batch",
            jobs = self.jobs.len(),
            seed = self.opts.master_seed
        );
        let _guard = span.enter();
        let injector = SpinInjector::new(self.table, self.opts.target_polarization, self.opts.scale)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.opts.concurrency.max(1))
            .build()
            .map_err(|err| TmdError::Config(ErrorInfo::new("thread-pool", err.to_string())))?;

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for (job_index, job) in self.jobs.iter().enumerate() {
            let Some(entry) = self.grid.entry(job.bin_index) else {
                tracing::warn!(
                    job_index,
                    bin_index = job.bin_index,
                    bins = self.grid.len(),
                    "bin index out of range, skipping job"
                );
                skipped.push(SkippedJob {
                    job_index,
                    bin_index: job.bin_index,
                    reason: format!("bin index out of range (grid has {} bins)", self.grid.len()),
                });
                continue;
            };
            if !entry.coordinate.is_indexable() {
                tracing::warn!(job_index, bin_index = job.bin_index, "bin has no valid coordinate, skipping job");
                skipped.push(SkippedJob {
                    job_index,
                    bin_index: job.bin_index,
                    reason: "bin has no valid coordinate".to_string(),
                });
                continue;
            }
            let trials = pool.install(|| self.run_job(&injector, &entry, job_index, job));
            records.push(self.record(job_index, job, &entry, &trials));
        }

        let report = BatchReport {
            provenance: self.provenance()?,
            jobs: records,
            skipped,
        };
        let mut written = Vec::new();
        if let Err(err) = self.write_outputs(&report, &mut written) {
            for path in &written {
                if let Err(remove_err) = fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), error = %remove_err, "could not remove trial csv");
                }
            }
            tracing::error!(error = %err, "batch output not written");
            return Err(err);
        }
        tracing::info!(
            path = %self.opts.output.display(),
            jobs = report.jobs.len(),
            skipped = report.skipped.len(),
            "wrote batch report"
        );
        Ok(report)
    }

    fn run_job(
        &self,
        injector: &SpinInjector<'_>,
        entry: &GridEntry<'_>,
        job_index: usize,
        job: &InjectionJob,
    ) -> Vec<TrialResult> {
        let span = tracing::info_span!("job", job_index, bin_index = job.bin_index, n = job.n);
        let _guard = span.enter();
        let extraction = job.extraction_mode();
        let amplitude = job.amplitude_mode();
        (0..job.n)
            .into_par_iter()
            .map(|trial| {
                injector.run_trial(
                    entry.bin,
                    self.source,
                    extraction,
                    amplitude,
                    trial_seed(self.opts.master_seed, job_index, trial),
                )
            })
            .collect()
    }

    fn record(
        &self,
        job_index: usize,
        job: &InjectionJob,
        entry: &GridEntry<'_>,
        trials: &[TrialResult],
    ) -> JobRecord {
        // last trial wins
        let mut bin = entry.bin.clone();
        if let Some(last) = trials.last() {
            bin.record_counts(last.counts);
        }
        let values: Vec<f64> = trials.iter().map(|t| t.amplitude).collect();
        let (injected, pulls) = match job.amplitude_mode() {
            AmplitudeMode::Fixed(value) => (
                InjectedAmplitude::Value(value),
                Some(PullSummary::from_trials(value, trials)),
            ),
            AmplitudeMode::Table => (InjectedAmplitude::Table, None),
        };
        let record = JobRecord {
            job_index,
            bin_index: job.bin_index,
            key: entry.key.to_string(),
            coordinate: entry.coordinate.clone(),
            bounds: Dimension::ALL
                .iter()
                .filter(|dim| bin.is_tracked(**dim))
                .map(|dim| DimensionBounds::new(*dim, bin.range(*dim)))
                .collect(),
            events: bin.counts().events,
            expected_events: bin.counts().expected_events,
            extract_with_true: job.extract_with_true,
            n: job.n,
            injected,
            trials: trials
                .iter()
                .map(|t| TrialRecord {
                    value: t.amplitude,
                    error: t.error,
                    status: t.status,
                })
                .collect(),
            mean: mean(&values),
            stddev: sample_std(&values),
            pulls,
            non_finite: trials.iter().map(|t| t.diagnostics.non_finite).sum(),
        };
        tracing::info!(
            job_index,
            bin_index = job.bin_index,
            mean = record.mean,
            stddev = record.stddev,
            events = record.events,
            "job finished"
        );
        record
    }

    fn provenance(&self) -> Result<RunProvenance, TmdError> {
        let mut tool_versions = BTreeMap::new();
        tool_versions.insert("tmd-batch".to_string(), env!("CARGO_PKG_VERSION").to_string());
        Ok(RunProvenance {
            table_hash: self.table.table_hash()?,
            seed: self.opts.master_seed,
            target_polarization: self.opts.target_polarization,
            luminosity_scale: self.opts.scale,
            created_at: Utc::now().to_rfc3339(),
            tool_versions,
            ..RunProvenance::default()
        })
    }

    /// Trial CSVs first, then the report; `written` collects the CSVs in place.
    fn write_outputs(&self, report: &BatchReport, written: &mut Vec<PathBuf>) -> Result<(), TmdError> {
        if self.opts.trial_csv {
            for record in &report.jobs {
                written.push(self.write_trial_csv(record)?);
            }
        }
        report.write(&self.opts.output)
    }

    fn write_trial_csv(&self, record: &JobRecord) -> Result<PathBuf, TmdError> {
        let path = trial_csv_path(&self.opts.output, record);
        let mut writer = csv::Writer::from_writer(Vec::new());
        let csv_err = |err: csv::Error| TmdError::Serde(ErrorInfo::new("trial-csv", err.to_string()));
        writer
            .write_record(["injected", "extracted", "err"])
            .map_err(csv_err)?;
        let injected = match record.injected {
            InjectedAmplitude::Value(value) => value.to_string(),
            InjectedAmplitude::Table => "table".to_string(),
        };
        for trial in &record.trials {
            writer
                .write_record([injected.clone(), trial.value.to_string(), trial.error.to_string()])
                .map_err(csv_err)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| TmdError::Serde(ErrorInfo::new("trial-csv", err.to_string())))?;
        write_atomic(&path, &bytes)?;
        Ok(path)
    }
}

/// `<stem>_job<J>_bin<B>.csv` next to the report.
pub fn trial_csv_path(output: &Path, record: &JobRecord) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "injection_report".to_string());
    output.with_file_name(format!(
        "{stem}_job{}_bin{}.csv",
        record.job_index, record.bin_index
    ))
}
