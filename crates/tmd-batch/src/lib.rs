//! Batch execution of injection jobs.
//!
//! A [`TrialOrchestrator`] resolves each queued [`InjectionJob`] against a
//! grid, runs its trials with distinct derived seeds and writes one
//! [`BatchReport`] atomically.

mod job;
mod orchestrator;
pub mod report;
pub mod stats;

pub use job::InjectionJob;
pub use orchestrator::{trial_csv_path, OrchestratorOpts, TrialOrchestrator};
pub use report::{BatchReport, InjectedAmplitude, JobRecord, ReportFormat, SkippedJob, TrialRecord};
pub use stats::PullSummary;
