use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use tmd_batch::TrialOrchestrator;
use tmd_events::EventStore;

use crate::config::{default_trials, JobSpec, RunConfig};

#[derive(Args, Debug)]
pub struct InjectArgs {
    /// YAML run configuration; command-line flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// CSV event file.
    #[arg(long)]
    pub events: Option<PathBuf>,
    /// Amplitude table file.
    #[arg(long)]
    pub table: Option<PathBuf>,
    /// Beam-energy configuration selecting a bundled table.
    #[arg(long)]
    pub energy: Option<String>,
    /// Single bin to inject into.
    #[arg(long, conflicts_with_all = ["bin_index_start", "bin_index_end"])]
    pub bin_index: Option<usize>,
    /// First bin of an inclusive range.
    #[arg(long, requires = "bin_index_end")]
    pub bin_index_start: Option<usize>,
    /// Last bin of an inclusive range.
    #[arg(long, requires = "bin_index_start")]
    pub bin_index_end: Option<usize>,
    /// Trials per bin.
    #[arg(long)]
    pub n_injections: Option<usize>,
    /// Fixed injected amplitude; table lookup when absent.
    #[arg(long, allow_hyphen_values = true)]
    pub a_opt: Option<f64>,
    /// Select and fit with true kinematics.
    #[arg(long)]
    pub extract_with_true: bool,
    #[arg(long)]
    pub target_polarization: Option<f64>,
    /// Maximum number of event records to scan.
    #[arg(long)]
    pub max_entries: Option<usize>,
    /// Main grid dimensions, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub grid: Option<Vec<String>>,
    /// Report path; `.json` selects JSON, anything else YAML.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Master seed.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Trials executed in parallel.
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Write one trial CSV per job next to the report.
    #[arg(long)]
    pub trial_csv: bool,
}

impl InjectArgs {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(events) = &self.events {
            config.events = Some(events.clone());
        }
        if let Some(table) = &self.table {
            config.table = Some(table.clone());
        }
        if let Some(energy) = &self.energy {
            config.energy = Some(energy.clone());
        }
        if let Some(value) = self.target_polarization {
            config.target_polarization = value;
        }
        if self.max_entries.is_some() {
            config.max_entries = self.max_entries;
        }
        if let Some(grid) = &self.grid {
            config.grid = grid.clone();
        }
        if let Some(out) = &self.out {
            config.output.path = out.clone();
        }
        if let Some(seed) = self.seed {
            config.seed_policy.master_seed = seed;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if self.trial_csv {
            config.output.trial_csv = true;
        }

        let cli_bins = match (self.bin_index, self.bin_index_start, self.bin_index_end) {
            (Some(index), _, _) => Some((Some(index), None)),
            (None, Some(start), Some(end)) => Some((None, Some([start, end]))),
            _ => None,
        };
        if let Some((bin_index, bin_range)) = cli_bins {
            config.jobs = vec![JobSpec {
                bin_index,
                bin_range,
                n: self.n_injections.unwrap_or_else(default_trials),
                extract_with_true: self.extract_with_true,
                a_opt: self.a_opt,
            }];
        } else {
            for job in &mut config.jobs {
                if let Some(n) = self.n_injections {
                    job.n = n;
                }
                if self.a_opt.is_some() {
                    job.a_opt = self.a_opt;
                }
                if self.extract_with_true {
                    job.extract_with_true = true;
                }
            }
        }
    }
}

pub fn run(args: &InjectArgs) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    args.apply(&mut config);

    let events_path = config
        .events
        .clone()
        .ok_or("no event file given (use --events or `events:` in the config)")?;
    let events = EventStore::from_path(&events_path)?.with_max_records(config.max_entries);
    let table = config.table()?;
    let grid = table.build_grid(&config.grid)?;
    grid.log_summary(10);

    if let Some(parent) = config.output.path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut orchestrator =
        TrialOrchestrator::new(&grid, &table, &events, config.orchestrator_opts()?)?;
    for job in config.expand_jobs(grid.len())? {
        orchestrator.add_job(job)?;
    }
    if orchestrator.jobs().is_empty() {
        tracing::warn!("no jobs declared; the report will be empty");
    }
    let report = orchestrator.run()?;
    println!(
        "{} jobs written to {} ({} skipped)",
        report.jobs.len(),
        config.output.path.display(),
        report.skipped.len()
    );
    Ok(())
}
