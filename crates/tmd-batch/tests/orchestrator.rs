use std::fs;

use tmd_core::serde::{from_json_slice, from_yaml_slice};
use tmd_core::{KinematicRanges, Range};
use tmd_events::{generate_events, EventStore, GeneratorConfig};
use tmd_grid::Grid;
use tmd_inject::FitStatus;
use tmd_table::{AsymmetryTable, AsymmetryTableRow};
use tmd_batch::{
    trial_csv_path, BatchReport, InjectedAmplitude, InjectionJob, OrchestratorOpts,
    TrialOrchestrator,
};

fn table() -> AsymmetryTable {
    let wide = Range::new(0.0, 100.0);
    let cell = |lo: f64, hi: f64, amplitude: f64| AsymmetryTableRow {
        itar: 1,
        ihad: 1,
        ranges: KinematicRanges::new(Range::new(lo, hi), wide, wide, wide),
        amplitude,
    };
    AsymmetryTable::from_rows(vec![cell(0.0, 0.15, 0.05), cell(0.15, 0.5, -0.05)])
}

fn events() -> EventStore {
    generate_events(
        &GeneratorConfig {
            n_events: 3_000,
            ..GeneratorConfig::default()
        },
        17,
    )
    .expect("events")
}

fn opts(output: std::path::PathBuf) -> OrchestratorOpts {
    OrchestratorOpts {
        target_polarization: 0.7,
        master_seed: 2024,
        output,
        ..OrchestratorOpts::default()
    }
}

fn job(bin_index: usize, n: usize, a_opt: Option<f64>) -> InjectionJob {
    InjectionJob {
        bin_index,
        n,
        extract_with_true: false,
        a_opt,
    }
}

fn grid(table: &AsymmetryTable) -> Grid {
    table.build_grid(&["X"]).expect("grid")
}

#[test]
fn out_of_range_job_is_skipped_and_valid_job_is_written() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("report.yaml");
    let table = table();
    let grid = grid(&table);
    let events = events();
    let mut orchestrator =
        TrialOrchestrator::new(&grid, &table, &events, opts(output.clone())).expect("orchestrator");
    orchestrator.add_job(job(7, 3, Some(0.1))).expect("job");
    orchestrator.add_job(job(1, 4, Some(0.1))).expect("job");

    let report = orchestrator.run().expect("run succeeds");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].bin_index, 7);
    assert_eq!(report.jobs.len(), 1);

    let written: BatchReport = from_yaml_slice(&fs::read(&output).expect("report")).expect("yaml");
    assert_eq!(written.jobs.len(), 1);
    let record = &written.jobs[0];
    assert_eq!(record.job_index, 1);
    assert_eq!(record.bin_index, 1);
    assert_eq!(record.coordinate.slots(), &[Some(1)]);
    assert_eq!(record.n, 4);
    assert_eq!(record.trials.len(), 4);
    assert_eq!(record.injected, InjectedAmplitude::Value(0.1));
    assert!(record.events > 0);
    assert_eq!(record.expected_events, record.events);
    assert_eq!(record.bounds[0].min, 0.15);
    let pulls = record.pulls.expect("pull summary");
    assert_eq!(pulls.n_converged, 4);
    assert_eq!(written.provenance.seed, 2024);
    assert_eq!(written.provenance.table_hash, table.table_hash().expect("hash"));
}

#[test]
fn unwritable_output_fails_without_leaving_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("missing").join("report.yaml");
    let table = table();
    let grid = grid(&table);
    let events = events();
    let mut orchestrator =
        TrialOrchestrator::new(&grid, &table, &events, opts(output.clone())).expect("orchestrator");
    orchestrator.add_job(job(0, 2, None)).expect("job");
    let err = orchestrator.run().unwrap_err();
    assert_eq!(err.info().code, "output-write");
    assert!(!output.exists());
    assert_eq!(fs::read_dir(dir.path()).expect("dir").count(), 0);
}

#[test]
fn failed_report_write_removes_trial_csvs() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("report.yaml");
    // a directory at the report path makes the final rename fail
    fs::create_dir(&output).expect("blocking dir");
    let table = table();
    let grid = grid(&table);
    let events = events();
    let mut orchestrator = TrialOrchestrator::new(
        &grid,
        &table,
        &events,
        OrchestratorOpts {
            trial_csv: true,
            ..opts(output.clone())
        },
    )
    .expect("orchestrator");
    orchestrator.add_job(job(0, 2, Some(0.05))).expect("job");
    orchestrator.add_job(job(1, 2, None)).expect("job");

    let err = orchestrator.run().unwrap_err();
    assert_eq!(err.info().code, "output-write");
    assert!(output.is_dir());
    let mut left: Vec<String> = fs::read_dir(dir.path())
        .expect("dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    left.sort();
    assert_eq!(left, vec!["report.yaml".to_string()]);
}

#[test]
fn json_report_and_trial_csv() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("report.json");
    let table = table();
    let grid = grid(&table);
    let events = events();
    let mut orchestrator = TrialOrchestrator::new(
        &grid,
        &table,
        &events,
        OrchestratorOpts {
            trial_csv: true,
            ..opts(output.clone())
        },
    )
    .expect("orchestrator");
    orchestrator.add_job(job(0, 3, None)).expect("job");
    let report = orchestrator.run().expect("run");

    let written: BatchReport = from_json_slice(&fs::read(&output).expect("report")).expect("json");
    assert_eq!(written.jobs.len(), report.jobs.len());
    assert_eq!(written.jobs[0].trials.len(), 3);
    let record = &written.jobs[0];
    assert_eq!(record.injected, InjectedAmplitude::Table);
    assert!(record.pulls.is_none());

    let csv = fs::read_to_string(trial_csv_path(&output, record)).expect("trial csv");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "injected,extracted,err");
    assert!(lines[1].starts_with("table,"));
}

#[test]
fn results_do_not_depend_on_concurrency() {
    let dir = tempfile::tempdir().expect("temp dir");
    let table = table();
    let grid = grid(&table);
    let events = events();
    let run = |concurrency: usize, name: &str| {
        let mut orchestrator = TrialOrchestrator::new(
            &grid,
            &table,
            &events,
            OrchestratorOpts {
                concurrency,
                ..opts(dir.path().join(name))
            },
        )
        .expect("orchestrator");
        orchestrator.add_job(job(0, 6, Some(0.2))).expect("job");
        orchestrator.run().expect("run").jobs
    };
    let sequential = run(1, "seq.yaml");
    let parallel = run(4, "par.yaml");
    assert_eq!(sequential, parallel);
    let values: Vec<f64> = sequential[0].trials.iter().map(|t| t.value).collect();
    assert!(values.windows(2).any(|pair| pair[0] != pair[1]));
    assert!(sequential[0]
        .trials
        .iter()
        .all(|t| t.status == FitStatus::Converged || t.status == FitStatus::AtBound));
}

#[test]
fn invalid_jobs_and_options_are_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let table = table();
    let grid = grid(&table);
    let events = events();
    let mut orchestrator =
        TrialOrchestrator::new(&grid, &table, &events, opts(dir.path().join("r.yaml")))
            .expect("orchestrator");
    assert_eq!(
        orchestrator.add_job(job(0, 0, None)).unwrap_err().info().code,
        "zero-trials"
    );
    assert!(orchestrator.add_job(job(0, 1, Some(f64::NAN))).is_err());
    assert!(orchestrator.jobs().is_empty());

    let bad = OrchestratorOpts {
        target_polarization: -0.1,
        ..opts(dir.path().join("r.yaml"))
    };
    assert!(TrialOrchestrator::new(&grid, &table, &events, bad).is_err());
}
