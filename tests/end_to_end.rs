use std::fs;

use tmd_batch::{BatchReport, InjectedAmplitude, InjectionJob, OrchestratorOpts, TrialOrchestrator};
use tmd_core::serde::from_yaml_slice;
use tmd_events::{generate_events, EventStore, GeneratorConfig, LuminosityScale};
use tmd_inject::FitStatus;
use tmd_table::AsymmetryTable;

const TABLE: &str = "\
itar,ihad,xmin,xmax,qmin,qmax,zmin,zmax,phmin,phmax,AUT
1,1,0.05,0.15,1.0,4.0,0.0,1.0,0.0,2.0,0.04
1,1,0.05,0.15,4.0,10.0,0.0,1.0,0.0,2.0,0.03
1,1,0.15,0.30,1.0,4.0,0.0,1.0,0.0,2.0,0.02
1,1,0.15,0.30,4.0,10.0,0.0,1.0,0.0,2.0,0.01
1,1,0.15,0.30,4.0,10.0,0.0,1.0
";

#[test]
fn files_to_report() {
    let dir = tempfile::tempdir().expect("temp dir");
    let table_path = dir.path().join("table.csv");
    fs::write(&table_path, TABLE).expect("write table");
    let events_path = dir.path().join("events.csv");
    generate_events(
        &GeneratorConfig {
            n_events: 4_000,
            weighted: true,
            ..GeneratorConfig::default()
        },
        21,
    )
    .expect("generate")
    .write_path(&events_path)
    .expect("write events");

    let (table, load) = AsymmetryTable::from_path(&table_path);
    assert_eq!(load.rows_read, 4);
    assert_eq!(load.skipped, 1);
    let grid = table.build_grid(&["X", "Q"]).expect("grid");
    assert_eq!(grid.len(), 4);
    let coordinates: Vec<String> = grid.iter().map(|entry| entry.coordinate.to_string()).collect();
    assert_eq!(coordinates, vec!["[0, 0]", "[0, 1]", "[1, 0]", "[1, 1]"]);

    let events = EventStore::from_path(&events_path)
        .expect("events")
        .with_max_records(Some(3_000));
    let scale = LuminosityScale {
        total_events: 4_000.0,
        xs_total: 1.0,
        expected_luminosity: 8_000.0,
    }
    .factor()
    .expect("scale");
    assert_eq!(scale, 2.0);

    let output = dir.path().join("report.yaml");
    let mut orchestrator = TrialOrchestrator::new(
        &grid,
        &table,
        &events,
        OrchestratorOpts {
            target_polarization: 0.7,
            scale,
            master_seed: 5,
            concurrency: 2,
            output: output.clone(),
            trial_csv: false,
        },
    )
    .expect("orchestrator");
    for bin_index in 0..=4 {
        orchestrator
            .add_job(InjectionJob {
                bin_index,
                n: 3,
                extract_with_true: bin_index % 2 == 0,
                a_opt: None,
            })
            .expect("job");
    }
    let report = orchestrator.run().expect("run");

    let written: BatchReport = from_yaml_slice(&fs::read(&output).expect("read")).expect("yaml");
    assert_eq!(written.jobs.len(), 4);
    assert_eq!(written.skipped.len(), 1);
    assert_eq!(written.provenance.luminosity_scale, 2.0);
    assert_eq!(written.provenance.seed, 5);
    assert!(!written.provenance.created_at.is_empty());
    for record in &report.jobs {
        assert_eq!(record.injected, InjectedAmplitude::Table);
        assert_eq!(record.trials.len(), 3);
        assert!(record.events > 0);
        assert!(record.events <= 3_000);
        assert!(record.trials.iter().all(|t| t.status != FitStatus::SourceInvalid));
        assert!(record.stddev >= 0.0);
    }
}
