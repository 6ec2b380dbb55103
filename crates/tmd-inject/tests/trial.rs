use tmd_core::{trial_seed, KinematicRanges, Range};
use tmd_events::{generate_events, EventStore, GeneratorConfig};
use tmd_grid::KinematicBin;
use tmd_inject::{AmplitudeMode, ExtractionMode, FitStatus, SpinInjector, TrialResult};
use tmd_table::{AsymmetryTable, AsymmetryTableRow};

fn sample(n_events: usize, seed: u64) -> EventStore {
    generate_events(
        &GeneratorConfig {
            n_events,
            ..GeneratorConfig::default()
        },
        seed,
    )
    .expect("generate")
}

fn everything() -> KinematicBin {
    let all = Range::new(-1.0e6, 1.0e6);
    KinematicBin::from_ranges(KinematicRanges::new(all, all, all, all))
}

fn run_many(
    injector: &SpinInjector<'_>,
    events: &EventStore,
    amplitude: AmplitudeMode,
    trials: usize,
) -> Vec<TrialResult> {
    let bin = everything();
    (0..trials)
        .map(|trial| {
            injector.run_trial(
                &bin,
                events,
                ExtractionMode::True,
                amplitude,
                trial_seed(11, 0, trial),
            )
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    values.iter().sum::<f64>() / values.len() as f64
}

#[test]
fn fixed_amplitude_is_recovered() {
    let table = AsymmetryTable::default_table();
    let injector = SpinInjector::new(&table, 1.0, 1.0).expect("injector");
    let events = sample(12_000, 1);
    let trials = 20;
    let results = run_many(&injector, &events, AmplitudeMode::Fixed(0.05), trials);
    assert!(results.iter().all(|r| r.status == FitStatus::Converged));
    assert!(results.iter().all(|r| r.counts.events == 12_000));
    let mean_amplitude = mean(results.iter().map(|r| r.amplitude));
    let mean_error = mean(results.iter().map(|r| r.error));
    let tolerance = 4.0 * mean_error / (trials as f64).sqrt();
    assert!(
        (mean_amplitude - 0.05).abs() < tolerance,
        "mean {mean_amplitude} tolerance {tolerance}"
    );
}

#[test]
fn table_amplitude_is_recovered() {
    let all = Range::new(-1.0e6, 1.0e6);
    let table = AsymmetryTable::from_rows(vec![AsymmetryTableRow {
        itar: 1,
        ihad: 1,
        ranges: KinematicRanges::new(all, all, all, all),
        amplitude: 0.08,
    }]);
    let injector = SpinInjector::new(&table, 1.0, 1.0).expect("injector");
    let events = sample(12_000, 2);
    let trials = 20;
    let results = run_many(&injector, &events, AmplitudeMode::Table, trials);
    let mean_amplitude = mean(results.iter().map(|r| r.amplitude));
    let mean_error = mean(results.iter().map(|r| r.error));
    assert!((mean_amplitude - 0.08).abs() < 4.0 * mean_error / (trials as f64).sqrt());
}

#[test]
fn default_table_scenario_covers_injected_value() {
    let table = AsymmetryTable::default_table();
    let grid = table.build_grid(&["X"]).expect("grid");
    assert_eq!(grid.len(), 1);
    let entry = grid.entry(0).expect("bin");
    assert_eq!(entry.coordinate.slots(), &[Some(0)]);

    let injector = SpinInjector::new(&table, 1.0, 1.0).expect("injector");
    let events = sample(10_000, 5);
    let seeds = 40;
    let mut within_one = 0;
    let mut within_two = 0;
    for trial in 0..seeds {
        let result = injector.run_trial(
            entry.bin,
            &events,
            ExtractionMode::True,
            AmplitudeMode::Fixed(0.1),
            trial_seed(99, 0, trial),
        );
        assert_eq!(result.status, FitStatus::Converged);
        let pull = ((result.amplitude - 0.1) / result.error).abs();
        within_one += usize::from(pull <= 1.0);
        within_two += usize::from(pull <= 2.0);
    }
    assert!(within_one >= 18, "{within_one} of {seeds} within 1 sigma");
    assert!(within_two >= 32, "{within_two} of {seeds} within 2 sigma");
}

#[test]
fn trials_are_reproducible_and_bin_is_untouched() {
    let table = AsymmetryTable::default_table();
    let injector = SpinInjector::new(&table, 0.7, 1.0).expect("injector");
    let events = sample(2_000, 3);
    let bin = everything();
    let before = bin.clone();
    let first = injector.run_trial(&bin, &events, ExtractionMode::Reconstructed, AmplitudeMode::Fixed(0.2), 42);
    let again = injector.run_trial(&bin, &events, ExtractionMode::Reconstructed, AmplitudeMode::Fixed(0.2), 42);
    let other = injector.run_trial(&bin, &events, ExtractionMode::Reconstructed, AmplitudeMode::Fixed(0.2), 43);
    assert_eq!(first, again);
    assert_ne!(first.amplitude, other.amplitude);
    assert_eq!(bin, before);
}

#[test]
fn luminosity_scale_shrinks_the_error() {
    let table = AsymmetryTable::default_table();
    let events = sample(3_000, 4);
    let bin = everything();
    let unit = SpinInjector::new(&table, 1.0, 1.0)
        .expect("injector")
        .run_trial(&bin, &events, ExtractionMode::True, AmplitudeMode::Fixed(0.1), 7);
    let scaled = SpinInjector::new(&table, 1.0, 4.0)
        .expect("injector")
        .run_trial(&bin, &events, ExtractionMode::True, AmplitudeMode::Fixed(0.1), 7);
    assert_eq!(unit.amplitude, scaled.amplitude);
    assert!((scaled.error - 0.5 * unit.error).abs() < 1e-12);
    assert_eq!(scaled.counts.events, 3_000);
    assert_eq!(scaled.counts.expected_events, 12_000);
}

#[test]
fn empty_selection_reports_status() {
    let table = AsymmetryTable::default_table();
    let injector = SpinInjector::new(&table, 1.0, 1.0).expect("injector");
    let events = sample(500, 6);
    let far = Range::new(50.0, 60.0);
    let bin = KinematicBin::from_ranges(KinematicRanges::new(far, far, far, far));
    let result = injector.run_trial(&bin, &events, ExtractionMode::True, AmplitudeMode::Fixed(0.1), 1);
    assert_eq!(result.status, FitStatus::EmptySample);
    assert_eq!((result.amplitude, result.error), (0.0, 0.0));
    assert_eq!(result.counts.events, 0);
    assert_eq!(result.diagnostics.scanned, 500);
}

#[test]
fn invalid_sources_report_status() {
    let table = AsymmetryTable::default_table();
    let injector = SpinInjector::new(&table, 1.0, 1.0).expect("injector");
    let broken = EventStore::from_columns(vec![("X".to_string(), vec![0.1])]).expect("store");
    let result = injector.run_trial(&everything(), &broken, ExtractionMode::Reconstructed, AmplitudeMode::Table, 1);
    assert_eq!(result.status, FitStatus::SourceInvalid);
    assert_eq!((result.amplitude, result.error), (0.0, 0.0));
}

fn reconstructed_only(q: f64) -> EventStore {
    let n = 200;
    let phi: Vec<f64> = (0..n).map(|i| -3.0 + 6.0 * i as f64 / n as f64).collect();
    EventStore::from_columns(vec![
        ("X".to_string(), vec![0.1; n]),
        ("Q".to_string(), vec![q; n]),
        ("Z".to_string(), vec![0.5; n]),
        ("PhPerp".to_string(), vec![0.3; n]),
        ("PhiH".to_string(), phi.clone()),
        ("PhiS".to_string(), phi.iter().map(|p| 0.5 * p).collect()),
        ("Y".to_string(), vec![0.5; n]),
    ])
    .expect("store")
}

#[test]
fn missing_truth_falls_back_for_injection_only() {
    let table = AsymmetryTable::default_table();
    let injector = SpinInjector::new(&table, 1.0, 1.0).expect("injector");
    let events = reconstructed_only(2.0);
    let with_true = injector.run_trial(&everything(), &events, ExtractionMode::True, AmplitudeMode::Fixed(0.1), 1);
    assert_eq!(with_true.status, FitStatus::SourceInvalid);
    let reco = injector.run_trial(&everything(), &events, ExtractionMode::Reconstructed, AmplitudeMode::Fixed(0.1), 1);
    assert!(reco.status.is_usable());
    assert!(reco.diagnostics.reconstructed_injection);
    assert_eq!(reco.diagnostics.non_finite, 0);
}

#[test]
fn non_finite_kinematics_are_zeroed_and_counted() {
    let table = AsymmetryTable::default_table();
    let injector = SpinInjector::new(&table, 1.0, 1.0).expect("injector");
    let events = reconstructed_only(0.0);
    let result = injector.run_trial(&everything(), &events, ExtractionMode::Reconstructed, AmplitudeMode::Fixed(0.1), 1);
    assert_eq!(result.diagnostics.non_finite, 200);
    assert_eq!(result.status, FitStatus::NotConverged);
    assert!(result.amplitude.is_finite() && result.error.is_finite());
}

#[test]
fn polarization_outside_unit_interval_is_rejected() {
    let table = AsymmetryTable::default_table();
    let err = SpinInjector::new(&table, 1.2, 1.0).unwrap_err();
    assert_eq!(err.info().code, "invalid-polarization");
    assert!(SpinInjector::new(&table, 0.5, f64::NAN).is_err());
}
