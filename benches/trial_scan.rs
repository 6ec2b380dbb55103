use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tmd_core::{KinematicRanges, Range};
use tmd_events::{generate_events, GeneratorConfig};
use tmd_grid::KinematicBin;
use tmd_inject::{AmplitudeMode, ExtractionMode, SpinInjector};
use tmd_table::AsymmetryTable;

fn bench_trial_scan(c: &mut Criterion) {
    let events = generate_events(
        &GeneratorConfig {
            n_events: 50_000,
            ..GeneratorConfig::default()
        },
        1,
    )
    .expect("events");
    let table = AsymmetryTable::default_table();
    let injector = SpinInjector::new(&table, 0.7, 1.0).expect("injector");
    let bin = KinematicBin::from_ranges(KinematicRanges::new(
        Range::new(0.1, 0.2),
        Range::new(1.0, 10.0),
        Range::new(0.0, 1.0),
        Range::new(0.0, 1.0),
    ));
    let mut seed = 0u64;
    c.bench_function("trial_scan_50k", |b| {
        b.iter(|| {
            seed += 1;
            black_box(injector.run_trial(
                &bin,
                &events,
                ExtractionMode::Reconstructed,
                AmplitudeMode::Table,
                seed,
            ))
        })
    });
}

criterion_group!(benches, bench_trial_scan);
criterion_main!(benches);
