use tmd_events::{
    generate_events, EventColumns, EventSource, EventStore, GeneratorConfig, KinematicSet, QSource,
};

fn column(name: &str, values: &[f64]) -> (String, Vec<f64>) {
    (name.to_string(), values.to_vec())
}

fn reconstructed_only(q_name: &str, q_values: &[f64]) -> EventStore {
    EventStore::from_columns(vec![
        column("X", &[0.1, 0.2]),
        column(q_name, q_values),
        column("Z", &[0.3, 0.4]),
        column("PhPerp", &[0.5, 0.6]),
        column("PhiH", &[0.0, 1.0]),
        column("PhiS", &[1.0, 0.0]),
        column("Y", &[0.5, 0.5]),
    ])
    .expect("store")
}

#[test]
fn q_squared_is_aliased_to_q() {
    let store = reconstructed_only("Q2", &[4.0, 9.0]);
    let columns = EventColumns::resolve(&store).expect("resolve");
    let caps = columns.capabilities();
    assert_eq!(caps.q, QSource::Squared);
    assert!(!caps.weight);
    assert_eq!(caps.true_kinematics, None);
    let reco = columns.set(KinematicSet::Reconstructed).expect("reco");
    assert_eq!(reco.get(1).q, 3.0);
    assert_eq!(columns.weight(0), 1.0);
    assert!(columns.set(KinematicSet::True).is_none());
}

#[test]
fn missing_reconstructed_column_is_an_error() {
    let store = EventStore::from_columns(vec![column("X", &[0.1])]).expect("store");
    let err = EventColumns::resolve(&store).unwrap_err();
    assert_eq!(err.info().code, "missing-column");
}

#[test]
fn generated_sample_carries_truth_and_weights() {
    let config = GeneratorConfig {
        n_events: 500,
        weighted: true,
        ..GeneratorConfig::default()
    };
    let store = generate_events(&config, 7).expect("generate");
    assert_eq!(store.num_records(), 500);
    let columns = EventColumns::resolve(&store).expect("resolve");
    let caps = columns.capabilities();
    assert!(caps.weight);
    assert_eq!(caps.true_kinematics, Some(QSource::Direct));
    let truth = columns.set(KinematicSet::True).expect("truth");
    for i in 0..store.len() {
        let event = truth.get(i);
        assert!(config.x.contains(event.x));
        assert!(config.y.contains(event.y));
        assert!((0.5..1.5).contains(&columns.weight(i)));
    }
    assert_eq!(generate_events(&config, 7).expect("generate"), store);
    assert_ne!(generate_events(&config, 8).expect("generate"), store);
}

#[test]
fn csv_file_preserves_columns() {
    let store = generate_events(
        &GeneratorConfig {
            n_events: 20,
            ..GeneratorConfig::default()
        },
        3,
    )
    .expect("generate");
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("events.csv");
    store.write_path(&path).expect("write");
    let loaded = EventStore::from_path(&path).expect("load").with_max_records(Some(5));
    assert_eq!(loaded.num_records(), 20);
    assert_eq!(loaded.scan_len(), 5);
    assert_eq!(loaded.column("TrueX"), store.column("TrueX"));
}
