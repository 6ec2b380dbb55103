use proptest::prelude::*;
use tmd_core::{KinematicRanges, Range};
use tmd_table::{AsymmetryTable, AsymmetryTableRow};

fn row(x: (f64, f64), q: (f64, f64), amplitude: f64) -> AsymmetryTableRow {
    AsymmetryTableRow {
        itar: 1,
        ihad: 1,
        ranges: KinematicRanges::new(
            Range::new(x.0, x.1),
            Range::new(q.0, q.1),
            Range::new(0.0, 1.0),
            Range::new(0.0, 1.0),
        ),
        amplitude,
    }
}

fn two_cell_table() -> AsymmetryTable {
    AsymmetryTable::from_rows(vec![
        row((0.0, 0.1), (1.0, 2.0), 0.01),
        row((0.1, 0.2), (1.0, 2.0), 0.02),
        row((0.05, 0.15), (1.0, 2.0), 0.99),
    ])
}

#[test]
fn first_matching_row_wins() {
    let table = two_cell_table();
    assert_eq!(table.lookup_amplitude(0.06, 1.5, 0.5, 0.5), 0.01);
    // shared edge is inclusive on both rows
    assert_eq!(table.lookup_amplitude(0.1, 1.5, 0.5, 0.5), 0.01);
    assert_eq!(table.lookup_amplitude(0.16, 1.5, 0.5, 0.5), 0.02);
}

#[test]
fn outside_points_use_nearest_centroid() {
    let table = two_cell_table();
    assert_eq!(table.lookup_amplitude(0.3, 1.5, 0.5, 0.5), 0.02);
    assert_eq!(table.lookup_amplitude(-0.2, 1.5, 0.5, 0.5), 0.01);
}

#[test]
fn build_grid_rejects_bad_dimension_names() {
    let table = two_cell_table();
    let err = table.build_grid(&["X", "Y"]).unwrap_err();
    assert_eq!(err.info().code, "invalid-dimension");
    let err = table.build_grid(&["Q", "Q"]).unwrap_err();
    assert_eq!(err.info().code, "duplicate-dimension");
}

#[test]
fn default_row_builds_single_bin() {
    let table = AsymmetryTable::default_table();
    let grid = table.build_grid(&["X"]).expect("grid");
    assert_eq!(grid.len(), 1);
    let entry = grid.entry(0).expect("bin 0");
    assert_eq!(entry.coordinate.slots(), &[Some(0)]);
    assert_eq!(entry.bin.sub_cells(), 1);
}

#[test]
fn grid_from_rows_follows_table_layout() {
    let table = AsymmetryTable::from_rows(vec![
        row((0.0, 0.1), (1.0, 2.0), 0.0),
        row((0.0, 0.1), (2.0, 4.0), 0.0),
        row((0.1, 0.2), (1.0, 2.0), 0.0),
        row((0.1, 0.2), (2.0, 4.0), 0.0),
    ]);
    let grid = table.build_grid(&["X"]).expect("grid");
    assert_eq!(grid.len(), 2);
    assert_eq!(grid.bin(0).expect("bin").sub_cells(), 2);
    assert_eq!(grid.bin(0).expect("bin").max(tmd_core::Dimension::Q), 4.0);
}

proptest! {
    #[test]
    fn lookup_is_total(
        x in -1.0e6f64..1.0e6,
        q in -1.0e6f64..1.0e6,
        z in -1.0e6f64..1.0e6,
        ph in -1.0e6f64..1.0e6,
    ) {
        prop_assert!(two_cell_table().lookup_amplitude(x, q, z, ph).is_finite());
        prop_assert!(AsymmetryTable::default_table().lookup_amplitude(x, q, z, ph).is_finite());
    }
}
