use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tmd_core::errors::ErrorInfo;
use tmd_core::{
    parse_dimensions, stable_hash_string, Dimension, KinematicPoint, KinematicRanges, Range,
    TmdError,
};
use tmd_grid::{BinIndexer, Grid};

use crate::energy::EnergyConfig;
use crate::row::AsymmetryTableRow;

const FIELDS_PER_ROW: usize = 11;

/// Outcome of a table load: how many rows were accepted and skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLoadReport {
    /// Rows accepted into the table.
    pub rows_read: usize,
    /// Malformed rows skipped with a warning.
    pub skipped: usize,
    /// Whether the built-in default cell replaced an empty or unreadable source.
    pub fell_back: bool,
}

/// Ordered list of amplitude cells with total point lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsymmetryTable {
    rows: Vec<AsymmetryTableRow>,
}

impl AsymmetryTable {
    /// Table holding the single default cell spanning all kinematics.
    pub fn default_table() -> Self {
        Self {
            rows: vec![AsymmetryTableRow::default_cell()],
        }
    }

    /// Builds a table from rows; an empty list yields the default table.
    pub fn from_rows(rows: Vec<AsymmetryTableRow>) -> Self {
        if rows.is_empty() {
            Self::default_table()
        } else {
            Self { rows }
        }
    }

    /// Loads the table at `path`, never failing.
    pub fn load(path: &Path) -> Self {
        Self::from_path(path).0
    }

    /// Loads the table at `path` together with its load report.
    ///
    /// An unreadable file is a data-quality problem: it is logged and the
    /// default table is returned.
    pub fn from_path(path: &Path) -> (Self, TableLoadReport) {
        match File::open(path) {
            Ok(file) => {
                let (table, report) = Self::from_reader(file);
                tracing::info!(
                    path = %path.display(),
                    rows = report.rows_read,
                    skipped = report.skipped,
                    "loaded amplitude table"
                );
                (table, report)
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "amplitude table unreadable, using default cell"
                );
                (
                    Self::default_table(),
                    TableLoadReport {
                        fell_back: true,
                        ..TableLoadReport::default()
                    },
                )
            }
        }
    }

    /// Parses comma separated rows after a header line.
    pub fn from_reader<R: Read>(reader: R) -> (Self, TableLoadReport) {
        let mut csv = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let mut report = TableLoadReport::default();
        let mut rows = Vec::new();
        for (line, record) in csv.records().enumerate() {
            // header is line 1
            let line = line + 2;
            let parsed = record
                .map_err(|err| row_error("unreadable-row", err.to_string()))
                .and_then(|record| parse_row(&record));
            match parsed {
                Ok(row) => rows.push(row),
                Err(err) => {
                    report.skipped += 1;
                    tracing::warn!(line, error = %err, "skipping malformed table row");
                }
            }
        }
        report.rows_read = rows.len();
        if rows.is_empty() {
            tracing::warn!("amplitude table has no usable rows, using default cell");
            report.fell_back = true;
        }
        (Self::from_rows(rows), report)
    }

    /// Table for a beam-energy configuration, resolved under `tables_dir`.
    pub fn for_energy(energy: EnergyConfig, tables_dir: &Path) -> (Self, TableLoadReport) {
        match energy.table_path(tables_dir) {
            Some(path) => Self::from_path(&path),
            None => (Self::default_table(), TableLoadReport::default()),
        }
    }

    /// Rows in load order.
    pub fn rows(&self) -> &[AsymmetryTableRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false: a table holds at least the default cell.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Amplitude at a kinematic point.
    pub fn lookup_amplitude(&self, x: f64, q: f64, z: f64, ph_perp: f64) -> f64 {
        self.lookup_point(&KinematicPoint::new(x, q, z, ph_perp))
    }

    /// Amplitude of the first row containing `point`, else of the row with
    /// the nearest centroid.
    pub fn lookup_point(&self, point: &KinematicPoint) -> f64 {
        if let Some(row) = self.rows.iter().find(|row| row.contains(point)) {
            return row.amplitude;
        }
        self.rows
            .iter()
            .map(|row| (point.distance_squared(&row.centroid()), row.amplitude))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, amplitude)| amplitude)
            .unwrap_or(0.0)
    }

    /// Feeds every row into a fresh indexer keyed on `dimension_names`.
    pub fn build_grid<S: AsRef<str>>(&self, dimension_names: &[S]) -> Result<Grid, TmdError> {
        let main = parse_dimensions(dimension_names)?;
        let mut indexer = BinIndexer::new(main);
        for row in &self.rows {
            let ranges: BTreeMap<Dimension, Range> = Dimension::ALL
                .iter()
                .map(|dim| (*dim, row.ranges.get(*dim)))
                .collect();
            indexer.add_region(&ranges)?;
        }
        let grid = indexer.compute_indices();
        tracing::info!(bins = grid.len(), rows = self.rows.len(), "built grid from table");
        Ok(grid)
    }

    /// Stable SHA-256 of the table contents.
    pub fn table_hash(&self) -> Result<String, TmdError> {
        stable_hash_string(&self.rows)
    }
}

fn row_error(code: &str, message: String) -> TmdError {
    TmdError::Table(ErrorInfo::new(code, message))
}

fn parse_row(record: &StringRecord) -> Result<AsymmetryTableRow, TmdError> {
    let fields: Vec<&str> = record.iter().filter(|field| !field.is_empty()).collect();
    if fields.len() != FIELDS_PER_ROW {
        return Err(TmdError::Table(
            ErrorInfo::new(
                "field-count",
                format!("expected {FIELDS_PER_ROW} non-empty fields, found {}", fields.len()),
            )
            .with_hint("rows are itar,ihad, four min/max pairs and the amplitude"),
        ));
    }
    let itar = parse_int(fields[0])?;
    let ihad = parse_int(fields[1])?;
    let mut bounds = [0.0_f64; 8];
    for (slot, field) in bounds.iter_mut().zip(&fields[2..10]) {
        *slot = parse_float(field)?;
    }
    let amplitude = parse_float(fields[10])?;
    let range = |i: usize| -> Result<Range, TmdError> {
        let (min, max) = (bounds[2 * i], bounds[2 * i + 1]);
        if min > max {
            return Err(TmdError::Table(
                ErrorInfo::new("inverted-bounds", format!("inverted bounds [{min}, {max}]"))
                    .with_context("dimension", Dimension::ALL[i].as_str()),
            ));
        }
        Ok(Range::new(min, max))
    };
    Ok(AsymmetryTableRow {
        itar,
        ihad,
        ranges: KinematicRanges::new(range(0)?, range(1)?, range(2)?, range(3)?),
        amplitude,
    })
}

fn parse_int(field: &str) -> Result<i32, TmdError> {
    field
        .parse::<i32>()
        .map_err(|_| row_error("non-integer-tag", format!("non-integer tag {field:?}")))
}

fn parse_float(field: &str) -> Result<f64, TmdError> {
    match field.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(row_error("non-numeric-field", format!("non-numeric field {field:?}"))),
    }
}
