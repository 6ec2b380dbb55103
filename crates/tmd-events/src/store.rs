use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};
use tmd_core::errors::{ErrorInfo, TmdError};

use crate::source::EventSource;

/// In-memory columnar event store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStore {
    n_records: usize,
    columns: BTreeMap<String, Vec<f64>>,
    max_records: Option<usize>,
}

fn events_error(code: &str, message: impl Into<String>) -> TmdError {
    TmdError::Events(ErrorInfo::new(code, message))
}

impl EventStore {
    /// Builds a store from named columns of equal length.
    pub fn from_columns(
        columns: impl IntoIterator<Item = (String, Vec<f64>)>,
    ) -> Result<Self, TmdError> {
        let mut by_name = BTreeMap::new();
        let mut n_records: Option<usize> = None;
        for (name, values) in columns {
            match n_records {
                Some(n) if n != values.len() => {
                    return Err(TmdError::Events(
                        ErrorInfo::new("column-length-mismatch", "columns differ in length")
                            .with_context("column", name.as_str())
                            .with_context("expected", n.to_string())
                            .with_context("found", values.len().to_string()),
                    ));
                }
                Some(_) => {}
                None => n_records = Some(values.len()),
            }
            if by_name.insert(name.clone(), values).is_some() {
                return Err(events_error(
                    "duplicate-column",
                    format!("column {name} given twice"),
                ));
            }
        }
        Ok(Self {
            n_records: n_records.unwrap_or(0),
            columns: by_name,
            max_records: None,
        })
    }

    /// Parses comma separated records whose header names the columns.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TmdError> {
        let mut csv = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);
        let headers = csv
            .headers()
            .map_err(|err| events_error("events-header", err.to_string()))?
            .clone();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        for (line, record) in csv.records().enumerate() {
            let record = record.map_err(|err| {
                TmdError::Events(
                    ErrorInfo::new("events-record", err.to_string())
                        .with_context("line", (line + 2).to_string()),
                )
            })?;
            for ((field, column), name) in record.iter().zip(columns.iter_mut()).zip(headers.iter()) {
                let value = field.parse::<f64>().map_err(|_| {
                    TmdError::Events(
                        ErrorInfo::new("non-numeric-field", format!("cannot parse {field:?}"))
                            .with_context("line", (line + 2).to_string())
                            .with_context("column", name),
                    )
                })?;
                column.push(value);
            }
        }
        Self::from_columns(headers.iter().map(str::to_string).zip(columns))
    }

    /// Loads a CSV event file.
    pub fn from_path(path: &Path) -> Result<Self, TmdError> {
        let file = File::open(path).map_err(|err| TmdError::io("events-open", path, err))?;
        let store = Self::from_reader(file).map_err(|err| match err {
            TmdError::Events(info) => {
                TmdError::Events(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })?;
        tracing::info!(
            path = %path.display(),
            records = store.n_records,
            columns = store.columns.len(),
            "loaded events"
        );
        Ok(store)
    }

    /// Caps the number of records a scan visits.
    pub fn with_max_records(mut self, max_records: Option<usize>) -> Self {
        self.max_records = max_records;
        self
    }

    /// Column names in sorted order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.n_records
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.n_records == 0
    }

    /// Writes the store as CSV with a header line.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), TmdError> {
        let mut csv = WriterBuilder::new().from_writer(writer);
        let write_err = |err: csv::Error| events_error("events-write", err.to_string());
        csv.write_record(self.columns.keys()).map_err(write_err)?;
        for i in 0..self.n_records {
            csv.write_record(self.columns.values().map(|values| values[i].to_string()))
                .map_err(write_err)?;
        }
        csv.flush()
            .map_err(|err| events_error("events-write", err.to_string()))
    }

    /// Writes the store as a CSV file.
    pub fn write_path(&self, path: &Path) -> Result<(), TmdError> {
        let file = File::create(path).map_err(|err| TmdError::io("events-create", path, err))?;
        self.to_writer(file).map_err(|err| match err {
            TmdError::Events(info) => {
                TmdError::io(&info.code, path, info.message)
            }
            other => other,
        })
    }
}

impl EventSource for EventStore {
    fn num_records(&self) -> usize {
        self.n_records
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    fn max_records(&self) -> Option<usize> {
        self.max_records
    }
}
