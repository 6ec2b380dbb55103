/// Column-oriented record stream consumed by injection trials.
///
/// Implementations expose named numeric columns of equal length. A source may
/// cap the number of records a scan visits with [`EventSource::max_records`].
pub trait EventSource: Send + Sync {
    /// Total number of records held by the source.
    fn num_records(&self) -> usize;

    /// Values of a named column, if present.
    fn column(&self, name: &str) -> Option<&[f64]>;

    /// Whether a named column is present.
    fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Upper bound on the records visited by one scan.
    fn max_records(&self) -> Option<usize> {
        None
    }

    /// Number of records a scan visits.
    fn scan_len(&self) -> usize {
        match self.max_records() {
            Some(limit) => limit.min(self.num_records()),
            None => self.num_records(),
        }
    }
}
