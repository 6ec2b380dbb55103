//! Provenance and schema descriptors attached to batch reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic version describing the schema of serialized payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes and documentation updates.
    pub patch: u32,
}

impl SchemaVersion {
    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Provenance information attached to every batch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Schema of the report document.
    pub schema_version: SchemaVersion,
    /// Stable hash of the amplitude table used for injection.
    pub table_hash: String,
    /// Master deterministic seed used for all randomness.
    pub seed: u64,
    /// Target polarisation applied during spin generation and fit.
    pub target_polarization: f64,
    /// MC-to-luminosity event weight scale.
    pub luminosity_scale: f64,
    /// ISO-8601 timestamp recording when the report was generated.
    pub created_at: String,
    /// Version map for the tools involved in the run.
    pub tool_versions: BTreeMap<String, String>,
}
