pub mod generate;
pub mod grid;
pub mod inject;
pub mod lookup;

use std::path::{Path, PathBuf};

use clap::Args;
use tmd_core::TmdError;
use tmd_table::AsymmetryTable;

use crate::config::{load_table, DEFAULT_TABLES_DIR};

/// Table selection shared by the table-backed subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct TableArgs {
    /// Amplitude table file (header line plus 11 comma separated fields per row).
    #[arg(long)]
    pub table: Option<PathBuf>,
    /// Beam-energy configuration selecting a bundled table (default, 0x0, 5x41, 10x100, 18x275).
    #[arg(long)]
    pub energy: Option<String>,
    /// Directory holding the bundled tables.
    #[arg(long)]
    pub tables_dir: Option<PathBuf>,
}

impl TableArgs {
    /// Loads the selected table; an explicit path wins over an energy identifier.
    pub fn load(&self) -> Result<AsymmetryTable, TmdError> {
        load_table(
            self.table.as_deref(),
            self.energy.as_deref(),
            self.tables_dir
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_TABLES_DIR)),
        )
    }
}
