#![deny(missing_docs)]
#![doc = "Piecewise-constant amplitude tables: loading, total point lookup and grid construction."]

mod energy;
mod row;
mod table;

pub use energy::EnergyConfig;
pub use row::{AsymmetryTableRow, DEFAULT_CELL_EDGE};
pub use table::{AsymmetryTable, TableLoadReport};
