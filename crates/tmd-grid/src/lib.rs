#![deny(missing_docs)]
#![doc = "Kinematic bins, the hierarchical bin indexer and the resulting read-only grid."]

mod bins;
mod grid;
mod indexer;
mod key;

pub use bins::{BinCounts, KinematicBin};
pub use grid::{Grid, GridEntry, GridSummary, GridSummaryEntry};
pub use indexer::BinIndexer;
pub use key::{BinCoordinate, RegionKey};
