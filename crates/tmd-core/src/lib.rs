#![deny(missing_docs)]
#![doc = "Core types shared by the TMD binning and injection engine: errors, kinematic dimensions, seeding policy and provenance."]

pub mod dimension;
pub mod errors;
/// Stable hashing of serialisable payloads.
pub mod hash;
pub mod provenance;
pub mod rng;
pub mod serde;

pub use dimension::{parse_dimensions, Dimension, Edge, KinematicPoint, KinematicRanges, Range};
pub use errors::{ErrorInfo, TmdError};
pub use hash::stable_hash_string;
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, trial_seed, RngHandle};

/// Proton mass in GeV.
pub const PROTON_MASS: f64 = 0.938_272;
