#![deny(missing_docs)]
#![doc = "Spin injection and amplitude extraction for one kinematic bin."]

pub mod fit;
pub mod injector;
pub mod kinematics;

pub use fit::{fit_amplitude, FitEntry, FitResult, FitStatus};
pub use injector::{AmplitudeMode, ExtractionMode, SpinInjector, TrialDiagnostics, TrialResult};
pub use kinematics::{depolarization, spin_angle, spin_projection, SpinAngle};
