//! Event-level inputs for injection trials.
//!
//! The engine reads events through the [`EventSource`] trait. Which optional
//! fields a source carries (weights, Q or Q², true kinematics) is negotiated
//! once per trial by [`EventColumns::resolve`].

pub mod columns;
mod generator;
mod luminosity;
mod source;
mod store;

pub use columns::{Capabilities, EventColumns, KinematicColumns, KinematicSet, Kinematics, QSource};
pub use generator::{generate_events, GeneratorConfig};
pub use luminosity::LuminosityScale;
pub use source::EventSource;
pub use store::EventStore;
