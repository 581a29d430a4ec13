//! Shared trajectory and snapshot types for the constrained voter simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! They are what the engine hands to whatever renders or analyses a run.

pub mod density;
pub mod snapshot;
pub mod trajectory;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

pub use density::DensityTriple;

pub use trajectory::{generate_run_id, StopReason, StoppingTimeReport, Trajectory};

pub use snapshot::{NetworkSnapshot, NetworkTrace, NodeSnapshot};
