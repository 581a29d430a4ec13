//! Sample data fixtures for testing.
//!
//! This module provides ready-made test data for other crates to use.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // voter-trace = { path = "../voter-trace", features = ["test-fixtures"] }
//!
//! use voter_trace::fixtures;
//!
//! let trajectory = fixtures::sample_trajectory();
//! ```

use crate::{NetworkSnapshot, Trajectory};

/// Returns a sample trajectory from the fixtures file.
///
/// Starts from (2, 3, 5), runs 10 steps and records every 5 steps.
pub fn sample_trajectory() -> Trajectory {
    let json = include_str!("../tests/fixtures/sample_trajectory.json");
    serde_json::from_str(json).expect("Failed to parse sample_trajectory.json")
}

/// Returns a sample network snapshot from the fixtures file.
///
/// Contains 3 nodes with 10, 6 and 4 individuals.
pub fn sample_network_snapshot() -> NetworkSnapshot {
    let json = include_str!("../tests/fixtures/sample_network.json");
    serde_json::from_str(json).expect("Failed to parse sample_network.json")
}
