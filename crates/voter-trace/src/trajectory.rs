//! Trajectory Types
//!
//! Serialization structs for single-population runs: sampled density
//! trajectories and stopping-time reports.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DensityTriple;

/// Generates a unique run ID.
pub fn generate_run_id() -> String {
    format!("run_{}", uuid::Uuid::new_v4().simple())
}

/// Why a simulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No centrists remain (accepted as equilibrium by the active policy)
    CenterExtinct,
    /// One opinion holds the whole population
    Consensus,
    /// The step budget ran out before an equilibrium was reached
    IterationCap,
}

impl StopReason {
    /// True if the run ended in an equilibrium rather than running out of steps
    pub fn is_equilibrium(&self) -> bool {
        !matches!(self, StopReason::IterationCap)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopReason::CenterExtinct => "center_extinct",
            StopReason::Consensus => "consensus",
            StopReason::IterationCap => "iteration_cap",
        };
        write!(f, "{}", name)
    }
}

/// A sampled density trajectory of one population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub run_id: String,
    /// Initial (left, right, center) counts
    pub initial_counts: [u64; 3],
    pub birth_rate: f64,
    pub death_rate: f64,
    /// Number of steps simulated
    pub iterations: u64,
    /// A point is recorded every `modulus` steps
    pub modulus: u64,
    /// Recorded densities; the first entry is the initial state
    pub points: Vec<DensityTriple>,
    /// Counts after the last step
    pub final_counts: [u64; 3],
}

impl Trajectory {
    pub fn initial(&self) -> Option<&DensityTriple> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&DensityTriple> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Outcome of a run that stops at equilibrium or at a step cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoppingTimeReport {
    pub run_id: String,
    pub initial_counts: [u64; 3],
    pub steps: u64,
    pub reason: StopReason,
    pub final_counts: [u64; 3],
    pub final_densities: DensityTriple,
}
