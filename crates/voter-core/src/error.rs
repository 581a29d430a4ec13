//! Simulation errors.

use thiserror::Error;

/// Errors raised by the simulation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Drawing two distinct individuals needs at least two of them
    #[error("pair probabilities are undefined for a population of {total}")]
    PopulationTooSmall { total: u64 },

    /// A construction parameter is out of range
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A node index outside the network
    #[error("node {0} does not exist")]
    UnknownNode(usize),
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
