//! Density Types
//!
//! A single point of a trajectory: the share of each opinion in a population.

use serde::{Deserialize, Serialize};

/// Densities of the three opinions, in (left, right, center) order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DensityTriple {
    pub left: f64,
    pub right: f64,
    pub center: f64,
}

impl DensityTriple {
    pub fn new(left: f64, right: f64, center: f64) -> Self {
        Self { left, right, center }
    }

    /// Sum of the three densities (1.0 for any non-empty population)
    pub fn sum(&self) -> f64 {
        self.left + self.right + self.center
    }

    /// Densities as an array in enumeration order
    pub fn as_array(&self) -> [f64; 3] {
        [self.left, self.right, self.center]
    }
}

impl From<[f64; 3]> for DensityTriple {
    fn from(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }
}
