//! Snapshot Types
//!
//! Serialization structs for migration network state.
//!
//! A snapshot captures every node's counts at one step of a network run.

use serde::{Deserialize, Serialize};

use crate::DensityTriple;

/// One node of the network at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub node: usize,
    /// (left, right, center) counts
    pub counts: [u64; 3],
    pub densities: DensityTriple,
}

impl NodeSnapshot {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// All nodes of the network after `step` synchronous steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub step: u64,
    pub nodes: Vec<NodeSnapshot>,
}

impl NetworkSnapshot {
    /// Total population across every node
    pub fn total_population(&self) -> u64 {
        self.nodes.iter().map(NodeSnapshot::total).sum()
    }

    /// Population-weighted densities across the whole network
    pub fn aggregate_densities(&self) -> DensityTriple {
        let mut counts = [0u64; 3];
        for node in &self.nodes {
            for (sum, count) in counts.iter_mut().zip(node.counts) {
                *sum += count;
            }
        }
        let total = counts.iter().sum::<u64>();
        if total == 0 {
            return DensityTriple::default();
        }
        let total = total as f64;
        DensityTriple::new(
            counts[0] as f64 / total,
            counts[1] as f64 / total,
            counts[2] as f64 / total,
        )
    }
}

/// Sampled history of a network run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkTrace {
    pub run_id: String,
    pub steps: u64,
    pub modulus: u64,
    /// Adjacency lists by node index (edges are directed)
    pub neighbors: Vec<Vec<usize>>,
    pub snapshots: Vec<NetworkSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(index: usize, counts: [u64; 3]) -> NodeSnapshot {
        let total = counts.iter().sum::<u64>() as f64;
        NodeSnapshot {
            node: index,
            counts,
            densities: DensityTriple::new(
                counts[0] as f64 / total,
                counts[1] as f64 / total,
                counts[2] as f64 / total,
            ),
        }
    }

    #[test]
    fn test_total_population() {
        let snapshot = NetworkSnapshot {
            step: 0,
            nodes: vec![node(0, [1, 2, 3]), node(1, [4, 0, 0])],
        };
        assert_eq!(snapshot.total_population(), 10);
    }

    #[test]
    fn test_aggregate_densities_weight_by_population() {
        let snapshot = NetworkSnapshot {
            step: 3,
            nodes: vec![node(0, [1, 0, 1]), node(1, [0, 6, 2])],
        };
        let aggregate = snapshot.aggregate_densities();
        assert!((aggregate.left - 0.1).abs() < 1e-12);
        assert!((aggregate.right - 0.6).abs() < 1e-12);
        assert!((aggregate.center - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_of_empty_network() {
        let snapshot = NetworkSnapshot { step: 0, nodes: vec![] };
        assert_eq!(snapshot.aggregate_densities(), DensityTriple::default());
    }
}
