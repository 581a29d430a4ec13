//! Migration Network
//!
//! Many populations linked by directed edges. Each synchronous step runs a
//! persuasion event in every node and then lets one individual consider
//! emigrating to a more attractive neighbor.
//!
//! Nodes live in an arena owned by the network and refer to each other by
//! [`NodeId`], so cycles, asymmetric edges and self-loops need no special
//! handling.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use voter_trace::{generate_run_id, NetworkSnapshot, NetworkTrace, NodeSnapshot};

use crate::error::{SimError, SimResult};
use crate::persuasion;
use crate::population::{Category, PopulationState, DEFAULT_ITERATION_CAP};
use crate::rng::RandomSource;
use crate::sampling;

/// Index of a node in its network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// How many individuals leave the source node per emigration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationRule {
    /// One individual leaves per attractive neighbor while only one arrives.
    /// Does not conserve population; kept for reproducing older runs.
    Faithful,
    /// Exactly one individual moves
    #[default]
    MassConserving,
}

/// One population in the network.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    population: PopulationState,
    neighbors: Vec<NodeId>,
    attractiveness: [f64; 3],
    emigration_resistance: f64,
}

impl Node {
    pub fn new(
        population: PopulationState,
        attractiveness: [f64; 3],
        emigration_resistance: f64,
    ) -> SimResult<Self> {
        if attractiveness.iter().any(|a| !a.is_finite() || *a < 0.0) {
            return Err(SimError::invalid(
                "attractiveness",
                "must be finite and non-negative",
            ));
        }
        if !emigration_resistance.is_finite() {
            return Err(SimError::invalid("emigration_resistance", "must be finite"));
        }
        Ok(Self {
            population,
            neighbors: Vec::new(),
            attractiveness,
            emigration_resistance,
        })
    }

    pub fn population(&self) -> &PopulationState {
        &self.population
    }

    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    pub fn attractiveness(&self, category: Category) -> f64 {
        self.attractiveness[category.index()]
    }

    pub fn emigration_resistance(&self) -> f64 {
        self.emigration_resistance
    }

    /// Attractiveness a neighbor must exceed to draw emigrants of `category`
    pub fn emigration_threshold(&self, category: Category) -> f64 {
        self.attractiveness(category) + self.emigration_resistance
    }
}

/// Parameters for generating a random network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Number of nodes
    pub size: usize,
    /// Most outgoing edges a node may get in a random topology
    pub max_connections: usize,
    pub min_population: u64,
    pub max_population: u64,
    /// Upper bound for per-node birth and death rates
    pub growth_bound: f64,
    /// Upper bound for per-category attractiveness
    pub attractiveness_bound: u64,
    /// Upper bound for per-node emigration resistance
    pub emigration_resistance_bound: u64,
    /// Connect every node to every other node
    pub complete_graph: bool,
    pub migration_rule: MigrationRule,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            size: 10,
            max_connections: 3,
            min_population: 10,
            max_population: 100,
            growth_bound: 0.01,
            attractiveness_bound: 100,
            emigration_resistance_bound: 100,
            complete_graph: false,
            migration_rule: MigrationRule::MassConserving,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> SimResult<()> {
        if self.size == 0 {
            return Err(SimError::invalid("size", "a network needs at least one node"));
        }
        if self.min_population == 0 {
            return Err(SimError::invalid("min_population", "must be positive"));
        }
        if self.max_population < self.min_population {
            return Err(SimError::invalid(
                "max_population",
                format!("{} is below min_population {}", self.max_population, self.min_population),
            ));
        }
        if !self.growth_bound.is_finite() || self.growth_bound < 0.0 {
            return Err(SimError::invalid("growth_bound", "must be finite and non-negative"));
        }
        Ok(())
    }
}

/// An individual that left one node for another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub category: Category,
    pub from: NodeId,
    pub to: NodeId,
    /// Individuals removed from the source (more than 1 only under `Faithful`)
    pub departed: u64,
}

/// A set of populations exchanging migrants over a fixed directed graph.
#[derive(Debug, Clone)]
pub struct MigrationNetwork {
    nodes: Vec<Node>,
    rule: MigrationRule,
}

impl MigrationNetwork {
    /// A network of unconnected nodes
    pub fn new(nodes: Vec<Node>, rule: MigrationRule) -> Self {
        Self { nodes, rule }
    }

    /// Random network following `config`.
    ///
    /// Draw order: every node's population, then every node's attractiveness
    /// and resistance, then every node's edges.
    pub fn generate<R: RandomSource>(config: &NetworkConfig, rng: &mut R) -> SimResult<Self> {
        config.validate()?;

        let mut populations = Vec::with_capacity(config.size);
        for _ in 0..config.size {
            populations.push(random_population(config, rng)?);
        }

        let mut nodes = Vec::with_capacity(config.size);
        for population in populations {
            let bound = config.attractiveness_bound;
            let attractiveness = [
                rng.uniform_int(0, bound) as f64,
                rng.uniform_int(0, bound) as f64,
                rng.uniform_int(0, bound) as f64,
            ];
            let resistance = rng.uniform_int(0, config.emigration_resistance_bound) as f64;
            nodes.push(Node::new(population, attractiveness, resistance)?);
        }

        let mut network = Self::new(nodes, config.migration_rule);
        let size = config.size;
        for index in 0..size {
            let neighbors: Vec<NodeId> = if config.complete_graph {
                (0..size).filter(|&j| j != index).map(NodeId).collect()
            } else {
                let most = config.max_connections.min(size - 1) as u64;
                let k = rng.uniform_int(0, most) as usize;
                rng.sample_without_replacement(size - 1, k)
                    .into_iter()
                    .map(|j| NodeId(if j >= index { j + 1 } else { j }))
                    .collect()
            };
            network.set_neighbors(NodeId(index), neighbors)?;
        }

        debug!(
            nodes = network.len(),
            edges = network.edge_count(),
            population = network.total_population(),
            "network generated"
        );
        Ok(network)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn rule(&self) -> MigrationRule {
        self.rule
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> SimResult<&Node> {
        self.nodes.get(id.0).ok_or(SimError::UnknownNode(id.0))
    }

    fn check(&self, id: NodeId) -> SimResult<()> {
        self.node(id).map(|_| ())
    }

    /// Adds a directed edge; emigrants from `from` may then move to `to`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> SimResult<()> {
        self.check(to)?;
        self.nodes
            .get_mut(from.0)
            .ok_or(SimError::UnknownNode(from.0))?
            .neighbors
            .push(to);
        Ok(())
    }

    /// Replaces the outgoing edges of `node`.
    pub fn set_neighbors(&mut self, node: NodeId, neighbors: Vec<NodeId>) -> SimResult<()> {
        for &neighbor in &neighbors {
            self.check(neighbor)?;
        }
        self.nodes
            .get_mut(node.0)
            .ok_or(SimError::UnknownNode(node.0))?
            .neighbors = neighbors;
        Ok(())
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.neighbors.len()).sum()
    }

    pub fn total_population(&self) -> u64 {
        self.nodes.iter().map(|n| n.population.total()).sum()
    }

    /// Neighbors of `id` whose attractiveness for `category` exceeds the
    /// node's own plus its emigration resistance, in adjacency order.
    pub fn attractive_neighbors(&self, id: NodeId, category: Category) -> SimResult<Vec<NodeId>> {
        let node = self.node(id)?;
        let threshold = node.emigration_threshold(category);
        let mut attractive = Vec::new();
        for &neighbor in &node.neighbors {
            if self.node(neighbor)?.attractiveness(category) > threshold {
                attractive.push(neighbor);
            }
        }
        Ok(attractive)
    }

    /// Lets one individual of node `id` consider emigrating.
    ///
    /// Draws a category by the node's densities, then, if any neighbor is
    /// attractive enough, draws the destination in proportion to the
    /// neighbors' attractiveness for that category. With no attractive
    /// neighbor nothing changes and no second draw is made.
    pub fn emigrate_one<R: RandomSource>(
        &mut self,
        id: NodeId,
        rng: &mut R,
    ) -> SimResult<Option<Migration>> {
        let node = self.node(id)?;
        if node.population.total() == 0 {
            return Ok(None);
        }

        let densities = node.population.densities().as_array();
        let category = sampling::select_or_last(&densities, rng.uniform())
            .and_then(Category::from_index)
            .unwrap_or(Category::Center);

        let attractive = self.attractive_neighbors(id, category)?;
        if attractive.is_empty() {
            return Ok(None);
        }

        let departed = match self.rule {
            MigrationRule::Faithful => {
                let population = &mut self.nodes[id.0].population;
                let mut departed = 0;
                for _ in &attractive {
                    if population.remove(category) {
                        departed += 1;
                    }
                }
                departed
            }
            MigrationRule::MassConserving => {
                if !self.nodes[id.0].population.remove(category) {
                    return Ok(None);
                }
                1
            }
        };

        let mut weights = Vec::with_capacity(attractive.len());
        for &neighbor in &attractive {
            weights.push(self.node(neighbor)?.attractiveness(category));
        }
        let value = rng.uniform();
        let choice = sampling::normalize(&weights)
            .and_then(|weights| sampling::select_or_last(&weights, value))
            .unwrap_or(weights.len() - 1);
        let destination = attractive[choice];
        if !self.nodes[destination.0].population.add(category) {
            warn!(to = destination.0, "destination at capacity, emigrant lost");
        }

        trace!(
            category = %category,
            from = id.0,
            to = destination.0,
            departed,
            "emigration"
        );
        Ok(Some(Migration {
            category,
            from: id,
            to: destination,
            departed,
        }))
    }

    /// One synchronous sweep: each node in index order gets a persuasion
    /// event (when it has at least two individuals) and an emigration attempt.
    pub fn step<R: RandomSource>(&mut self, rng: &mut R) -> SimResult<Vec<Migration>> {
        let mut migrations = Vec::new();
        for index in 0..self.nodes.len() {
            let population = &mut self.nodes[index].population;
            if population.total() >= 2 {
                persuasion::persuade(population, rng)?;
            }
            if let Some(migration) = self.emigrate_one(NodeId(index), rng)? {
                migrations.push(migration);
            }
        }
        Ok(migrations)
    }

    /// Counts and densities of every node
    pub fn snapshot(&self, step: u64) -> NetworkSnapshot {
        NetworkSnapshot {
            step,
            nodes: self
                .nodes
                .iter()
                .enumerate()
                .map(|(index, node)| NodeSnapshot {
                    node: index,
                    counts: node.population.counts(),
                    densities: node.population.densities(),
                })
                .collect(),
        }
    }

    /// Runs `steps` sweeps, snapshotting initially and after every
    /// `modulus`-th sweep.
    pub fn run<R: RandomSource>(
        &mut self,
        steps: u64,
        modulus: u64,
        rng: &mut R,
    ) -> SimResult<NetworkTrace> {
        if modulus == 0 {
            return Err(SimError::invalid("modulus", "must be positive"));
        }
        let mut snapshots = vec![self.snapshot(0)];
        let mut migrations = 0usize;
        for step in 1..=steps {
            migrations += self.step(rng)?.len();
            if step % modulus == 0 {
                snapshots.push(self.snapshot(step));
            }
        }
        debug!(steps, migrations, population = self.total_population(), "network run finished");

        Ok(NetworkTrace {
            run_id: generate_run_id(),
            steps,
            modulus,
            neighbors: self
                .nodes
                .iter()
                .map(|n| n.neighbors.iter().map(|id| id.0).collect())
                .collect(),
            snapshots,
        })
    }
}

/// Population of one generated node: size, then center and left densities,
/// then birth and death rates.
fn random_population<R: RandomSource>(
    config: &NetworkConfig,
    rng: &mut R,
) -> SimResult<PopulationState> {
    let size = rng.uniform_int(config.min_population, config.max_population);
    let center_density = rng.uniform();
    let left_density = rng.uniform() * (1.0 - center_density);

    let center = ((center_density * size as f64).floor() as u64).min(size);
    let left = ((left_density * size as f64).floor() as u64).min(size - center);
    let right = size - center - left;

    let birth_rate = rng.uniform() * config.growth_bound;
    let death_rate = rng.uniform() * config.growth_bound;
    PopulationState::new(left, right, center, birth_rate, death_rate, DEFAULT_ITERATION_CAP)
}
