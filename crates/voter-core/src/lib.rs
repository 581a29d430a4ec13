//! Constrained Voter Simulation Engine Library
//!
//! Three opinions (left, right, center) in one population or spread over a
//! network of populations. Left and right only ever change through the
//! center; births, deaths and migration add noise on top.

pub mod config;
pub mod demographics;
pub mod driver;
pub mod ensemble;
pub mod error;
pub mod network;
pub mod persuasion;
pub mod population;
pub mod rng;
pub mod sampling;

pub use config::{default_config_toml, Config, ConfigError};
pub use demographics::{BirthMode, DemographicEvents, DemographicMode};
pub use driver::{EquilibriumPolicy, RunOutcome, SimulationDriver, StepEvents};
pub use ensemble::{InitialCounts, WalkEnsemble};
pub use error::{SimError, SimResult};
pub use network::{MigrationNetwork, MigrationRule, NetworkConfig, Node, NodeId};
pub use persuasion::Transfer;
pub use population::{Category, PopulationState, DEFAULT_ITERATION_CAP};
pub use rng::{RandomSource, ScriptedRng, SimRng};
