//! Configuration System
//!
//! Loads run parameters from a TOML file. Every field has a default, so a
//! file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::demographics::{BirthMode, DemographicMode};
use crate::driver::EquilibriumPolicy;
use crate::error::{SimError, SimResult};
use crate::network::NetworkConfig;
use crate::population::{PopulationState, DEFAULT_ITERATION_CAP};

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "voter.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub population: PopulationConfig,
    #[serde(default)]
    pub dynamics: DynamicsConfig,
    #[serde(default)]
    pub trajectory: TrajectoryConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub network_run: NetworkRunConfig,
}

/// Initial state and rates of a single population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub initial_left: u64,
    pub initial_right: u64,
    pub initial_center: u64,
    pub birth_rate: f64,
    pub death_rate: f64,
    pub iteration_cap: u64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_left: 30,
            initial_right: 30,
            initial_center: 30,
            birth_rate: 0.0,
            death_rate: 0.0,
            iteration_cap: DEFAULT_ITERATION_CAP,
        }
    }
}

impl PopulationConfig {
    pub fn build(&self) -> SimResult<PopulationState> {
        PopulationState::new(
            self.initial_left,
            self.initial_right,
            self.initial_center,
            self.birth_rate,
            self.death_rate,
            self.iteration_cap,
        )
    }

    /// Same rates and horizon, different initial counts
    pub fn build_with_counts(&self, counts: [u64; 3]) -> SimResult<PopulationState> {
        PopulationState::new(
            counts[0],
            counts[1],
            counts[2],
            self.birth_rate,
            self.death_rate,
            self.iteration_cap,
        )
    }
}

/// Equilibrium policy and demographic processes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    pub policy: EquilibriumPolicy,
    /// Birth process; unset means standard birth whenever `birth_rate > 0`
    pub birth: Option<BirthMode>,
    /// Death process; unset means death whenever `death_rate > 0`
    pub death: Option<bool>,
}

impl DynamicsConfig {
    pub fn demographic_mode(&self, population: &PopulationConfig) -> DemographicMode {
        let gated = DemographicMode::rate_gated(population.birth_rate, population.death_rate);
        DemographicMode {
            birth: self.birth.unwrap_or(gated.birth),
            death: self.death.unwrap_or(gated.death),
        }
    }
}

/// Sampled trajectories and walk ensembles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    pub iterations: u64,
    pub modulus: u64,
    /// Number of independent walks
    pub walks: usize,
    /// Draw each walk's initial counts instead of using `[population]`
    pub random_initial: bool,
    pub random_init_min: u64,
    pub random_init_max: u64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            modulus: 50,
            walks: 8,
            random_initial: true,
            random_init_min: 10,
            random_init_max: 100,
        }
    }
}

/// Length of a network run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkRunConfig {
    pub steps: u64,
    pub modulus: u64,
}

impl Default for NetworkRunConfig {
    fn default() -> Self {
        Self {
            steps: 10_000,
            modulus: 50,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// Values are checked per command, so a file may carry a section that
    /// only another command would reject.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_stop_time()?;
        self.validate_walk()?;
        self.validate_network()
    }

    /// `[population]` as a single run uses it
    pub fn validate_stop_time(&self) -> Result<(), ConfigError> {
        self.population.build()?;
        Ok(())
    }

    /// `[trajectory]`, plus the rates of `[population]`. The initial counts
    /// only matter when walks do not draw their own.
    pub fn validate_walk(&self) -> Result<(), ConfigError> {
        let trajectory = &self.trajectory;
        if trajectory.modulus == 0 {
            return Err(SimError::invalid("trajectory.modulus", "must be positive").into());
        }
        if !trajectory.random_initial {
            self.population.build()?;
            return Ok(());
        }
        if trajectory.random_init_min == 0 {
            return Err(SimError::invalid("trajectory.random_init_min", "must be positive").into());
        }
        if trajectory.random_init_max < trajectory.random_init_min {
            return Err(
                SimError::invalid("trajectory.random_init_max", "is below random_init_min").into(),
            );
        }
        self.population.build_with_counts([trajectory.random_init_min; 3])?;
        Ok(())
    }

    /// `[network]` and `[network_run]`
    pub fn validate_network(&self) -> Result<(), ConfigError> {
        self.network.validate()?;
        if self.network_run.modulus == 0 {
            return Err(SimError::invalid("network_run.modulus", "must be positive").into());
        }
        Ok(())
    }

    pub fn demographic_mode(&self) -> DemographicMode {
        self.dynamics.demographic_mode(&self.population)
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] SimError),
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Constrained Voter Configuration

[population]
initial_left = 30
initial_right = 30
initial_center = 30
birth_rate = 0.0
death_rate = 0.0
iteration_cap = 10000

[dynamics]
# "strict_consensus" or "net_growth_aware"
policy = "strict_consensus"
# Uncomment to override the rate-gated defaults
# birth = "standard"   # "none", "standard", "guaranteed", "multiple"
# death = true

[trajectory]
iterations = 10000
modulus = 50
walks = 8
random_initial = true
random_init_min = 10
random_init_max = 100

[network]
size = 10
max_connections = 3
min_population = 10
max_population = 100
growth_bound = 0.01
attractiveness_bound = 100
emigration_resistance_bound = 100
complete_graph = false
# "faithful" or "mass_conserving"
migration_rule = "mass_conserving"

[network_run]
steps = 10000
modulus = 50
"#
    .to_string()
}
