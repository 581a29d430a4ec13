//! Constrained Voter Simulation
//!
//! Runs walk ensembles, stopping-time experiments and migration networks,
//! printing one JSON report per invocation to stdout. Logs go to stderr.

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info};

use voter_core::config::DEFAULT_CONFIG_PATH;
use voter_core::{
    default_config_toml, BirthMode, Config, ConfigError, EquilibriumPolicy, MigrationNetwork,
    MigrationRule, SimError, SimRng, SimulationDriver, WalkEnsemble,
};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "constrained_voter")]
#[command(about = "A three-opinion constrained voter model with demographic noise")]
struct Args {
    /// Configuration file (defaults to voter.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long, global = true, default_value_t = 42)]
    seed: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record density trajectories for an ensemble of walks
    Walk(WalkArgs),
    /// Run one population until equilibrium or the iteration cap
    StopTime(StopTimeArgs),
    /// Generate a random migration network and run it
    Network(NetworkArgs),
    /// Print the default configuration file
    DefaultConfig,
}

/// Overrides shared by the single-population commands
#[derive(ClapArgs, Debug, Default)]
struct PopulationArgs {
    #[arg(long)]
    left: Option<u64>,
    #[arg(long)]
    right: Option<u64>,
    #[arg(long)]
    center: Option<u64>,
    #[arg(long)]
    birth_rate: Option<f64>,
    #[arg(long)]
    death_rate: Option<f64>,
    #[arg(long, value_enum)]
    birth: Option<BirthArg>,
    /// Enable the death process regardless of the death rate
    #[arg(long)]
    death: bool,
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
}

#[derive(ClapArgs, Debug)]
struct WalkArgs {
    #[command(flatten)]
    population: PopulationArgs,
    /// Number of walks
    #[arg(long)]
    walks: Option<usize>,
    /// Steps per walk
    #[arg(long)]
    iterations: Option<u64>,
    /// Record densities every this many steps
    #[arg(long)]
    modulus: Option<u64>,
}

#[derive(ClapArgs, Debug)]
struct StopTimeArgs {
    #[command(flatten)]
    population: PopulationArgs,
    /// Step cap (defaults to the population's iteration cap)
    #[arg(long)]
    cap: Option<u64>,
}

#[derive(ClapArgs, Debug)]
struct NetworkArgs {
    /// Number of nodes
    #[arg(long)]
    size: Option<usize>,
    /// Sweeps over every node
    #[arg(long)]
    steps: Option<u64>,
    /// Snapshot every this many sweeps
    #[arg(long)]
    modulus: Option<u64>,
    /// Connect every node to every other node
    #[arg(long)]
    complete: bool,
    #[arg(long, value_enum)]
    migration: Option<MigrationArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BirthArg {
    None,
    Standard,
    Guaranteed,
    Multiple,
}

impl From<BirthArg> for BirthMode {
    fn from(arg: BirthArg) -> Self {
        match arg {
            BirthArg::None => BirthMode::None,
            BirthArg::Standard => BirthMode::Standard,
            BirthArg::Guaranteed => BirthMode::Guaranteed,
            BirthArg::Multiple => BirthMode::Multiple,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    StrictConsensus,
    NetGrowthAware,
}

impl From<PolicyArg> for EquilibriumPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::StrictConsensus => EquilibriumPolicy::StrictConsensus,
            PolicyArg::NetGrowthAware => EquilibriumPolicy::NetGrowthAware,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MigrationArg {
    Faithful,
    MassConserving,
}

impl From<MigrationArg> for MigrationRule {
    fn from(arg: MigrationArg) -> Self {
        match arg {
            MigrationArg::Faithful => MigrationRule::Faithful,
            MigrationArg::MassConserving => MigrationRule::MassConserving,
        }
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

impl PopulationArgs {
    fn apply(&self, config: &mut Config) {
        let population = &mut config.population;
        if let Some(left) = self.left {
            population.initial_left = left;
        }
        if let Some(right) = self.right {
            population.initial_right = right;
        }
        if let Some(center) = self.center {
            population.initial_center = center;
        }
        if let Some(rate) = self.birth_rate {
            population.birth_rate = rate;
        }
        if let Some(rate) = self.death_rate {
            population.death_rate = rate;
        }
        if let Some(birth) = self.birth {
            config.dynamics.birth = Some(birth.into());
        }
        if self.death {
            config.dynamics.death = Some(true);
        }
        if let Some(policy) = self.policy {
            config.dynamics.policy = policy.into();
        }
    }

    fn fixes_initial_counts(&self) -> bool {
        self.left.is_some() || self.right.is_some() || self.center.is_some()
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH),
        None => Ok(Config::default()),
    }
}

fn run(args: Args) -> Result<String, AppError> {
    if let Command::DefaultConfig = args.command {
        return Ok(default_config_toml());
    }

    let mut config = load_config(args.config.as_deref())?;
    let mut rng = SimRng::seed_from_u64(args.seed);
    info!(seed = args.seed, "starting");

    let report = match args.command {
        Command::Walk(walk) => {
            walk.population.apply(&mut config);
            if walk.population.fixes_initial_counts() {
                config.trajectory.random_initial = false;
            }
            if let Some(walks) = walk.walks {
                config.trajectory.walks = walks;
            }
            if let Some(iterations) = walk.iterations {
                config.trajectory.iterations = iterations;
            }
            if let Some(modulus) = walk.modulus {
                config.trajectory.modulus = modulus;
            }
            config.validate_walk()?;

            let trajectories = WalkEnsemble::from_config(&config).run(&mut rng)?;
            info!(walks = trajectories.len(), "walks recorded");
            serde_json::to_string_pretty(&trajectories)?
        }
        Command::StopTime(stop) => {
            stop.population.apply(&mut config);
            config.validate_stop_time()?;

            let state = config.population.build()?;
            let cap = stop.cap.unwrap_or(state.iteration_cap());
            let mut driver =
                SimulationDriver::new(state, config.dynamics.policy, config.demographic_mode());
            let report = driver.stopping_time(cap, &mut rng)?;
            info!(steps = report.steps, reason = %report.reason, "run stopped");
            serde_json::to_string_pretty(&report)?
        }
        Command::Network(network) => {
            if let Some(size) = network.size {
                config.network.size = size;
            }
            if let Some(steps) = network.steps {
                config.network_run.steps = steps;
            }
            if let Some(modulus) = network.modulus {
                config.network_run.modulus = modulus;
            }
            if network.complete {
                config.network.complete_graph = true;
            }
            if let Some(rule) = network.migration {
                config.network.migration_rule = rule.into();
            }
            config.validate_network()?;

            let mut graph = MigrationNetwork::generate(&config.network, &mut rng)?;
            info!(
                nodes = graph.len(),
                edges = graph.edge_count(),
                population = graph.total_population(),
                "network generated"
            );
            let trace = graph.run(config.network_run.steps, config.network_run.modulus, &mut rng)?;
            serde_json::to_string_pretty(&trace)?
        }
        Command::DefaultConfig => default_config_toml(),
    };
    Ok(report)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
