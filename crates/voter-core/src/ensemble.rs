//! Walk Ensembles
//!
//! Many independent trajectories sharing rates and sampling parameters,
//! each from a fixed or randomly drawn starting point.

use tracing::debug;
use voter_trace::Trajectory;

use crate::config::{Config, PopulationConfig};
use crate::demographics::DemographicMode;
use crate::driver::{EquilibriumPolicy, SimulationDriver};
use crate::error::{SimError, SimResult};
use crate::population::Category;
use crate::rng::RandomSource;

/// Where each walk starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialCounts {
    Fixed([u64; 3]),
    /// Each category drawn independently from `min..=max`
    Uniform { min: u64, max: u64 },
}

impl InitialCounts {
    /// Draws a starting triple; a fixed triple consumes no randomness.
    pub fn draw<R: RandomSource>(&self, rng: &mut R) -> [u64; 3] {
        match *self {
            InitialCounts::Fixed(counts) => counts,
            InitialCounts::Uniform { min, max } => {
                Category::ALL.map(|_| rng.uniform_int(min, max))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalkEnsemble {
    pub walks: usize,
    pub iterations: u64,
    pub modulus: u64,
    pub initial: InitialCounts,
    /// Rates and iteration cap shared by every walk
    pub population: PopulationConfig,
    pub mode: DemographicMode,
}

impl WalkEnsemble {
    pub fn from_config(config: &Config) -> Self {
        let trajectory = &config.trajectory;
        let initial = if trajectory.random_initial {
            InitialCounts::Uniform {
                min: trajectory.random_init_min,
                max: trajectory.random_init_max,
            }
        } else {
            InitialCounts::Fixed([
                config.population.initial_left,
                config.population.initial_right,
                config.population.initial_center,
            ])
        };
        Self {
            walks: trajectory.walks,
            iterations: trajectory.iterations,
            modulus: trajectory.modulus,
            initial,
            population: config.population.clone(),
            mode: config.demographic_mode(),
        }
    }

    /// Runs every walk in turn from one random stream.
    ///
    /// Each walk draws its starting counts and then runs its full trajectory
    /// before the next walk begins. Walks always run every iteration, so no
    /// equilibrium policy applies.
    pub fn run<R: RandomSource>(&self, rng: &mut R) -> SimResult<Vec<Trajectory>> {
        if self.modulus == 0 {
            return Err(SimError::invalid("modulus", "must be positive"));
        }
        let mut trajectories = Vec::with_capacity(self.walks);
        for walk in 0..self.walks {
            let counts = self.initial.draw(rng);
            let state = self.population.build_with_counts(counts)?;
            let mut driver = SimulationDriver::new(state, EquilibriumPolicy::default(), self.mode);
            let trajectory = driver.record_trajectory(self.iterations, self.modulus, rng)?;
            debug!(walk, initial = ?counts, final_counts = ?trajectory.final_counts, "walk finished");
            trajectories.push(trajectory);
        }
        Ok(trajectories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedRng, SimRng};

    fn ensemble(initial: InitialCounts, walks: usize) -> WalkEnsemble {
        WalkEnsemble {
            walks,
            iterations: 100,
            modulus: 10,
            initial,
            population: PopulationConfig::default(),
            mode: DemographicMode::closed(),
        }
    }

    #[test]
    fn test_fixed_initial_draws_nothing() {
        let mut rng = ScriptedRng::new(vec![0.5]);
        assert_eq!(InitialCounts::Fixed([1, 2, 3]).draw(&mut rng), [1, 2, 3]);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_uniform_initial_stays_in_bounds() {
        let initial = InitialCounts::Uniform { min: 10, max: 100 };
        let mut rng = SimRng::seed_from_u64(8);
        for _ in 0..200 {
            let counts = initial.draw(&mut rng);
            assert!(counts.iter().all(|c| (10..=100).contains(c)));
        }
    }

    #[test]
    fn test_fixed_walks_share_start_and_shape() {
        let trajectories = ensemble(InitialCounts::Fixed([20, 20, 20]), 3)
            .run(&mut SimRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(trajectories.len(), 3);
        for trajectory in &trajectories {
            assert_eq!(trajectory.initial_counts, [20, 20, 20]);
            assert_eq!(trajectory.len(), 11);
            assert_eq!(trajectory.final_counts.iter().sum::<u64>(), 60);
        }
    }

    #[test]
    fn test_walks_have_distinct_run_ids() {
        let trajectories = ensemble(InitialCounts::Uniform { min: 10, max: 20 }, 4)
            .run(&mut SimRng::seed_from_u64(2))
            .unwrap();
        let mut ids: Vec<&str> = trajectories.iter().map(|t| t.run_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_same_seed_same_ensemble() {
        let walks = ensemble(InitialCounts::Uniform { min: 10, max: 100 }, 5);
        let first = walks.run(&mut SimRng::seed_from_u64(77)).unwrap();
        let second = walks.run(&mut SimRng::seed_from_u64(77)).unwrap();

        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.initial_counts, b.initial_counts);
            assert_eq!(a.points, b.points);
            assert_eq!(a.final_counts, b.final_counts);
        }
    }

    #[test]
    fn test_from_config_respects_random_initial_flag() {
        let mut config = Config::default();
        assert_eq!(
            WalkEnsemble::from_config(&config).initial,
            InitialCounts::Uniform { min: 10, max: 100 }
        );

        config.trajectory.random_initial = false;
        config.population.initial_left = 7;
        assert_eq!(
            WalkEnsemble::from_config(&config).initial,
            InitialCounts::Fixed([7, 30, 30])
        );
    }

    #[test]
    fn test_walk_from_consensus_runs_every_iteration() {
        let trajectories = ensemble(InitialCounts::Fixed([0, 0, 12]), 1)
            .run(&mut SimRng::seed_from_u64(4))
            .unwrap();
        assert_eq!(trajectories[0].len(), 11);
        assert!(trajectories[0].points.iter().all(|p| p.center == 1.0));
    }

    #[test]
    fn test_zero_modulus_rejected() {
        let mut walks = ensemble(InitialCounts::Fixed([5, 5, 5]), 1);
        walks.modulus = 0;
        assert!(walks.run(&mut SimRng::seed_from_u64(0)).is_err());
    }
}
