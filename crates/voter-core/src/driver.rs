//! Simulation Driver
//!
//! Runs one population step by step: a persuasion event, then whatever
//! demographic processes are configured. The equilibrium test runs before
//! every step.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use voter_trace::{generate_run_id, DensityTriple, StopReason, StoppingTimeReport, Trajectory};

use crate::demographics::{DemographicEvents, DemographicMode};
use crate::error::{SimError, SimResult};
use crate::persuasion::{self, Transfer};
use crate::population::{Category, PopulationState};
use crate::rng::RandomSource;

/// When a population counts as settled.
///
/// The two policies disagree about an empty center. Neither is canonical,
/// so the choice is left to configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquilibriumPolicy {
    /// Consensus, or no centrists left
    #[default]
    StrictConsensus,
    /// Consensus, or no centrists left while births and deaths balance
    NetGrowthAware,
}

impl EquilibriumPolicy {
    /// The stop reason if `state` is at equilibrium under this policy.
    pub fn check(&self, state: &PopulationState) -> Option<StopReason> {
        if state.consensus().is_some() {
            return Some(StopReason::Consensus);
        }
        if state.count(Category::Center) > 0 {
            return None;
        }
        match self {
            EquilibriumPolicy::StrictConsensus => Some(StopReason::CenterExtinct),
            EquilibriumPolicy::NetGrowthAware if state.birth_rate() == state.death_rate() => {
                Some(StopReason::CenterExtinct)
            }
            EquilibriumPolicy::NetGrowthAware => None,
        }
    }
}

/// Steps taken and why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub steps: u64,
    pub reason: StopReason,
}

/// What one step changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepEvents {
    pub persuasion: Option<Transfer>,
    pub demographics: DemographicEvents,
}

/// Drives a single population through persuasion and demographic noise.
#[derive(Debug, Clone)]
pub struct SimulationDriver {
    state: PopulationState,
    policy: EquilibriumPolicy,
    mode: DemographicMode,
}

impl SimulationDriver {
    pub fn new(state: PopulationState, policy: EquilibriumPolicy, mode: DemographicMode) -> Self {
        Self { state, policy, mode }
    }

    /// Persuasion only, strict equilibrium
    pub fn closed(state: PopulationState) -> Self {
        Self::new(state, EquilibriumPolicy::StrictConsensus, DemographicMode::closed())
    }

    pub fn state(&self) -> &PopulationState {
        &self.state
    }

    pub fn into_state(self) -> PopulationState {
        self.state
    }

    pub fn policy(&self) -> EquilibriumPolicy {
        self.policy
    }

    pub fn mode(&self) -> DemographicMode {
        self.mode
    }

    /// The stop reason if the population is currently at equilibrium
    pub fn status(&self) -> Option<StopReason> {
        self.policy.check(&self.state)
    }

    /// One persuasion event followed by the configured demographics.
    ///
    /// Persuasion is skipped (without a draw) while fewer than two
    /// individuals remain.
    pub fn step<R: RandomSource>(&mut self, rng: &mut R) -> SimResult<StepEvents> {
        let persuasion = if self.state.total() >= 2 {
            persuasion::persuade(&mut self.state, rng)?
        } else {
            debug!(total = self.state.total(), "population too small to persuade");
            None
        };
        let demographics = self.mode.apply(&mut self.state, rng);
        if self.state.total() == 0 {
            warn!("population died out");
        }
        Ok(StepEvents {
            persuasion,
            demographics,
        })
    }

    /// Runs until equilibrium, however long that takes.
    ///
    /// Only terminates when equilibrium is certain to be reached, which holds
    /// for a closed population under the strict policy.
    pub fn simulate<R: RandomSource>(&mut self, rng: &mut R) -> SimResult<RunOutcome> {
        self.run(None, rng)
    }

    /// Runs until equilibrium or until `cap` steps have been taken.
    pub fn simulate_bounded<R: RandomSource>(
        &mut self,
        cap: u64,
        rng: &mut R,
    ) -> SimResult<RunOutcome> {
        self.run(Some(cap), rng)
    }

    /// [`simulate_bounded`](Self::simulate_bounded) with the population's own horizon.
    pub fn simulate_capped<R: RandomSource>(&mut self, rng: &mut R) -> SimResult<RunOutcome> {
        let cap = self.state.iteration_cap();
        self.run(Some(cap), rng)
    }

    fn run<R: RandomSource>(&mut self, cap: Option<u64>, rng: &mut R) -> SimResult<RunOutcome> {
        debug!(counts = ?self.state.counts(), ?cap, policy = ?self.policy, "run started");
        let mut steps = 0u64;
        let reason = loop {
            if let Some(reason) = self.status() {
                break reason;
            }
            if cap.is_some_and(|cap| steps >= cap) {
                break StopReason::IterationCap;
            }
            self.step(rng)?;
            steps += 1;
        };
        debug!(steps, %reason, counts = ?self.state.counts(), "run stopped");
        Ok(RunOutcome { steps, reason })
    }

    /// Runs exactly `iterations` steps, ignoring equilibrium, and records the
    /// densities initially and after every `modulus`-th step.
    ///
    /// Returns `floor(iterations / modulus) + 1` points.
    pub fn trajectory<R: RandomSource>(
        &mut self,
        iterations: u64,
        modulus: u64,
        rng: &mut R,
    ) -> SimResult<Vec<DensityTriple>> {
        if modulus == 0 {
            return Err(SimError::invalid("modulus", "must be positive"));
        }
        let mut points = Vec::with_capacity((iterations / modulus) as usize + 1);
        points.push(self.state.densities());
        for step in 1..=iterations {
            self.step(rng)?;
            if step % modulus == 0 {
                points.push(self.state.densities());
            }
        }
        Ok(points)
    }

    /// [`trajectory`](Self::trajectory) packaged with its run metadata.
    pub fn record_trajectory<R: RandomSource>(
        &mut self,
        iterations: u64,
        modulus: u64,
        rng: &mut R,
    ) -> SimResult<Trajectory> {
        let initial_counts = self.state.counts();
        let points = self.trajectory(iterations, modulus, rng)?;
        Ok(Trajectory {
            run_id: generate_run_id(),
            initial_counts,
            birth_rate: self.state.birth_rate(),
            death_rate: self.state.death_rate(),
            iterations,
            modulus,
            points,
            final_counts: self.state.counts(),
        })
    }

    /// [`simulate_bounded`](Self::simulate_bounded) packaged as a report.
    pub fn stopping_time<R: RandomSource>(
        &mut self,
        cap: u64,
        rng: &mut R,
    ) -> SimResult<StoppingTimeReport> {
        let initial_counts = self.state.counts();
        let outcome = self.simulate_bounded(cap, rng)?;
        Ok(StoppingTimeReport {
            run_id: generate_run_id(),
            initial_counts,
            steps: outcome.steps,
            reason: outcome.reason,
            final_counts: self.state.counts(),
            final_densities: self.state.densities(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics::BirthMode;
    use crate::population::DEFAULT_ITERATION_CAP;
    use crate::rng::{ScriptedRng, SimRng};

    fn population(counts: [u64; 3], birth_rate: f64, death_rate: f64) -> PopulationState {
        PopulationState::new(
            counts[0],
            counts[1],
            counts[2],
            birth_rate,
            death_rate,
            DEFAULT_ITERATION_CAP,
        )
        .unwrap()
    }

    #[test]
    fn test_strict_policy() {
        let policy = EquilibriumPolicy::StrictConsensus;
        assert_eq!(policy.check(&population([5, 0, 0], 0.0, 0.0)), Some(StopReason::Consensus));
        assert_eq!(
            policy.check(&population([3, 4, 0], 0.1, 0.0)),
            Some(StopReason::CenterExtinct)
        );
        assert_eq!(policy.check(&population([3, 4, 1], 0.0, 0.0)), None);
    }

    #[test]
    fn test_net_growth_aware_policy() {
        let policy = EquilibriumPolicy::NetGrowthAware;
        assert_eq!(
            policy.check(&population([3, 4, 0], 0.1, 0.1)),
            Some(StopReason::CenterExtinct)
        );
        assert_eq!(policy.check(&population([3, 4, 0], 0.1, 0.0)), None);
        assert_eq!(policy.check(&population([0, 4, 0], 0.1, 0.0)), Some(StopReason::Consensus));
    }

    #[test]
    fn test_simulate_stops_immediately_on_consensus() {
        let mut driver = SimulationDriver::closed(population([5, 0, 0], 0.0, 0.0));
        let mut rng = ScriptedRng::new(vec![0.5]);
        let outcome = driver.simulate(&mut rng).unwrap();
        assert_eq!(outcome, RunOutcome { steps: 0, reason: StopReason::Consensus });
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_all_center_is_consensus_at_first_check() {
        let mut driver = SimulationDriver::closed(population([0, 0, 10], 0.0, 0.0));
        let mut rng = SimRng::seed_from_u64(1);
        let outcome = driver.simulate_bounded(100, &mut rng).unwrap();
        assert_eq!(outcome.reason, StopReason::Consensus);
        assert_eq!(outcome.steps, 0);
        assert_eq!(driver.state().center(), 10);
    }

    #[test]
    fn test_simulate_closed_population_reaches_equilibrium() {
        let mut driver = SimulationDriver::closed(population([10, 10, 10], 0.0, 0.0));
        let mut rng = SimRng::seed_from_u64(2024);
        let outcome = driver.simulate(&mut rng).unwrap();
        assert!(outcome.reason.is_equilibrium());
        assert!(outcome.steps > 0);
        assert_eq!(driver.state().total(), 30);
        assert!(driver.state().center() == 0 || driver.state().consensus().is_some());
    }

    #[test]
    fn test_simulate_bounded_hits_cap() {
        // A draw of 0.0 always selects (left, left), a no-op
        let mut driver = SimulationDriver::closed(population([10, 10, 10], 0.0, 0.0));
        let mut rng = ScriptedRng::new(vec![0.0]);
        let outcome = driver.simulate_bounded(25, &mut rng).unwrap();
        assert_eq!(outcome, RunOutcome { steps: 25, reason: StopReason::IterationCap });
        assert_eq!(driver.state().counts(), [10, 10, 10]);
    }

    #[test]
    fn test_simulate_capped_uses_population_horizon() {
        let state = PopulationState::new(10, 10, 10, 0.0, 0.0, 7).unwrap();
        let mut driver = SimulationDriver::closed(state);
        let mut rng = ScriptedRng::new(vec![0.0]);
        assert_eq!(driver.simulate_capped(&mut rng).unwrap().steps, 7);
    }

    #[test]
    fn test_trajectory_length_and_first_point() {
        let state = population([20, 20, 20], 0.0, 0.0);
        let initial = state.densities();
        let mut driver = SimulationDriver::closed(state);
        let mut rng = SimRng::seed_from_u64(8);
        let points = driver.trajectory(100, 7, &mut rng).unwrap();
        assert_eq!(points.len(), 100 / 7 + 1);
        assert_eq!(points[0], initial);
        for point in &points {
            assert!((point.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_trajectory_ignores_equilibrium() {
        let mut driver = SimulationDriver::closed(population([0, 0, 10], 0.0, 0.0));
        let mut rng = ScriptedRng::new(vec![0.3]);
        let points = driver.trajectory(10, 1, &mut rng).unwrap();
        assert_eq!(points.len(), 11);
        assert_eq!(rng.draws(), 10);
    }

    #[test]
    fn test_trajectory_rejects_zero_modulus() {
        let mut driver = SimulationDriver::closed(population([1, 1, 1], 0.0, 0.0));
        let mut rng = ScriptedRng::new(vec![0.3]);
        assert!(matches!(
            driver.trajectory(10, 0, &mut rng),
            Err(SimError::InvalidParameter { name: "modulus", .. })
        ));
    }

    #[test]
    fn test_step_order_persuasion_then_births() {
        let mode = DemographicMode { birth: BirthMode::Multiple, death: false };
        let mut driver = SimulationDriver::new(
            population([2, 3, 5], 1.0, 0.0),
            EquilibriumPolicy::StrictConsensus,
            mode,
        );
        // First draw selects (left, left): no-op. Then three birth draws.
        let mut rng = ScriptedRng::new(vec![0.0, 0.1, 0.9, 0.9]);
        let events = driver.step(&mut rng).unwrap();
        assert_eq!(events.persuasion, None);
        assert_eq!(events.demographics.births, vec![Category::Left]);
        assert_eq!(rng.draws(), 4);
        assert_eq!(driver.state().counts(), [3, 3, 5]);
    }

    #[test]
    fn test_step_skips_persuasion_for_single_individual() {
        let mode = DemographicMode { birth: BirthMode::Guaranteed, death: false };
        let mut driver = SimulationDriver::new(
            population([0, 0, 1], 0.5, 0.0),
            EquilibriumPolicy::StrictConsensus,
            mode,
        );
        let mut rng = ScriptedRng::new(vec![0.5]);
        let events = driver.step(&mut rng).unwrap();
        assert_eq!(events.persuasion, None);
        assert_eq!(events.demographics.births, vec![Category::Center]);
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn test_stopping_time_report() {
        let mut driver = SimulationDriver::closed(population([5, 0, 0], 0.0, 0.0));
        let mut rng = ScriptedRng::new(vec![0.5]);
        let report = driver.stopping_time(50, &mut rng).unwrap();
        assert_eq!(report.steps, 0);
        assert_eq!(report.reason, StopReason::Consensus);
        assert_eq!(report.final_counts, [5, 0, 0]);
        assert_eq!(report.final_densities.left, 1.0);
    }

    #[test]
    fn test_record_trajectory_metadata() {
        let mut driver = SimulationDriver::closed(population([3, 3, 3], 0.0, 0.0));
        let mut rng = SimRng::seed_from_u64(4);
        let trajectory = driver.record_trajectory(20, 5, &mut rng).unwrap();
        assert_eq!(trajectory.initial_counts, [3, 3, 3]);
        assert_eq!(trajectory.len(), 5);
        assert_eq!(trajectory.final_counts, driver.state().counts());
        assert_eq!(trajectory.final_counts.iter().sum::<u64>(), 9);
    }
}
