//! Demographic Process
//!
//! Births and deaths weighted by density. With a rate below 1 the weights
//! sum to less than 1, and a draw landing past them means no event this
//! step: the rate is the per-step chance that anything happens at all.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::population::{Category, PopulationState};
use crate::rng::RandomSource;
use crate::sampling;

/// How births are realized each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BirthMode {
    /// No births
    #[default]
    None,
    /// At most one birth, with overall probability `birth_rate`
    Standard,
    /// Exactly one birth, split among categories by density
    Guaranteed,
    /// An independent chance per category; up to three births per step
    Multiple,
}

/// Which demographic processes run after each persuasion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DemographicMode {
    pub birth: BirthMode,
    pub death: bool,
}

impl DemographicMode {
    /// Persuasion only
    pub fn closed() -> Self {
        Self::default()
    }

    /// Standard birth when `birth_rate > 0`, death when `death_rate > 0`.
    ///
    /// Skipping a process with a zero rate also skips its draw.
    pub fn rate_gated(birth_rate: f64, death_rate: f64) -> Self {
        Self {
            birth: if birth_rate > 0.0 {
                BirthMode::Standard
            } else {
                BirthMode::None
            },
            death: death_rate > 0.0,
        }
    }

    /// Applies the configured births, then the death.
    pub fn apply<R: RandomSource>(
        &self,
        state: &mut PopulationState,
        rng: &mut R,
    ) -> DemographicEvents {
        let births = match self.birth {
            BirthMode::None => Vec::new(),
            BirthMode::Standard => birth(state, rng).into_iter().collect(),
            BirthMode::Guaranteed => birth_guaranteed(state, rng).into_iter().collect(),
            BirthMode::Multiple => birth_multiple(state, rng),
        };
        let death = if self.death { death(state, rng) } else { None };
        DemographicEvents { births, death }
    }
}

/// What one demographic pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemographicEvents {
    pub births: Vec<Category>,
    pub death: Option<Category>,
}

impl DemographicEvents {
    /// Net change in population size
    pub fn net_change(&self) -> i64 {
        self.births.len() as i64 - i64::from(self.death.is_some())
    }
}

/// `rate * density` for each category, in enumeration order.
pub fn rate_weights(state: &PopulationState, rate: f64) -> [f64; 3] {
    Category::ALL.map(|category| rate * state.density(category))
}

/// Standard birth: one draw, at most one new individual.
pub fn birth<R: RandomSource>(state: &mut PopulationState, rng: &mut R) -> Option<Category> {
    let value = rng.uniform();
    let rate = state.birth_rate();
    let weights = rate_weights(state, rate);
    let category = Category::from_index(sampling::select_within(&weights, value, rate)?)?;
    if !state.add(category) {
        return None;
    }
    trace!(category = %category, "birth");
    Some(category)
}

/// Standard death: one draw, at most one individual removed.
///
/// A draw that lands on an empty category removes nobody.
pub fn death<R: RandomSource>(state: &mut PopulationState, rng: &mut R) -> Option<Category> {
    let value = rng.uniform();
    let rate = state.death_rate();
    let weights = rate_weights(state, rate);
    let category = Category::from_index(sampling::select_within(&weights, value, rate)?)?;
    if !state.remove(category) {
        return None;
    }
    trace!(category = %category, "death");
    Some(category)
}

/// Guaranteed birth: one draw, exactly one new individual.
///
/// The birth weights are normalized to sum to 1, which leaves the densities
/// themselves. Residual mass, or an empty population, goes to center.
/// Returns `None` only when the population is already at `u64::MAX`.
pub fn birth_guaranteed<R: RandomSource>(
    state: &mut PopulationState,
    rng: &mut R,
) -> Option<Category> {
    let value = rng.uniform();
    let densities = state.densities().as_array();
    let category = sampling::normalize(&densities)
        .and_then(|weights| sampling::select_or_last(&weights, value))
        .and_then(Category::from_index)
        .unwrap_or(Category::Center);
    if !state.add(category) {
        return None;
    }
    trace!(category = %category, "guaranteed birth");
    Some(category)
}

/// Multiple births: three draws, one per category in enumeration order.
///
/// Each category gains one individual if its draw is at most
/// `birth_rate * density`, using the densities from before any of this
/// step's births.
pub fn birth_multiple<R: RandomSource>(state: &mut PopulationState, rng: &mut R) -> Vec<Category> {
    let weights = rate_weights(state, state.birth_rate());
    let draws = [rng.uniform(), rng.uniform(), rng.uniform()];

    let mut born = Vec::new();
    for category in Category::ALL {
        let index = category.index();
        if draws[index] <= weights[index] && state.add(category) {
            born.push(category);
        }
    }
    if !born.is_empty() {
        trace!(count = born.len(), "multiple births");
    }
    born
}
