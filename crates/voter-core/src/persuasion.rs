//! Persuasion Process
//!
//! One opinion-change event: draw an ordered pair of distinct individuals
//! and let the second try to persuade the first.
//!
//! Left and right never talk to each other directly. Centrists are the only
//! bridge, so the only effective pairs are those with a centrist on exactly
//! one side.

use tracing::trace;

use crate::error::SimResult;
use crate::population::{Category, PopulationState};
use crate::rng::RandomSource;
use crate::sampling;

/// Ordered pairs in enumeration order: persuaded (outer) then persuader (inner).
pub const PAIR_ORDER: [(Category, Category); 9] = [
    (Category::Left, Category::Left),
    (Category::Left, Category::Right),
    (Category::Left, Category::Center),
    (Category::Right, Category::Left),
    (Category::Right, Category::Right),
    (Category::Right, Category::Center),
    (Category::Center, Category::Left),
    (Category::Center, Category::Right),
    (Category::Center, Category::Center),
];

/// One individual changing opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: Category,
    pub to: Category,
}

/// Probabilities of the nine ordered pairs, in [`PAIR_ORDER`].
pub fn pair_distribution(state: &PopulationState) -> SimResult<[f64; 9]> {
    let mut distribution = [0.0; 9];
    for (slot, &(i, j)) in distribution.iter_mut().zip(PAIR_ORDER.iter()) {
        *slot = state.probability_of_pair(i, j)?;
    }
    Ok(distribution)
}

/// The pair selected by the uniform draw `value`.
///
/// The first pair in [`PAIR_ORDER`] whose cumulative probability reaches
/// `value` wins, even one of probability zero. Mass left unmatched by
/// rounding falls to (center, center), a no-op pair.
pub fn select_pair(state: &PopulationState, value: f64) -> SimResult<(Category, Category)> {
    Ok(pick_pair(&pair_distribution(state)?, value))
}

fn pick_pair(distribution: &[f64; 9], value: f64) -> (Category, Category) {
    let index = sampling::select_index(distribution, value).unwrap_or(PAIR_ORDER.len() - 1);
    PAIR_ORDER[index]
}

/// What happens when `persuader` talks to `persuaded`.
pub fn persuasion_rule(persuaded: Category, persuader: Category) -> Option<Transfer> {
    match (persuaded, persuader) {
        (Category::Left, Category::Center)
        | (Category::Right, Category::Center)
        | (Category::Center, Category::Left)
        | (Category::Center, Category::Right) => Some(Transfer {
            from: persuaded,
            to: persuader,
        }),
        _ => None,
    }
}

/// Runs one persuasion event, consuming exactly one uniform draw.
///
/// Fails with `PopulationTooSmall`, before drawing, if fewer than two
/// individuals exist.
pub fn persuade<R: RandomSource>(
    state: &mut PopulationState,
    rng: &mut R,
) -> SimResult<Option<Transfer>> {
    let distribution = pair_distribution(state)?;
    let (persuaded, persuader) = pick_pair(&distribution, rng.uniform());
    let transfer = match persuasion_rule(persuaded, persuader) {
        Some(t) if state.transfer(t.from, t.to) => Some(t),
        _ => None,
    };

    if let Some(t) = transfer {
        trace!(from = %t.from, to = %t.to, "persuasion");
    }
    Ok(transfer)
}
