//! Population State
//!
//! Integer head counts for one three-opinion population, with the derived
//! densities kept in step with every mutation.

use std::fmt;

use voter_trace::DensityTriple;

use crate::error::{SimError, SimResult};

/// Default step horizon for capped runs.
pub const DEFAULT_ITERATION_CAP: u64 = 10_000;

/// One of the three opinions.
///
/// The discriminant is the enumeration order used by every sampling routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Left = 0,
    Right = 1,
    Center = 2,
}

impl Category {
    /// All categories in enumeration order
    pub const ALL: [Category; 3] = [Category::Left, Category::Right, Category::Center];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Category> {
        Category::ALL.get(index).copied()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Left => "left",
            Category::Right => "right",
            Category::Center => "center",
        };
        write!(f, "{}", name)
    }
}

/// Head counts and densities of a single population.
///
/// Counts only change through [`add`](Self::add), [`remove`](Self::remove)
/// and [`transfer`](Self::transfer), each of which recomputes the densities
/// before returning.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationState {
    counts: [u64; 3],
    densities: [f64; 3],
    birth_rate: f64,
    death_rate: f64,
    iteration_cap: u64,
}

impl PopulationState {
    pub fn new(
        left: u64,
        right: u64,
        center: u64,
        birth_rate: f64,
        death_rate: f64,
        iteration_cap: u64,
    ) -> SimResult<Self> {
        let total = left
            .checked_add(right)
            .and_then(|sum| sum.checked_add(center))
            .ok_or_else(|| SimError::invalid("initial counts", "total overflows u64"))?;
        if total == 0 {
            return Err(SimError::invalid(
                "initial counts",
                "at least one individual is required",
            ));
        }
        validate_rate("birth_rate", birth_rate)?;
        validate_rate("death_rate", death_rate)?;
        if iteration_cap == 0 {
            return Err(SimError::invalid("iteration_cap", "must be positive"));
        }

        let mut state = Self {
            counts: [left, right, center],
            densities: [0.0; 3],
            birth_rate,
            death_rate,
            iteration_cap,
        };
        state.recompute_densities();
        Ok(state)
    }

    /// A closed population (no births or deaths) with the default horizon
    pub fn from_counts(left: u64, right: u64, center: u64) -> SimResult<Self> {
        Self::new(left, right, center, 0.0, 0.0, DEFAULT_ITERATION_CAP)
    }

    pub fn left(&self) -> u64 {
        self.counts[Category::Left.index()]
    }

    pub fn right(&self) -> u64 {
        self.counts[Category::Right.index()]
    }

    pub fn center(&self) -> u64 {
        self.counts[Category::Center.index()]
    }

    pub fn count(&self, category: Category) -> u64 {
        self.counts[category.index()]
    }

    /// Counts in (left, right, center) order
    pub fn counts(&self) -> [u64; 3] {
        self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn density(&self, category: Category) -> f64 {
        self.densities[category.index()]
    }

    pub fn densities(&self) -> DensityTriple {
        DensityTriple::from(self.densities)
    }

    pub fn birth_rate(&self) -> f64 {
        self.birth_rate
    }

    pub fn death_rate(&self) -> f64 {
        self.death_rate
    }

    pub fn iteration_cap(&self) -> u64 {
        self.iteration_cap
    }

    /// Probability that an ordered draw of two distinct individuals, without
    /// replacement, yields one of category `i` followed by one of category `j`.
    ///
    /// Summed over all nine ordered pairs this is 1.
    pub fn probability_of_pair(&self, i: Category, j: Category) -> SimResult<f64> {
        let total = self.total();
        if total < 2 {
            return Err(SimError::PopulationTooSmall { total });
        }
        let n_i = self.count(i) as f64;
        let n_j = if i == j {
            self.count(j).saturating_sub(1) as f64
        } else {
            self.count(j) as f64
        };
        let total = total as f64;
        Ok(n_i * n_j / (total * (total - 1.0)))
    }

    /// The category holding the whole population, if any.
    ///
    /// An empty population counts as consensus on the first category.
    pub fn consensus(&self) -> Option<Category> {
        let total = self.total();
        Category::ALL
            .into_iter()
            .find(|&category| self.count(category) == total)
    }

    /// Adds one individual to `category`. Returns false (and changes
    /// nothing) if the total is already at `u64::MAX`.
    pub fn add(&mut self, category: Category) -> bool {
        if self.total() == u64::MAX {
            return false;
        }
        self.counts[category.index()] += 1;
        self.recompute_densities();
        true
    }

    /// Removes one individual from `category`. Returns false (and changes
    /// nothing) if the category is already empty.
    pub fn remove(&mut self, category: Category) -> bool {
        let count = &mut self.counts[category.index()];
        if *count == 0 {
            return false;
        }
        *count -= 1;
        self.recompute_densities();
        true
    }

    /// Moves one individual from `from` to `to`. Returns false if `from` is empty.
    pub fn transfer(&mut self, from: Category, to: Category) -> bool {
        if self.counts[from.index()] == 0 {
            return false;
        }
        self.counts[from.index()] -= 1;
        self.counts[to.index()] += 1;
        self.recompute_densities();
        true
    }

    fn recompute_densities(&mut self) {
        let total = self.total();
        if total == 0 {
            self.densities = [0.0; 3];
            return;
        }
        let total = total as f64;
        for (density, &count) in self.densities.iter_mut().zip(self.counts.iter()) {
            *density = count as f64 / total;
        }
    }
}

fn validate_rate(name: &'static str, rate: f64) -> SimResult<()> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(SimError::invalid(name, format!("{} is not a non-negative rate", rate)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(state: &PopulationState) {
        assert_eq!(state.left() + state.right() + state.center(), state.total());
        if state.total() > 0 {
            assert!((state.densities().sum() - 1.0).abs() < 1e-9);
        }
    }

    fn pair_sum(state: &PopulationState) -> f64 {
        let mut sum = 0.0;
        for i in Category::ALL {
            for j in Category::ALL {
                sum += state.probability_of_pair(i, j).unwrap();
            }
        }
        sum
    }

    #[test]
    fn test_new_computes_densities() {
        let state = PopulationState::from_counts(2, 3, 5).unwrap();
        assert_eq!(state.total(), 10);
        assert_eq!(state.density(Category::Left), 0.2);
        assert_eq!(state.density(Category::Right), 0.3);
        assert_eq!(state.density(Category::Center), 0.5);
    }

    #[test]
    fn test_new_rejects_bad_parameters() {
        assert!(matches!(
            PopulationState::from_counts(0, 0, 0),
            Err(SimError::InvalidParameter { .. })
        ));
        assert!(PopulationState::new(1, 1, 1, -0.1, 0.0, 10).is_err());
        assert!(PopulationState::new(1, 1, 1, 0.0, f64::NAN, 10).is_err());
        assert!(PopulationState::new(1, 1, 1, 0.0, 0.0, 0).is_err());
        // Rates above 1 are unusual but allowed
        assert!(PopulationState::new(1, 1, 1, 1.5, 0.0, 10).is_ok());
    }

    #[test]
    fn test_probability_of_pair_values() {
        let state = PopulationState::from_counts(2, 3, 5).unwrap();
        let lc = state.probability_of_pair(Category::Left, Category::Center).unwrap();
        assert!((lc - 10.0 / 90.0).abs() < 1e-12);
        let ll = state.probability_of_pair(Category::Left, Category::Left).unwrap();
        assert!((ll - 2.0 / 90.0).abs() < 1e-12);
        let cc = state.probability_of_pair(Category::Center, Category::Center).unwrap();
        assert!((cc - 20.0 / 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_pair_probabilities_sum_to_one() {
        for counts in [
            (2, 3, 5),
            (1, 1, 0),
            (0, 0, 2),
            (17, 1, 40),
            (100, 99, 1),
            (0, 7, 0),
            (33, 66, 99),
        ] {
            let state = PopulationState::from_counts(counts.0, counts.1, counts.2).unwrap();
            assert!((pair_sum(&state) - 1.0).abs() < 1e-9, "{:?}", counts);
        }
    }

    #[test]
    fn test_probability_of_pair_needs_two_individuals() {
        let state = PopulationState::from_counts(0, 0, 1).unwrap();
        assert_eq!(
            state.probability_of_pair(Category::Center, Category::Center),
            Err(SimError::PopulationTooSmall { total: 1 })
        );
    }

    #[test]
    fn test_empty_category_pair_is_zero() {
        let state = PopulationState::from_counts(0, 4, 4).unwrap();
        assert_eq!(state.probability_of_pair(Category::Left, Category::Left).unwrap(), 0.0);
        assert_eq!(state.probability_of_pair(Category::Left, Category::Right).unwrap(), 0.0);
    }

    #[test]
    fn test_add_and_remove_keep_invariants() {
        let mut state = PopulationState::from_counts(1, 0, 2).unwrap();
        state.add(Category::Right);
        assert_eq!(state.counts(), [1, 1, 2]);
        assert_consistent(&state);

        assert!(state.remove(Category::Left));
        assert_eq!(state.counts(), [0, 1, 2]);
        assert_consistent(&state);
        assert_eq!(state.density(Category::Center), 2.0 / 3.0);
    }

    #[test]
    fn test_new_rejects_overflowing_total() {
        assert!(matches!(
            PopulationState::from_counts(u64::MAX, 1, 0),
            Err(SimError::InvalidParameter { name: "initial counts", .. })
        ));
        assert!(PopulationState::from_counts(u64::MAX - 2, 1, 1).is_ok());
    }

    #[test]
    fn test_add_at_capacity_is_noop() {
        let mut state = PopulationState::from_counts(u64::MAX - 1, 0, 0).unwrap();
        assert!(state.add(Category::Center));
        assert_eq!(state.total(), u64::MAX);

        let before = state.clone();
        assert!(!state.add(Category::Right));
        assert_eq!(state, before);
    }

    #[test]
    fn test_remove_from_empty_category_is_noop() {
        let mut state = PopulationState::from_counts(0, 2, 2).unwrap();
        let before = state.clone();
        assert!(!state.remove(Category::Left));
        assert_eq!(state, before);
    }

    #[test]
    fn test_transfer() {
        let mut state = PopulationState::from_counts(2, 3, 5).unwrap();
        assert!(state.transfer(Category::Left, Category::Center));
        assert_eq!(state.counts(), [1, 3, 6]);
        assert_eq!(state.total(), 10);
        assert_consistent(&state);

        let mut state = PopulationState::from_counts(0, 3, 5).unwrap();
        assert!(!state.transfer(Category::Left, Category::Center));
        assert_eq!(state.counts(), [0, 3, 5]);
    }

    #[test]
    fn test_removing_everyone_zeroes_densities() {
        let mut state = PopulationState::from_counts(0, 0, 1).unwrap();
        assert!(state.remove(Category::Center));
        assert_eq!(state.total(), 0);
        assert_eq!(state.densities().sum(), 0.0);
    }

    #[test]
    fn test_consensus() {
        assert_eq!(
            PopulationState::from_counts(5, 0, 0).unwrap().consensus(),
            Some(Category::Left)
        );
        assert_eq!(
            PopulationState::from_counts(0, 0, 10).unwrap().consensus(),
            Some(Category::Center)
        );
        assert_eq!(PopulationState::from_counts(1, 0, 1).unwrap().consensus(), None);
    }

    #[test]
    fn test_category_order() {
        assert_eq!(Category::from_index(0), Some(Category::Left));
        assert_eq!(Category::from_index(2), Some(Category::Center));
        assert_eq!(Category::from_index(3), None);
        assert_eq!(Category::Right.index(), 1);
        assert_eq!(Category::Center.to_string(), "center");
    }
}
