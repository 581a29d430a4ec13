//! Inverse-transform sampling over small categorical distributions.
//!
//! Weights are scanned in order while accumulating a running sum; the first
//! candidate whose cumulative sum reaches the draw is selected. Residual mass
//! left by rounding only ever falls to a candidate with positive weight.

/// Running sums of `weights`, in order.
pub fn cumulative(weights: &[f64]) -> Vec<f64> {
    weights
        .iter()
        .scan(0.0, |sum, &w| {
            *sum += w;
            Some(*sum)
        })
        .collect()
}

/// Index selected by the draw `value`, or `None` if the weights never reach it.
///
/// `None` is meaningful for sub-stochastic weights (standard birth and death,
/// where the missing mass means "nothing happens"). Callers that must always
/// pick something use [`select_or_last`].
pub fn select_index(weights: &[f64], value: f64) -> Option<usize> {
    let mut sum = 0.0;
    for (index, &weight) in weights.iter().enumerate() {
        sum += weight;
        if value <= sum {
            return Some(index);
        }
    }
    None
}

/// Last candidate with positive weight, if any.
fn last_positive(weights: &[f64]) -> Option<usize> {
    weights.iter().rposition(|&w| w > 0.0)
}

/// Like [`select_index`], but the last candidate absorbs any residual mass
/// left over by floating-point rounding. That is the last candidate with
/// positive weight, or simply the last one if every weight is zero.
///
/// Returns `None` only for an empty slice.
pub fn select_or_last(weights: &[f64], value: f64) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    select_index(weights, value)
        .or_else(|| last_positive(weights))
        .or(Some(weights.len() - 1))
}

/// Selection against sub-stochastic weights meant to total `mass`.
///
/// A draw at or past `mass` selects nothing. A draw below it that rounding
/// left unmatched goes to the last candidate with positive weight.
pub fn select_within(weights: &[f64], value: f64, mass: f64) -> Option<usize> {
    match select_index(weights, value) {
        Some(index) => Some(index),
        None if value < mass => last_positive(weights),
        None => None,
    }
}

/// Scales `weights` to sum to 1. Returns `None` if they sum to zero.
pub fn normalize(weights: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    Some(weights.iter().map(|w| w / total).collect())
}
