//! Fuzzy operators combining several child ratings into one.

use fuzzy_interp_semantics::OperatorId;

/// Combine child ratings with an operator, ignoring not-rated children.
///
/// `None` and NaN entries are filtered out first. If nothing remains the
/// result is `None`.
pub fn combine(values: &[Option<f64>], operator: OperatorId) -> Option<f64> {
    let rated: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| !v.is_nan())
        .collect();
    if rated.is_empty() {
        return None;
    }
    Some(apply_operator(&rated, operator))
}

/// Apply an operator to fully rated values.
pub fn apply_operator(values: &[f64], operator: OperatorId) -> f64 {
    match operator {
        OperatorId::And => fuzzy_and(values),
        OperatorId::Or => fuzzy_or(values),
        OperatorId::Product => fuzzy_product(values),
        OperatorId::Sum => fuzzy_sum(values),
        OperatorId::Times => fuzzy_times(values),
        OperatorId::Average => fuzzy_average(values),
    }
}

/// Minimum; 1 for no values.
pub fn fuzzy_and(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(1.0)
}

/// Maximum; 0 for no values.
pub fn fuzzy_or(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Algebraic product; 1 for no values.
pub fn fuzzy_product(values: &[f64]) -> f64 {
    values.iter().product()
}

/// Algebraic (probabilistic) sum `1 - Π(1 - v)`.
///
/// Never less than [`fuzzy_or`] of the same values.
pub fn fuzzy_sum(values: &[f64]) -> f64 {
    let complement: f64 = values.iter().map(|v| 1.0 - v).product();
    (1.0 - complement).max(fuzzy_or(values))
}

/// Running value times multiplier.
///
/// Only the first two values take part. A lone value passes through.
pub fn fuzzy_times(values: &[f64]) -> f64 {
    match values {
        [value, multiplier, ..] => value * multiplier,
        [value] => *value,
        [] => 1.0,
    }
}

/// Arithmetic mean; 0 for no values.
pub fn fuzzy_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
