//! Hedges: unary modifiers applied to a child's rating.

use fuzzy_interp_semantics::HedgeId;

/// Apply a hedge to a single rating.
///
/// `param` is only read by [`HedgeId::Power`], where it defaults to 1.
/// [`HedgeId::NullNotRated`] leaves the value unchanged here; the evaluator
/// turns a null under it into a veto of the whole interpretation.
pub fn apply_hedge(value: Option<f64>, hedge: HedgeId, param: Option<f64>) -> Option<f64> {
    match hedge {
        HedgeId::Not => value.map(not_hedge),
        HedgeId::Power => value.map(|v| power_hedge(v, param.unwrap_or(1.0))),
        HedgeId::Very => value.map(|v| power_hedge(v, 2.0)),
        HedgeId::Somewhat => value.map(|v| power_hedge(v, 0.5)),
        HedgeId::Limit => value.map(limit_hedge),
        HedgeId::NullOr => Some(value.unwrap_or(0.0)),
        HedgeId::NotNullAnd => Some(value.unwrap_or(1.0)),
        HedgeId::NullNotRated => value,
    }
}

/// Apply a hedge to each rating in turn.
pub fn apply_hedge_all(
    values: &[Option<f64>],
    hedge: HedgeId,
    param: Option<f64>,
) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|&value| apply_hedge(value, hedge, param))
        .collect()
}

/// `1 - v`
pub fn not_hedge(value: f64) -> f64 {
    1.0 - value
}

/// `v ^ exponent`, with negative bases floored at 0.
pub fn power_hedge(value: f64, exponent: f64) -> f64 {
    value.max(0.0).powf(exponent)
}

/// Clamp into `[0, 1]`.
pub fn limit_hedge(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
