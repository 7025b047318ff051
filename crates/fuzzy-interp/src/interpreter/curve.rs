//! Evaluation curves: property value to fuzzy membership.
//!
//! The interpolation helpers expect points sorted by ascending `x`, which
//! [`Evaluation::from_definition`](crate::types::Evaluation::from_definition)
//! guarantees for compiled evaluations. They return `None` only for an empty
//! point list.

use std::cmp::Ordering;

use crate::interpreter::EngineError;
use crate::parser::{CompareOp, CrispExpr, Literal};
use crate::types::{CurveShape, Evaluation, EvaluationPoint, Interpolation, PropertyValue};

/// Evaluate a property value against a compiled evaluation.
///
/// A null value yields `Ok(None)` ("not rated"). Inversion is applied after
/// interpolation, for every curve type and for crisp results.
///
/// # Errors
///
/// Returns [`EngineError::InvalidPropertyData`] when a numeric curve receives
/// text, NaN or an infinite number.
pub fn evaluate_curve(
    value: &PropertyValue,
    evaluation: &Evaluation,
    clamp_spline: bool,
) -> Result<Option<f64>, EngineError> {
    let membership = match &evaluation.shape {
        CurveShape::Crisp { expression, .. } => {
            match value {
                PropertyValue::Null => return Ok(None),
                PropertyValue::Number(n) if !n.is_finite() => {
                    return Err(invalid_data(evaluation, value));
                }
                PropertyValue::Number(_) | PropertyValue::Text(_) => {}
            }
            if crisp_matches(expression, value) { 1.0 } else { 0.0 }
        }
        CurveShape::Interpolated {
            interpolation,
            points,
        } => {
            let x = match value {
                PropertyValue::Null => return Ok(None),
                PropertyValue::Number(n) if n.is_finite() => *n,
                PropertyValue::Number(_) | PropertyValue::Text(_) => {
                    return Err(invalid_data(evaluation, value));
                }
            };
            let y = match interpolation {
                Interpolation::Linear | Interpolation::Sigmoid => linear_interpolation(points, x),
                Interpolation::Step => step_function(points, x),
                Interpolation::Spline => spline_interpolation(points, x, clamp_spline),
            };
            y.ok_or_else(|| EngineError::Evaluation {
                node: evaluation.name.clone(),
                message: "curve has no points".to_string(),
            })?
        }
    };

    Ok(Some(if evaluation.invert {
        1.0 - membership
    } else {
        membership
    }))
}

fn invalid_data(evaluation: &Evaluation, value: &PropertyValue) -> EngineError {
    let expected = match evaluation.shape {
        CurveShape::Crisp { .. } => "a finite number or text",
        CurveShape::Interpolated { .. } => "a finite number",
    };
    EngineError::InvalidPropertyData {
        property: evaluation.property_name.clone(),
        expected: expected.to_string(),
        found: format!("{} {value}", value.type_name()),
    }
}

/// Piecewise-linear interpolation, clamped to the boundary `y` outside the
/// point range.
pub fn linear_interpolation(points: &[EvaluationPoint], x: f64) -> Option<f64> {
    let (lower, upper) = match bracket(points, x)? {
        Bracket::Clamped(y) => return Some(y),
        Bracket::Between(lower, upper) => (lower, upper),
    };
    let t = (x - lower.x) / (upper.x - lower.x);
    Some(lower.y + (upper.y - lower.y) * t)
}

/// The `y` of the greatest point with `x <= query`, or the first point's `y`
/// below the range.
pub fn step_function(points: &[EvaluationPoint], x: f64) -> Option<f64> {
    let first = points.first()?;
    let at_or_below = points.partition_point(|p| p.x <= x);
    match at_or_below.checked_sub(1) {
        Some(index) => points.get(index).map(|p| p.y),
        None => Some(first.y),
    }
}

/// Cubic Hermite interpolation with Catmull-Rom tangents.
///
/// Tangents at the end points are one-sided differences. Outside the point
/// range the boundary `y` is returned. Between points the curve may leave
/// `[0, 1]`; `clamp` bounds the result.
pub fn spline_interpolation(points: &[EvaluationPoint], x: f64, clamp: bool) -> Option<f64> {
    let upper_index = points.partition_point(|p| p.x <= x);
    let (lower, upper) = match bracket(points, x)? {
        Bracket::Clamped(y) => return Some(y),
        Bracket::Between(lower, upper) => (lower, upper),
    };
    let lower_index = upper_index - 1;

    let h = upper.x - lower.x;
    let t = (x - lower.x) / h;
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    let m0 = tangent(points, lower_index);
    let m1 = tangent(points, upper_index);
    let y = h00 * lower.y + h10 * h * m0 + h01 * upper.y + h11 * h * m1;

    Some(if clamp { y.clamp(0.0, 1.0) } else { y })
}

/// Finite-difference tangent at `index`, one-sided at the ends.
fn tangent(points: &[EvaluationPoint], index: usize) -> f64 {
    let before = points.get(index.saturating_sub(1));
    let after = points.get(index + 1).or_else(|| points.get(index));
    match (before, after) {
        (Some(a), Some(b)) if b.x > a.x => (b.y - a.y) / (b.x - a.x),
        _ => 0.0,
    }
}

enum Bracket {
    /// The query lies at or beyond an end point.
    Clamped(f64),
    /// The query lies strictly inside `[lower.x, upper.x)`.
    Between(EvaluationPoint, EvaluationPoint),
}

fn bracket(points: &[EvaluationPoint], x: f64) -> Option<Bracket> {
    let first = points.first()?;
    let last = points.last()?;
    if x <= first.x {
        return Some(Bracket::Clamped(first.y));
    }
    if x >= last.x {
        return Some(Bracket::Clamped(last.y));
    }
    let upper = points.partition_point(|p| p.x <= x);
    let lower = points.get(upper.checked_sub(1)?)?;
    let upper = points.get(upper)?;
    Some(Bracket::Between(*lower, *upper))
}

/// Reconstruct sigmoid control points from domain-only `x` values.
///
/// Sorted values receive `y = i / (n - 1)`, so the first maps to 0 and the
/// last to 1 regardless of spacing.
pub fn sigmoid_points(domain: &[f64]) -> Vec<EvaluationPoint> {
    let mut xs = domain.to_vec();
    xs.sort_by(f64::total_cmp);
    let steps = xs.len().saturating_sub(1).max(1) as f64;
    xs.iter()
        .enumerate()
        .map(|(i, &x)| EvaluationPoint::new(x, i as f64 / steps))
        .collect()
}

/// Whether a non-null value satisfies a crisp expression.
pub fn crisp_matches(expression: &CrispExpr, value: &PropertyValue) -> bool {
    match expression {
        CrispExpr::Or(branches) => branches.iter().any(|b| crisp_matches(b, value)),
        CrispExpr::And(branches) => branches.iter().all(|b| crisp_matches(b, value)),
        CrispExpr::Not(inner) => !crisp_matches(inner, value),
        CrispExpr::Compare { op, literal } => compare(value, *op, literal),
        CrispExpr::Membership { negated, literals } => {
            let found = literals.iter().any(|l| compare(value, CompareOp::Eq, l));
            found != *negated
        }
    }
}

fn compare(value: &PropertyValue, op: CompareOp, literal: &Literal) -> bool {
    let ordering = match (value, literal) {
        (PropertyValue::Number(v), Literal::Number(l)) => v.partial_cmp(l),
        (PropertyValue::Text(v), Literal::Text(l)) => Some(fold(v).cmp(&fold(l))),
        (PropertyValue::Number(_), Literal::Text(_))
        | (PropertyValue::Text(_), Literal::Number(_))
        | (PropertyValue::Null, _) => None,
    };
    let Some(ordering) = ordering else {
        return op == CompareOp::Ne;
    };
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}

fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}
