use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::interpreter::{ConfigurationError, sigmoid_points};
use crate::parser::{CrispExpr, parse_crisp_expression};

/// A control point of a fuzzy membership curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPoint {
    pub x: f64,
    pub y: f64,
}

impl EvaluationPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Interpolation policy for point-based curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Linear,
    Spline,
    Step,
    Sigmoid,
}

/// The declared evaluation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationKind {
    Crisp,
    Fuzzy,
    Continuous,
    /// The type string named an interpolation directly (e.g. `"sigmoid"`).
    Curve(Interpolation),
}

/// An evaluation as authored in a catalog source.
///
/// Definitions are compiled once into [`Evaluation`] by the catalog; the
/// compiled form is what the engine evaluates.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDefinition {
    pub id: String,
    pub name: String,
    pub property_name: String,
    /// `"crisp"`, `"fuzzy"`, `"continuous"` or a curve subtype.
    #[serde(rename = "type", default = "default_kind")]
    #[builder(default = default_kind())]
    pub kind: String,
    #[serde(default)]
    #[builder(default)]
    pub invert: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<EvaluationPoint>>,
    /// Domain-only control points, used to reconstruct a sigmoid ramp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolation: Option<Interpolation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crisp_expression: Option<String>,
}

fn default_kind() -> String {
    "fuzzy".to_string()
}

/// How a compiled evaluation turns a property value into a membership.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveShape {
    /// Boolean predicate yielding exactly 0 or 1.
    Crisp { source: String, expression: CrispExpr },
    /// Points sorted by ascending `x`, at least two of them.
    Interpolated {
        interpolation: Interpolation,
        points: Vec<EvaluationPoint>,
    },
}

/// A compiled, immutable evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub id: String,
    pub name: String,
    pub property_name: String,
    pub kind: EvaluationKind,
    pub invert: bool,
    pub shape: CurveShape,
}

impl Evaluation {
    /// Compile an authored definition, validating its curve or expression.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the type is unknown, the crisp
    /// expression does not parse, or the points are unusable.
    pub fn from_definition(def: &EvaluationDefinition) -> Result<Self, ConfigurationError> {
        let kind = parse_kind(&def.name, &def.kind)?;

        let shape = match kind {
            EvaluationKind::Crisp => {
                let source = def.crisp_expression.as_deref().ok_or_else(|| {
                    invalid(&def.name, "crisp evaluation has no crispExpression")
                })?;
                let expression = parse_crisp_expression(source).map_err(|source| {
                    ConfigurationError::CrispExpression {
                        evaluation: def.name.clone(),
                        source,
                    }
                })?;
                CurveShape::Crisp {
                    source: source.to_string(),
                    expression,
                }
            }
            EvaluationKind::Fuzzy | EvaluationKind::Continuous | EvaluationKind::Curve(_) => {
                let declared = match kind {
                    EvaluationKind::Curve(interpolation) => Some(interpolation),
                    EvaluationKind::Crisp | EvaluationKind::Fuzzy | EvaluationKind::Continuous => {
                        None
                    }
                };
                let interpolation = def.interpolation.or(declared).unwrap_or_default();
                let points = compile_points(def, interpolation)?;
                CurveShape::Interpolated {
                    interpolation,
                    points,
                }
            }
        };

        Ok(Self {
            id: def.id.clone(),
            name: def.name.clone(),
            property_name: def.property_name.clone(),
            kind,
            invert: def.invert,
            shape,
        })
    }

    /// The interpolation policy, or `None` for crisp evaluations.
    pub fn interpolation(&self) -> Option<Interpolation> {
        match &self.shape {
            CurveShape::Interpolated { interpolation, .. } => Some(*interpolation),
            CurveShape::Crisp { .. } => None,
        }
    }

    /// The sorted curve points; empty for crisp evaluations.
    pub fn points(&self) -> &[EvaluationPoint] {
        match &self.shape {
            CurveShape::Interpolated { points, .. } => points,
            CurveShape::Crisp { .. } => &[],
        }
    }
}

fn parse_kind(evaluation: &str, kind: &str) -> Result<EvaluationKind, ConfigurationError> {
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "crisp" => EvaluationKind::Crisp,
        "fuzzy" | "" => EvaluationKind::Fuzzy,
        "continuous" => EvaluationKind::Continuous,
        "linear" => EvaluationKind::Curve(Interpolation::Linear),
        "spline" => EvaluationKind::Curve(Interpolation::Spline),
        "step" => EvaluationKind::Curve(Interpolation::Step),
        "sigmoid" => EvaluationKind::Curve(Interpolation::Sigmoid),
        other => {
            return Err(invalid(
                evaluation,
                &format!("unknown evaluation type '{other}'"),
            ));
        }
    };
    Ok(kind)
}

fn compile_points(
    def: &EvaluationDefinition,
    interpolation: Interpolation,
) -> Result<Vec<EvaluationPoint>, ConfigurationError> {
    let mut points = match (&def.points, &def.domain) {
        (Some(points), _) => points.clone(),
        (None, Some(domain)) if interpolation == Interpolation::Sigmoid => {
            if domain.iter().any(|x| !x.is_finite()) {
                return Err(invalid(&def.name, "domain contains a non-finite value"));
            }
            sigmoid_points(domain)
        }
        (None, Some(_)) => {
            return Err(invalid(
                &def.name,
                "domain-only curves require sigmoid interpolation",
            ));
        }
        (None, None) => return Err(invalid(&def.name, "curve has no points")),
    };

    if points.len() < 2 {
        return Err(invalid(
            &def.name,
            &format!("curve needs at least 2 points, got {}", points.len()),
        ));
    }
    if let Some(bad) = points
        .iter()
        .find(|p| !p.x.is_finite() || !p.y.is_finite() || !(0.0..=1.0).contains(&p.y))
    {
        return Err(invalid(
            &def.name,
            &format!("point ({}, {}) is outside the curve's valid range", bad.x, bad.y),
        ));
    }

    points.sort_by(|a, b| a.x.total_cmp(&b.x));
    Ok(points)
}

fn invalid(evaluation: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidEvaluation {
        evaluation: evaluation.to_string(),
        reason: reason.to_string(),
    }
}
