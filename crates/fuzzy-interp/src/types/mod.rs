mod evaluation;
mod interpretation_id;
mod property;
mod property_value;
mod result;
mod rule;

pub use evaluation::{
    CurveShape, Evaluation, EvaluationDefinition, EvaluationKind, EvaluationPoint, Interpolation,
};
pub use interpretation_id::InterpretationId;
pub use property::Property;
pub use property_value::{PropertyData, PropertyValue};
pub use result::{InterpretationResult, RatingClass};
pub use rule::{
    HierarchicalRuleNode, InterpretationTree, NodeKind, RuleDefinition, RuleNode, render_outline,
};
