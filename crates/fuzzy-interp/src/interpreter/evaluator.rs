//! Tree evaluation for interpretations.
//!
//! Evaluation is a depth-first post-order walk. Leaves resolve through the
//! curve module (or expand another interpretation in place), operators and
//! roots combine their children, and hedges transform their single child.
//! Every visited node's rating is recorded in the context under its key.

use fuzzy_interp_semantics::{HedgeId, OperatorId};

use crate::interpreter::catalog::Catalog;
use crate::interpreter::config::MissingDataPolicy;
use crate::interpreter::curve::evaluate_curve;
use crate::interpreter::error::compute_suggestions;
use crate::interpreter::hedges::apply_hedge;
use crate::interpreter::operators::combine;
use crate::interpreter::{EngineError, EvalContext};
use crate::types::{HierarchicalRuleNode, InterpretationTree, NodeKind, PropertyValue};

/// The value a node produced.
#[derive(Debug, Clone, Copy, PartialEq)]
enum NodeValue {
    Rated(f64),
    NotRated,
    /// A `null_not_rated` hedge saw missing data; the whole evaluation is
    /// not rated.
    Vetoed,
}

impl NodeValue {
    fn from_rating(rating: Option<f64>) -> Self {
        rating.map_or(NodeValue::NotRated, NodeValue::Rated)
    }

    fn rating(self) -> Option<f64> {
        match self {
            NodeValue::Rated(v) => Some(v),
            NodeValue::NotRated | NodeValue::Vetoed => None,
        }
    }
}

/// Evaluate an interpretation tree, returning its root rating.
///
/// `None` means "not rated". Node ratings and consumed property values are
/// left in `ctx`.
///
/// # Errors
///
/// Returns an error if:
/// - A leaf references neither an evaluation nor an interpretation
/// - A property value has the wrong type for its curve
/// - Sub-rules nest too deeply or reference each other cyclically
pub fn evaluate_tree(
    tree: &InterpretationTree,
    ctx: &mut EvalContext<'_>,
    catalog: &Catalog,
) -> Result<Option<f64>, EngineError> {
    ctx.push_call(&tree.name)?;
    let value = eval_roots(&tree.root, ctx, catalog);
    ctx.pop_call();
    Ok(value?.rating())
}

/// Evaluate root-level nodes; several roots combine under an implicit `and`.
fn eval_roots(
    roots: &[HierarchicalRuleNode],
    ctx: &mut EvalContext<'_>,
    catalog: &Catalog,
) -> Result<NodeValue, EngineError> {
    match roots {
        [root] => eval_node(root, ctx, catalog),
        _ => {
            let values = roots
                .iter()
                .map(|root| eval_node(root, ctx, catalog))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(combine_values(&values, OperatorId::And, ctx.options().missing_data))
        }
    }
}

fn eval_node(
    node: &HierarchicalRuleNode,
    ctx: &mut EvalContext<'_>,
    catalog: &Catalog,
) -> Result<NodeValue, EngineError> {
    let value = match &node.kind {
        NodeKind::Root => {
            let values = eval_children(node, ctx, catalog)?;
            combine_values(&values, OperatorId::And, ctx.options().missing_data)
        }
        NodeKind::Operator(op) => {
            let values = eval_children(node, ctx, catalog)?;
            combine_values(&values, *op, ctx.options().missing_data)
        }
        NodeKind::Hedge { hedge, param } => {
            let Some(child) = node.children.first() else {
                return Err(EngineError::Evaluation {
                    node: ctx.qualified_key(&node.key),
                    message: format!("hedge '{}' has no child", hedge.name()),
                });
            };
            let child_value = eval_node(child, ctx, catalog)?;
            hedge_value(child_value, *hedge, *param)
        }
        NodeKind::Evaluation { ref_id } => eval_leaf(node, ref_id, ctx, catalog)?,
    };
    ctx.record(&node.key, value.rating());
    Ok(value)
}

fn eval_children(
    node: &HierarchicalRuleNode,
    ctx: &mut EvalContext<'_>,
    catalog: &Catalog,
) -> Result<Vec<NodeValue>, EngineError> {
    node.children
        .iter()
        .map(|child| eval_node(child, ctx, catalog))
        .collect()
}

/// Resolve a leaf: an evaluation curve first, otherwise a sub-rule.
fn eval_leaf(
    node: &HierarchicalRuleNode,
    ref_id: &str,
    ctx: &mut EvalContext<'_>,
    catalog: &Catalog,
) -> Result<NodeValue, EngineError> {
    if let Some(evaluation) = catalog.evaluation(ref_id) {
        let value = property_value(&evaluation.property_name, ctx, catalog);
        let rating = evaluate_curve(&value, evaluation, ctx.options().clamp_spline)?;
        return Ok(NodeValue::from_rating(rating));
    }

    if let Some(tree) = catalog.interpretation(ref_id) {
        ctx.push_prefix(ctx.qualified_key(&node.key));
        let value = match ctx.push_call(&tree.name) {
            Ok(()) => {
                let value = eval_roots(&tree.root, ctx, catalog);
                ctx.pop_call();
                value
            }
            Err(e) => Err(e),
        };
        ctx.pop_prefix();
        return value;
    }

    Err(EngineError::InterpretationNotFound {
        name: ref_id.to_string(),
        suggestions: compute_suggestions(ref_id, &catalog.reference_names()),
    })
}

/// Look up a property by the name an evaluation uses, falling back to the
/// property's id (or name) as declared in the catalog.
fn property_value(name: &str, ctx: &mut EvalContext<'_>, catalog: &Catalog) -> PropertyValue {
    let value = ctx
        .input(name)
        .or_else(|| {
            let property = catalog.property(name)?;
            ctx.input(&property.name).or_else(|| ctx.input(&property.id))
        })
        .cloned()
        .unwrap_or_default();
    ctx.record_property(name, value.clone());
    value
}

fn hedge_value(child: NodeValue, hedge: HedgeId, param: Option<f64>) -> NodeValue {
    match child {
        NodeValue::Vetoed => NodeValue::Vetoed,
        NodeValue::NotRated if hedge == HedgeId::NullNotRated => NodeValue::Vetoed,
        NodeValue::NotRated => NodeValue::from_rating(apply_hedge(None, hedge, param)),
        NodeValue::Rated(v) => NodeValue::from_rating(apply_hedge(Some(v), hedge, param)),
    }
}

/// Combine child values under the missing-data policy.
///
/// A veto always wins. Under [`MissingDataPolicy::Propagate`] any not-rated
/// child makes the result not rated.
fn combine_values(values: &[NodeValue], op: OperatorId, policy: MissingDataPolicy) -> NodeValue {
    if values.contains(&NodeValue::Vetoed) {
        return NodeValue::Vetoed;
    }
    if policy == MissingDataPolicy::Propagate && values.contains(&NodeValue::NotRated) {
        return NodeValue::NotRated;
    }
    let ratings: Vec<Option<f64>> = values.iter().copied().map(NodeValue::rating).collect();
    NodeValue::from_rating(combine(&ratings, op))
}
