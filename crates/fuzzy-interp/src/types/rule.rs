use std::fmt::Write;

use bon::Builder;
use fuzzy_interp_semantics::{HedgeId, OperatorId};
use serde::{Deserialize, Serialize};

use crate::types::{InterpretationId, Property};

/// A rule node as loaded from a catalog source.
///
/// Depth is encoded by the leading indentation of `level_name`; nested
/// `children` are placed one level below their parent.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct RuleNode {
    pub level_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub children: Vec<RuleNode>,
}

/// A named rule as loaded from a catalog source: a flat node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<RuleNode>,
}

/// The resolved kind of a hierarchical node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Top-level rule header; children combine under an implicit `and`.
    Root,
    Operator(OperatorId),
    Hedge { hedge: HedgeId, param: Option<f64> },
    /// Leaf referencing an evaluation or another interpretation.
    Evaluation { ref_id: String },
}

/// A node of a normalized rule tree.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchicalRuleNode {
    pub name: String,
    /// Stable dotted child-index path, e.g. `"0.1.2"`.
    pub key: String,
    pub depth: usize,
    pub kind: NodeKind,
    pub children: Vec<HierarchicalRuleNode>,
}

impl HierarchicalRuleNode {
    pub fn operator(&self) -> Option<OperatorId> {
        match &self.kind {
            NodeKind::Operator(op) => Some(*op),
            NodeKind::Root | NodeKind::Hedge { .. } | NodeKind::Evaluation { .. } => None,
        }
    }

    pub fn hedge(&self) -> Option<HedgeId> {
        match &self.kind {
            NodeKind::Hedge { hedge, .. } => Some(*hedge),
            NodeKind::Root | NodeKind::Operator(_) | NodeKind::Evaluation { .. } => None,
        }
    }

    pub fn hedge_param(&self) -> Option<f64> {
        match &self.kind {
            NodeKind::Hedge { param, .. } => *param,
            NodeKind::Root | NodeKind::Operator(_) | NodeKind::Evaluation { .. } => None,
        }
    }

    pub fn ref_id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Evaluation { ref_id } => Some(ref_id),
            NodeKind::Root | NodeKind::Operator(_) | NodeKind::Hedge { .. } => None,
        }
    }

    /// Short label for the node kind: `root`, `operator`, `hedge` or `evaluation`.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Root => "root",
            NodeKind::Operator(_) => "operator",
            NodeKind::Hedge { .. } => "hedge",
            NodeKind::Evaluation { .. } => "evaluation",
        }
    }

    /// Visit this node and all descendants in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a HierarchicalRuleNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    fn describe(&self) -> String {
        match &self.kind {
            NodeKind::Root => self.name.clone(),
            NodeKind::Operator(op) => format!("{} [{}]", self.name, op.name()),
            NodeKind::Hedge {
                hedge,
                param: Some(param),
            } => format!("{} [{} {param}]", self.name, hedge.name()),
            NodeKind::Hedge { hedge, param: None } => format!("{} [{}]", self.name, hedge.name()),
            NodeKind::Evaluation { ref_id } => format!("{} -> {ref_id}", self.name),
        }
    }
}

/// Render normalized nodes as an indented outline, one node per line.
pub fn render_outline(nodes: &[HierarchicalRuleNode]) -> String {
    let mut out = String::new();
    for root in nodes {
        root.walk(&mut |node| {
            let _ = writeln!(
                out,
                "{}{} {}",
                "  ".repeat(node.depth),
                node.key,
                node.describe()
            );
        });
    }
    out
}

/// A normalized, named interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretationTree {
    pub id: String,
    pub name: String,
    pub interpretation_id: InterpretationId,
    pub root: Vec<HierarchicalRuleNode>,
    pub required_properties: Vec<Property>,
}

impl InterpretationTree {
    /// Names of interpretations referenced by sub-rule leaves of this tree.
    pub(crate) fn leaf_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        for root in &self.root {
            root.walk(&mut |node| {
                if let Some(ref_id) = node.ref_id() {
                    refs.push(ref_id);
                }
            });
        }
        refs
    }
}
