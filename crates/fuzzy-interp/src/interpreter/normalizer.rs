//! Tree normalization: flat, indentation-encoded rule nodes to a typed tree.
//!
//! Rule sources list nodes in pre-order with depth encoded by the leading
//! indentation of `levelName` (spaces, tabs or `.` markers, one column
//! each). Nodes are first placed into an arena using a stack of open
//! indentation levels, then converted into [`HierarchicalRuleNode`]s with
//! resolved kinds, dotted keys and arity checks.

use fuzzy_interp_semantics::{NodeKindId, accepted_node_kinds, resolve_node_kind};

use crate::interpreter::ConfigurationError;
use crate::interpreter::error::compute_suggestions;
use crate::types::{HierarchicalRuleNode, NodeKind, RuleNode};

/// A node placed in the arena, not yet resolved.
struct Draft<'a> {
    source: &'a RuleNode,
    name: String,
    children: Vec<usize>,
}

/// Normalize the flat node list of rule `rule` into root-level trees.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] for an empty rule, an indentation that
/// matches no open level, an unknown node kind, a bad hedge parameter, an
/// evaluation without `refId`, or a node with the wrong number of children.
pub fn normalize(
    rule: &str,
    nodes: &[RuleNode],
) -> Result<Vec<HierarchicalRuleNode>, ConfigurationError> {
    if nodes.is_empty() {
        return Err(ConfigurationError::EmptyRule {
            rule: rule.to_string(),
        });
    }

    let mut arena = Vec::new();
    let roots = place_level(rule, nodes, &mut arena)?;

    roots
        .iter()
        .enumerate()
        .map(|(i, &index)| finish(rule, &arena, index, 0, i.to_string()))
        .collect()
}

/// Place one sibling list into the arena, returning its top-level indices.
///
/// Nested `children` of a node form their own list, attached one level
/// below that node.
fn place_level<'a>(
    rule: &str,
    nodes: &'a [RuleNode],
    arena: &mut Vec<Draft<'a>>,
) -> Result<Vec<usize>, ConfigurationError> {
    let mut top_level = Vec::new();
    let mut top_width = None;
    // (indent width, arena index) of every node that can still take children
    let mut open: Vec<(usize, usize)> = Vec::new();

    for node in nodes {
        let (width, name) = split_indent(node);
        let index = arena.len();
        let indentation_error = || ConfigurationError::Indentation {
            rule: rule.to_string(),
            index,
            level_name: node.level_name.clone(),
        };

        let mut dedented = false;
        while open.last().is_some_and(|&(open_width, _)| open_width > width) {
            open.pop();
            dedented = true;
        }
        match open.last() {
            Some(&(open_width, _)) if open_width == width => {
                open.pop();
            }
            Some(_) if dedented => return Err(indentation_error()),
            Some(_) | None => {}
        }

        match open.last() {
            Some(&(_, parent)) => arena[parent].children.push(index),
            None => {
                if *top_width.get_or_insert(width) != width {
                    return Err(indentation_error());
                }
                top_level.push(index);
            }
        }

        arena.push(Draft {
            source: node,
            name,
            children: Vec::new(),
        });
        open.push((width, index));

        if !node.children.is_empty() {
            let nested = place_level(rule, &node.children, arena)?;
            arena[index].children.extend(nested);
        }
    }

    Ok(top_level)
}

/// Split a level name into its indentation width and trimmed name.
fn split_indent(node: &RuleNode) -> (usize, String) {
    let level_name = node.level_name.as_str();
    let body = level_name.trim_start_matches(|c: char| c.is_whitespace() || c == '.');
    let width = level_name[..level_name.len() - body.len()].chars().count();
    let name = body.trim_end();
    let name = if name.is_empty() {
        node.ref_id
            .as_deref()
            .or(node.node_kind.as_deref())
            .unwrap_or("node")
    } else {
        name
    };
    (width, name.to_string())
}

fn finish(
    rule: &str,
    arena: &[Draft<'_>],
    index: usize,
    depth: usize,
    key: String,
) -> Result<HierarchicalRuleNode, ConfigurationError> {
    let draft = &arena[index];
    let children = draft
        .children
        .iter()
        .enumerate()
        .map(|(i, &child)| finish(rule, arena, child, depth + 1, format!("{key}.{i}")))
        .collect::<Result<Vec<_>, _>>()?;

    let kind = resolve_kind(rule, draft, depth)?;
    check_arity(rule, &draft.name, &kind, children.len())?;

    Ok(HierarchicalRuleNode {
        name: draft.name.clone(),
        key,
        depth,
        kind,
        children,
    })
}

fn resolve_kind(rule: &str, draft: &Draft<'_>, depth: usize) -> Result<NodeKind, ConfigurationError> {
    let declared = draft
        .source
        .node_kind
        .as_deref()
        .map(str::trim)
        .filter(|kind| !kind.is_empty());

    if let Some(declared) = declared {
        return match resolve_node_kind(declared) {
            Some(id) => kind_from_id(rule, draft, id),
            None => Err(unknown_kind(rule, declared)),
        };
    }

    if let Some(ref_id) = reference(draft) {
        return Ok(NodeKind::Evaluation {
            ref_id: ref_id.to_string(),
        });
    }
    if let Some(id) = resolve_node_kind(&draft.name).filter(|id| *id != NodeKindId::Evaluation) {
        return kind_from_id(rule, draft, id);
    }
    if depth == 0 {
        return Ok(NodeKind::Root);
    }
    Err(unknown_kind(rule, &draft.name))
}

fn kind_from_id(rule: &str, draft: &Draft<'_>, id: NodeKindId) -> Result<NodeKind, ConfigurationError> {
    match id {
        NodeKindId::Operator(op) => Ok(NodeKind::Operator(op)),
        NodeKindId::Hedge(hedge) => {
            let param = if hedge.takes_param() {
                parse_param(rule, draft)?
            } else {
                None
            };
            Ok(NodeKind::Hedge { hedge, param })
        }
        NodeKindId::Evaluation => match reference(draft) {
            Some(ref_id) => Ok(NodeKind::Evaluation {
                ref_id: ref_id.to_string(),
            }),
            None => Err(ConfigurationError::MissingReference {
                rule: rule.to_string(),
                node: draft.name.clone(),
            }),
        },
    }
}

fn reference<'a>(draft: &Draft<'a>) -> Option<&'a str> {
    draft
        .source
        .ref_id
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
}

fn parse_param(rule: &str, draft: &Draft<'_>) -> Result<Option<f64>, ConfigurationError> {
    let Some(raw) = draft.source.value.as_deref().map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(param) if param.is_finite() && param >= 0.0 => Ok(Some(param)),
        Ok(_) | Err(_) => Err(ConfigurationError::HedgeParameter {
            rule: rule.to_string(),
            node: draft.name.clone(),
            value: raw.to_string(),
        }),
    }
}

fn unknown_kind(rule: &str, kind: &str) -> ConfigurationError {
    ConfigurationError::UnknownNodeKind {
        rule: rule.to_string(),
        kind: kind.to_string(),
        suggestions: compute_suggestions(&kind.to_lowercase(), accepted_node_kinds()),
    }
}

fn check_arity(
    rule: &str,
    node: &str,
    kind: &NodeKind,
    got: usize,
) -> Result<(), ConfigurationError> {
    let (ok, expected) = match kind {
        NodeKind::Root => (got >= 1, "at least 1".to_string()),
        NodeKind::Operator(op) => match op.fixed_arity() {
            Some(n) => (got == n, n.to_string()),
            None => (got >= 1, "at least 1".to_string()),
        },
        NodeKind::Hedge { .. } => (got == 1, "1".to_string()),
        NodeKind::Evaluation { .. } => (got == 0, "0".to_string()),
    };
    if ok {
        Ok(())
    } else {
        Err(ConfigurationError::Arity {
            rule: rule.to_string(),
            node: node.to_string(),
            expected,
            got,
        })
    }
}
