//! Shared rule-node semantic tables used by both the engine and the CLI.
//!
//! This crate centralizes operator/hedge name and alias resolution so that the
//! normalizer, diagnostics, and tooling agree on which node kinds exist.

/// Canonical fuzzy operator identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    And,
    Or,
    Product,
    Sum,
    Times,
    Average,
}

/// Canonical hedge identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HedgeId {
    Not,
    Power,
    Very,
    Somewhat,
    Limit,
    NullOr,
    NotNullAnd,
    NullNotRated,
}

/// What a declared node type string resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKindId {
    Operator(OperatorId),
    Hedge(HedgeId),
    Evaluation,
}

impl OperatorId {
    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            OperatorId::And => "and",
            OperatorId::Or => "or",
            OperatorId::Product => "product",
            OperatorId::Sum => "sum",
            OperatorId::Times => "times",
            OperatorId::Average => "average",
        }
    }

    /// Exact number of operands the operator requires, if fixed.
    pub fn fixed_arity(self) -> Option<usize> {
        match self {
            OperatorId::Times => Some(2),
            OperatorId::And
            | OperatorId::Or
            | OperatorId::Product
            | OperatorId::Sum
            | OperatorId::Average => None,
        }
    }
}

impl HedgeId {
    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            HedgeId::Not => "not",
            HedgeId::Power => "power",
            HedgeId::Very => "very",
            HedgeId::Somewhat => "somewhat",
            HedgeId::Limit => "limit",
            HedgeId::NullOr => "null_or",
            HedgeId::NotNullAnd => "not_null_and",
            HedgeId::NullNotRated => "null_not_rated",
        }
    }

    /// Whether the hedge reads an authored numeric parameter.
    pub fn takes_param(self) -> bool {
        matches!(self, HedgeId::Power)
    }
}

/// Resolve a declared node type string to a canonical node kind.
///
/// Matching ignores case and treats spaces and dashes as underscores, so
/// `"NOT NULL AND"`, `"not-null-and"` and `"not_null_and"` are the same hedge.
pub fn resolve_node_kind(name: &str) -> Option<NodeKindId> {
    let canonical = canonicalize(name);

    let kind = match canonical.as_str() {
        "and" | "min" => NodeKindId::Operator(OperatorId::And),
        "or" | "max" => NodeKindId::Operator(OperatorId::Or),
        "product" | "prod" => NodeKindId::Operator(OperatorId::Product),
        "sum" | "algebraic_sum" | "probabilistic_sum" => NodeKindId::Operator(OperatorId::Sum),
        "times" => NodeKindId::Operator(OperatorId::Times),
        "average" | "avg" | "mean" => NodeKindId::Operator(OperatorId::Average),
        "not" => NodeKindId::Hedge(HedgeId::Not),
        "power" | "multiply" | "pow" => NodeKindId::Hedge(HedgeId::Power),
        "very" => NodeKindId::Hedge(HedgeId::Very),
        "somewhat" => NodeKindId::Hedge(HedgeId::Somewhat),
        "limit" => NodeKindId::Hedge(HedgeId::Limit),
        "null_or" => NodeKindId::Hedge(HedgeId::NullOr),
        "not_null_and" => NodeKindId::Hedge(HedgeId::NotNullAnd),
        "null_not_rated" => NodeKindId::Hedge(HedgeId::NullNotRated),
        "evaluation" | "eval" | "rule" | "leaf" => NodeKindId::Evaluation,
        _ => return None,
    };
    Some(kind)
}

/// Accepted node type names, including aliases.
///
/// Used for diagnostics and typo suggestions.
pub fn accepted_node_kinds() -> &'static [&'static str] {
    ACCEPTED_NAMES
}

fn canonicalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

const ACCEPTED_NAMES: &[&str] = &[
    "and",
    "min",
    "or",
    "max",
    "product",
    "prod",
    "sum",
    "algebraic_sum",
    "probabilistic_sum",
    "times",
    "average",
    "avg",
    "mean",
    "not",
    "power",
    "multiply",
    "pow",
    "very",
    "somewhat",
    "limit",
    "null_or",
    "not_null_and",
    "null_not_rated",
    "evaluation",
    "eval",
    "rule",
    "leaf",
];
