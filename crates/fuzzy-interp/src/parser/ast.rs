//! Public AST types for crisp evaluation expressions.
//!
//! These types are public so tooling can inspect compiled catalogs.

/// A parsed crisp predicate over the current property value.
#[derive(Debug, Clone, PartialEq)]
pub enum CrispExpr {
    /// True when any branch is true.
    Or(Vec<CrispExpr>),
    /// True when every branch is true.
    And(Vec<CrispExpr>),
    Not(Box<CrispExpr>),
    /// `>= 10`, `x < 2.5`, `= "sandy"`
    Compare { op: CompareOp, literal: Literal },
    /// `in ("a", "b")`, `not in (1, 2)`, or a bare literal list.
    Membership { negated: bool, literals: Vec<Literal> },
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A literal operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
}
