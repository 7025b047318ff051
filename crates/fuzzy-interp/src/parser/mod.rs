//! Crisp expression parser.
//!
//! Crisp evaluations carry a small boolean predicate language over the
//! current property value. Expressions are parsed once, when the catalog is
//! built, into an AST the evaluator can match without re-parsing.

pub mod ast;
pub mod error;
mod crisp;

pub use ast::{CompareOp, CrispExpr, Literal};
pub use crisp::parse_crisp_expression;
pub use error::ParseError;
