//! Crisp expression parser using winnow.
//!
//! Parses predicates such as `>= 10 and < 20`, `x != 0`, `"sandy", "loamy"`
//! or `not in ('clay', 'silty clay')` into a [`CrispExpr`]. Keywords are
//! case-insensitive; `&&`, `||` and `!` are accepted as symbolic forms.

use winnow::ascii::float;
use winnow::combinator::{alt, delimited, opt, preceded, repeat, separated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

use super::ast::{CompareOp, CrispExpr, Literal};
use super::error::ParseError;

/// Parse a crisp expression string into an AST.
pub fn parse_crisp_expression(input: &str) -> Result<CrispExpr, ParseError> {
    if input.trim().is_empty() {
        let (line, column) = calculate_position(input, "");
        return Err(ParseError::UnexpectedEof { line, column });
    }

    let mut remaining = input;
    match expression(&mut remaining) {
        Ok(expr) => {
            if remaining.is_empty() {
                Ok(expr)
            } else {
                let (line, column) = calculate_position(input, remaining);
                Err(ParseError::Syntax {
                    line,
                    column,
                    message: format!(
                        "unexpected character: '{}'",
                        remaining.chars().next().unwrap_or('?')
                    ),
                })
            }
        }
        Err(e) => {
            let (line, column) = calculate_position(input, remaining);
            Err(ParseError::Syntax {
                line,
                column,
                message: format!("parse error: {e}"),
            })
        }
    }
}

/// Calculate line and column from original input and remaining input.
fn calculate_position(original: &str, remaining: &str) -> (usize, usize) {
    let consumed = original.len() - remaining.len();
    let consumed_str = &original[..consumed];
    let line = consumed_str.chars().filter(|&c| c == '\n').count() + 1;
    let column = match consumed_str.rfind('\n') {
        Some(pos) => consumed - pos,
        None => consumed + 1,
    };
    (line, column)
}

/// Parse a full expression with surrounding whitespace.
fn expression(input: &mut &str) -> ModalResult<CrispExpr> {
    let expr = or_expr(input)?;
    ws(input)?;
    Ok(expr)
}

fn or_expr(input: &mut &str) -> ModalResult<CrispExpr> {
    let first = and_expr(input)?;
    let rest: Vec<CrispExpr> = repeat(0.., preceded((ws, or_op), and_expr)).parse_next(input)?;
    Ok(join(first, rest, CrispExpr::Or))
}

fn and_expr(input: &mut &str) -> ModalResult<CrispExpr> {
    let first = unary(input)?;
    let rest: Vec<CrispExpr> = repeat(0.., preceded((ws, and_op), unary)).parse_next(input)?;
    Ok(join(first, rest, CrispExpr::And))
}

/// Collapse a single-branch chain to the branch itself.
fn join(first: CrispExpr, rest: Vec<CrispExpr>, combine: fn(Vec<CrispExpr>) -> CrispExpr) -> CrispExpr {
    if rest.is_empty() {
        return first;
    }
    let mut branches = Vec::with_capacity(rest.len() + 1);
    branches.push(first);
    branches.extend(rest);
    combine(branches)
}

fn unary(input: &mut &str) -> ModalResult<CrispExpr> {
    ws(input)?;
    alt((grouped, comparison, negation)).parse_next(input)
}

fn negation(input: &mut &str) -> ModalResult<CrispExpr> {
    not_op(input)?;
    let inner = unary(input)?;
    Ok(CrispExpr::Not(Box::new(inner)))
}

fn grouped(input: &mut &str) -> ModalResult<CrispExpr> {
    delimited(('(', ws), or_expr, (ws, ')')).parse_next(input)
}

/// Parse a comparison, optionally prefixed by the `x` / `value` subject.
fn comparison(input: &mut &str) -> ModalResult<CrispExpr> {
    opt(subject).parse_next(input)?;
    alt((membership, relational, literal_list)).parse_next(input)
}

fn subject(input: &mut &str) -> ModalResult<()> {
    alt((
        |i: &mut &str| word(i, "value"),
        |i: &mut &str| word(i, "x"),
    ))
    .parse_next(input)?;
    ws(input)
}

/// `in (...)` or `not in (...)`
fn membership(input: &mut &str) -> ModalResult<CrispExpr> {
    let negated = opt(|i: &mut &str| {
        word(i, "not")?;
        ws(i)
    })
    .parse_next(input)?
    .is_some();
    word(input, "in")?;
    ws(input)?;
    let literals = delimited(('(', ws), literals, (ws, ')')).parse_next(input)?;
    Ok(CrispExpr::Membership { negated, literals })
}

fn relational(input: &mut &str) -> ModalResult<CrispExpr> {
    let op = compare_op(input)?;
    ws(input)?;
    let literal = literal(input)?;
    Ok(CrispExpr::Compare { op, literal })
}

/// A bare literal list is shorthand for membership.
fn literal_list(input: &mut &str) -> ModalResult<CrispExpr> {
    literals
        .map(|literals| CrispExpr::Membership {
            negated: false,
            literals,
        })
        .parse_next(input)
}

fn compare_op(input: &mut &str) -> ModalResult<CompareOp> {
    alt((
        ">=".value(CompareOp::Ge),
        "<=".value(CompareOp::Le),
        "==".value(CompareOp::Eq),
        "!=".value(CompareOp::Ne),
        "<>".value(CompareOp::Ne),
        "=".value(CompareOp::Eq),
        ">".value(CompareOp::Gt),
        "<".value(CompareOp::Lt),
    ))
    .parse_next(input)
}

fn literals(input: &mut &str) -> ModalResult<Vec<Literal>> {
    separated(1.., literal, (ws, ',', ws)).parse_next(input)
}

fn literal(input: &mut &str) -> ModalResult<Literal> {
    alt((quoted_text, number)).parse_next(input)
}

fn quoted_text(input: &mut &str) -> ModalResult<Literal> {
    alt((
        delimited('"', take_while(0.., |c: char| c != '"'), '"'),
        delimited('\'', take_while(0.., |c: char| c != '\''), '\''),
    ))
    .map(|text: &str| Literal::Text(text.to_string()))
    .parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<Literal> {
    let value: f64 = float.parse_next(input)?;
    if value.is_finite() {
        Ok(Literal::Number(value))
    } else {
        Err(backtrack())
    }
}

fn or_op(input: &mut &str) -> ModalResult<()> {
    alt(("||".void(), |i: &mut &str| word(i, "or"))).parse_next(input)
}

fn and_op(input: &mut &str) -> ModalResult<()> {
    alt(("&&".void(), |i: &mut &str| word(i, "and"))).parse_next(input)
}

fn not_op(input: &mut &str) -> ModalResult<()> {
    let rest = *input;
    if rest.starts_with('!') && !rest.starts_with("!=") {
        *input = &rest[1..];
        return Ok(());
    }
    word(input, "not")
}

/// Match a case-insensitive keyword that is not followed by an identifier
/// character.
fn word(input: &mut &str, expected: &str) -> ModalResult<()> {
    let rest = *input;
    let len = expected.len();
    let matched = rest
        .get(..len)
        .is_some_and(|head| head.eq_ignore_ascii_case(expected))
        && !rest[len..].starts_with(is_ident_char);
    if matched {
        *input = &rest[len..];
        Ok(())
    } else {
        Err(backtrack())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., char::is_whitespace)
        .void()
        .parse_next(input)
}

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}
