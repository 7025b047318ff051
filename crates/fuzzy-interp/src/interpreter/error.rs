//! Error types for the interpretation engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ParseError;

/// Errors in catalog data, detected while loading or building a catalog.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// File I/O error when reading a catalog file.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed JSON with location context.
    #[error("{origin}:{line}:{column}: {message}")]
    Json {
        origin: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// A crisp expression failed to parse.
    #[error("crisp expression of evaluation '{evaluation}': {source}")]
    CrispExpression {
        evaluation: String,
        #[source]
        source: ParseError,
    },

    /// An evaluation curve is unusable.
    #[error("invalid evaluation '{evaluation}': {reason}")]
    InvalidEvaluation { evaluation: String, reason: String },

    /// A rule node names an operator or hedge that does not exist.
    #[error("unknown node kind '{kind}' in rule '{rule}'{}", format_suggestions(suggestions))]
    UnknownNodeKind {
        rule: String,
        kind: String,
        suggestions: Vec<String>,
    },

    /// A node is indented to a level that matches no open ancestor.
    #[error("inconsistent indentation at node {index} ('{level_name}') in rule '{rule}'")]
    Indentation {
        rule: String,
        index: usize,
        level_name: String,
    },

    /// A node has the wrong number of children for its kind.
    #[error("node '{node}' in rule '{rule}' expects {expected} children, got {got}")]
    Arity {
        rule: String,
        node: String,
        expected: String,
        got: usize,
    },

    /// A hedge parameter is not a finite, non-negative number.
    #[error("node '{node}' in rule '{rule}' has invalid hedge parameter '{value}'")]
    HedgeParameter {
        rule: String,
        node: String,
        value: String,
    },

    /// An evaluation leaf has no reference.
    #[error("evaluation node '{node}' in rule '{rule}' has no refId")]
    MissingReference { rule: String, node: String },

    /// A reference names nothing in the catalog.
    #[error("'{owner}' references unknown '{reference}'")]
    UnresolvedReference { owner: String, reference: String },

    /// Two catalog entries of the same kind share a name.
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// Interpretations reference each other in a loop.
    #[error("interpretation reference cycle: {}", chain.join(" -> "))]
    ReferenceCycle { chain: Vec<String> },

    /// The rating threshold table is empty or not ascending.
    #[error("invalid rating table: {reason}")]
    RatingTable { reason: String },

    /// A rule has no nodes.
    #[error("rule '{rule}' has no nodes")]
    EmptyRule { rule: String },
}

/// Errors raised while evaluating an interpretation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// No interpretation with this name exists.
    #[error("interpretation not found: '{name}'{}", format_suggestions(suggestions))]
    InterpretationNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    /// A property value has the wrong type for its evaluation.
    #[error("invalid data for property '{property}': expected {expected}, found {found}")]
    InvalidPropertyData {
        property: String,
        expected: String,
        found: String,
    },

    /// Evaluation failed at a specific node.
    #[error("evaluation failed at node '{node}': {message}")]
    Evaluation { node: String, message: String },
}

impl EngineError {
    /// HTTP-style status code for callers that surface errors over a wire.
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::InvalidPropertyData { .. } => 400,
            EngineError::InterpretationNotFound { .. } => 404,
            EngineError::Configuration(_) | EngineError::Evaluation { .. } => 500,
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!("; did you mean: {}?", suggestions.join(", "))
    }
}

/// Compute "did you mean" suggestions using Levenshtein distance.
///
/// Keys of up to 3 characters allow distance 1, longer keys distance 2.
/// Returns at most 3 suggestions, closest first.
pub fn compute_suggestions<S: AsRef<str>>(key: &str, available: &[S]) -> Vec<String> {
    let max_distance = if key.len() <= 3 { 1 } else { 2 };
    let mut scored: Vec<(usize, &str)> = available
        .iter()
        .map(AsRef::as_ref)
        .filter(|candidate| *candidate != key)
        .map(|candidate| (strsim::levenshtein(key, candidate), candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(3)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}
