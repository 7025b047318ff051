//! Evaluation context for tracking state during recursive evaluation.

use std::collections::BTreeMap;

use crate::interpreter::config::{EngineConfig, MissingDataPolicy};
use crate::interpreter::EngineError;
use crate::types::{PropertyData, PropertyValue};

/// Per-evaluation settings taken from the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    pub clamp_spline: bool,
    pub missing_data: MissingDataPolicy,
    /// Maximum sub-rule nesting depth (default 64).
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EvalOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            clamp_spline: config.clamp_spline,
            missing_data: config.missing_data,
            max_depth: config.max_depth,
        }
    }
}

/// Evaluation context carrying state through recursive evaluation.
///
/// The context tracks:
/// - Input property data for the subject being evaluated
/// - Call stack of interpretation names for cycle detection
/// - Key prefixes so sub-rule nodes get distinct result keys
/// - Per-node ratings and consumed property values
pub struct EvalContext<'a> {
    data: &'a PropertyData,
    options: EvalOptions,
    /// Call stack for cycle detection (interpretation names).
    call_stack: Vec<String>,
    /// Qualified keys of the sub-rule leaves currently being expanded.
    key_prefixes: Vec<String>,
    results: BTreeMap<String, Option<f64>>,
    property_values: BTreeMap<String, PropertyValue>,
}

impl<'a> EvalContext<'a> {
    /// Create a new context over input data.
    pub fn new(data: &'a PropertyData, options: EvalOptions) -> Self {
        Self {
            data,
            options,
            call_stack: Vec::new(),
            key_prefixes: Vec::new(),
            results: BTreeMap::new(),
            property_values: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> EvalOptions {
        self.options
    }

    /// Get an input value by the key the caller used.
    pub fn input(&self, key: &str) -> Option<&'a PropertyValue> {
        self.data.get(key)
    }

    /// Check if an interpretation is in the current call stack.
    pub fn is_in_call_stack(&self, name: &str) -> bool {
        self.call_stack.iter().any(|n| n == name)
    }

    /// Push an interpretation onto the call stack.
    ///
    /// Returns an error if the maximum depth is reached or `name` is already
    /// being evaluated.
    pub fn push_call(&mut self, name: &str) -> Result<(), EngineError> {
        if self.call_stack.len() >= self.options.max_depth {
            return Err(EngineError::Evaluation {
                node: self.current_prefix().unwrap_or(name).to_string(),
                message: format!(
                    "maximum sub-rule depth of {} exceeded",
                    self.options.max_depth
                ),
            });
        }
        if self.is_in_call_stack(name) {
            let mut chain = self.call_stack.clone();
            chain.push(name.to_string());
            return Err(EngineError::Evaluation {
                node: self.current_prefix().unwrap_or(name).to_string(),
                message: format!("interpretation reference cycle: {}", chain.join(" -> ")),
            });
        }
        self.call_stack.push(name.to_string());
        Ok(())
    }

    /// Pop an interpretation from the call stack.
    pub fn pop_call(&mut self) {
        self.call_stack.pop();
    }

    /// Get the call stack for error reporting.
    pub fn call_stack(&self) -> &[String] {
        &self.call_stack
    }

    /// Enter the sub-rule expanded at the node with qualified key `key`.
    pub fn push_prefix(&mut self, key: String) {
        self.key_prefixes.push(key);
    }

    pub fn pop_prefix(&mut self) {
        self.key_prefixes.pop();
    }

    fn current_prefix(&self) -> Option<&str> {
        self.key_prefixes.last().map(String::as_str)
    }

    /// The result key of a node in the tree currently being evaluated.
    ///
    /// Nodes of a sub-rule are keyed `"<leaf key>/<node key>"`.
    pub fn qualified_key(&self, key: &str) -> String {
        match self.current_prefix() {
            Some(prefix) => format!("{prefix}/{key}"),
            None => key.to_string(),
        }
    }

    /// Record a node's rating under its qualified key.
    pub fn record(&mut self, key: &str, rating: Option<f64>) {
        let key = self.qualified_key(key);
        self.results.insert(key, rating);
    }

    /// Record the value consumed for a property.
    pub fn record_property(&mut self, name: &str, value: PropertyValue) {
        self.property_values.insert(name.to_string(), value);
    }

    pub fn results(&self) -> &BTreeMap<String, Option<f64>> {
        &self.results
    }

    /// Consume the context, returning node ratings and property values.
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<String, Option<f64>>,
        BTreeMap<String, PropertyValue>,
    ) {
        (self.results, self.property_values)
    }
}
