//! Fuzzy interpretation engine.
//!
//! Evaluates hierarchical fuzzy-logic rule trees (operators, hedges and
//! evaluation curves) against property values for one subject, producing a
//! rating in `[0, 1]`, an ordinal class and per-node intermediate ratings.

pub mod interpreter;
pub mod parser;
pub mod types;

pub use interpreter::{
    CacheStats, Catalog, CatalogData, CatalogLoader, ConfigurationError, Engine, EngineConfig,
    EngineError, JsonCatalogLoader, MissingDataPolicy, RatingTable, RatingThreshold, ResultCache,
    StaticCatalogLoader, compute_suggestions,
};
pub use types::{
    Evaluation, EvaluationDefinition, EvaluationPoint, HierarchicalRuleNode, Interpolation,
    InterpretationId, InterpretationResult, InterpretationTree, NodeKind, Property, PropertyData,
    PropertyValue, RatingClass, RuleDefinition, RuleNode,
};

pub use fuzzy_interp_semantics::{HedgeId, OperatorId};

/// Creates a [`PropertyData`] map from key-value pairs.
///
/// Values are automatically converted via `Into<PropertyValue>`, so you can
/// pass floats, integers, strings, or `Option`s (where `None` is null).
///
/// # Example
///
/// ```
/// use fuzzy_interp::{property_data, PropertyValue};
///
/// let data = property_data! { "slope" => 12.5, "texture" => "loam", "depth" => None::<f64> };
/// assert_eq!(data.len(), 3);
/// assert_eq!(data["slope"].as_number(), Some(12.5));
/// assert_eq!(data["texture"].as_text(), Some("loam"));
/// assert!(data["depth"].is_null());
/// ```
#[macro_export]
macro_rules! property_data {
    {} => {
        $crate::PropertyData::new()
    };
    { $($key:expr => $value:expr),+ $(,)? } => {
        {
            let mut map = $crate::PropertyData::new();
            $(
                map.insert(
                    $key.to_string(),
                    ::std::convert::Into::<$crate::PropertyValue>::into($value),
                );
            )+
            map
        }
    };
}
