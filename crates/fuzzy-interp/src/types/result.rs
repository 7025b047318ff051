use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::PropertyValue;

/// Ordinal class label for a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RatingClass {
    #[serde(rename = "not rated")]
    NotRated,
    #[serde(rename = "slight")]
    Slight,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "severe")]
    Severe,
    #[serde(rename = "very severe")]
    VerySevere,
}

impl RatingClass {
    pub fn label(self) -> &'static str {
        match self {
            RatingClass::NotRated => "not rated",
            RatingClass::Slight => "slight",
            RatingClass::Moderate => "moderate",
            RatingClass::Severe => "severe",
            RatingClass::VerySevere => "very severe",
        }
    }
}

impl Display for RatingClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The outcome of evaluating one interpretation for one subject.
///
/// Results are shared behind an `Arc` once produced and cached; they are
/// never modified after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretationResult {
    pub interpretation: String,
    /// Overall rating in `[0, 1]`, or `None` when not rated.
    pub rating: Option<f64>,
    pub rating_class: RatingClass,
    /// The property values the evaluation consumed, keyed by property name.
    pub property_values: BTreeMap<String, PropertyValue>,
    /// Per-node ratings keyed by node key; `None` marks a not-rated node.
    pub evaluation_results: BTreeMap<String, Option<f64>>,
    pub timestamp: SystemTime,
}

impl InterpretationResult {
    pub fn is_rated(&self) -> bool {
        self.rating.is_some()
    }

    /// The recorded rating of a single node, flattening "not rated" and
    /// "unknown key" into `None`.
    pub fn node_rating(&self, key: &str) -> Option<f64> {
        self.evaluation_results.get(key).copied().flatten()
    }
}
