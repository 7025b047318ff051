//! Rating classification: numeric rating to ordinal class.

use serde::{Deserialize, Serialize};

use crate::interpreter::ConfigurationError;
use crate::types::RatingClass;

/// A class that applies from `threshold` upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingThreshold {
    pub threshold: f64,
    pub class: RatingClass,
}

impl RatingThreshold {
    pub fn new(threshold: f64, class: RatingClass) -> Self {
        Self { threshold, class }
    }
}

/// A non-empty, strictly ascending threshold table.
///
/// Serialized as a plain array of `{threshold, class}` objects; deserializing
/// an invalid table fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RatingThreshold>", into = "Vec<RatingThreshold>")]
pub struct RatingTable {
    thresholds: Vec<RatingThreshold>,
}

impl RatingTable {
    /// Validate and build a table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::RatingTable`] if the table is empty, a
    /// threshold is not finite or not greater than its predecessor, or an
    /// entry uses the reserved "not rated" class.
    pub fn new(thresholds: Vec<RatingThreshold>) -> Result<Self, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::RatingTable { reason };

        if thresholds.is_empty() {
            return Err(invalid("table is empty".to_string()));
        }
        if let Some(bad) = thresholds.iter().find(|t| !t.threshold.is_finite()) {
            return Err(invalid(format!("threshold {} is not finite", bad.threshold)));
        }
        if thresholds.iter().any(|t| t.class == RatingClass::NotRated) {
            return Err(invalid("'not rated' cannot be assigned to a threshold".to_string()));
        }
        if let Some(pair) = thresholds
            .windows(2)
            .find(|pair| pair[1].threshold <= pair[0].threshold)
        {
            return Err(invalid(format!(
                "thresholds must ascend, found {} after {}",
                pair[1].threshold, pair[0].threshold
            )));
        }
        Ok(Self { thresholds })
    }

    /// The class with the greatest threshold `<= rating`.
    ///
    /// `None` and NaN are [`RatingClass::NotRated`]. A rating below the
    /// lowest threshold takes the lowest class.
    pub fn classify(&self, rating: Option<f64>) -> RatingClass {
        let Some(rating) = rating.filter(|r| !r.is_nan()) else {
            return RatingClass::NotRated;
        };
        self.thresholds
            .iter()
            .take_while(|t| t.threshold <= rating)
            .last()
            .or_else(|| self.thresholds.first())
            .map_or(RatingClass::NotRated, |t| t.class)
    }

    pub fn thresholds(&self) -> &[RatingThreshold] {
        &self.thresholds
    }
}

impl Default for RatingTable {
    fn default() -> Self {
        Self {
            thresholds: vec![
                RatingThreshold::new(0.0, RatingClass::Slight),
                RatingThreshold::new(0.25, RatingClass::Moderate),
                RatingThreshold::new(0.5, RatingClass::Severe),
                RatingThreshold::new(0.75, RatingClass::VerySevere),
            ],
        }
    }
}

impl TryFrom<Vec<RatingThreshold>> for RatingTable {
    type Error = ConfigurationError;

    fn try_from(thresholds: Vec<RatingThreshold>) -> Result<Self, Self::Error> {
        Self::new(thresholds)
    }
}

impl From<RatingTable> for Vec<RatingThreshold> {
    fn from(table: RatingTable) -> Self {
        table.thresholds
    }
}
