//! Engine configuration.

use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::interpreter::ConfigurationError;
use crate::interpreter::loader::json_error;
use crate::interpreter::rating::RatingTable;

/// How operators treat children that are not rated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDataPolicy {
    /// A not-rated child makes its operator parent not rated, unless a
    /// null-handling hedge substituted a value below it.
    #[default]
    Propagate,
    /// Operators combine only the rated children.
    Ignore,
}

/// Settings for an [`Engine`](crate::Engine).
///
/// Build with [`EngineConfig::builder`] or deserialize from JSON; every
/// field is optional in JSON and falls back to its default.
///
/// # Example
///
/// ```
/// use fuzzy_interp::{EngineConfig, MissingDataPolicy};
///
/// let config = EngineConfig::builder()
///     .cache_max_size(50)
///     .missing_data(MissingDataPolicy::Ignore)
///     .build();
///
/// assert_eq!(config.cache_max_size, 50);
/// assert_eq!(config.max_depth, 64);
/// assert!(config.clamp_spline);
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of cached results; 0 disables the cache.
    #[builder(default = 1000)]
    pub cache_max_size: usize,

    /// Lifetime of a cached result, in seconds.
    #[builder(default = 3600)]
    pub cache_ttl_secs: u64,

    /// Reload the catalog from its loader once it is this old.
    pub catalog_ttl_secs: Option<u64>,

    /// Clamp spline curves into `[0, 1]`.
    #[builder(default = true)]
    pub clamp_spline: bool,

    #[builder(default)]
    pub missing_data: MissingDataPolicy,

    /// Maximum sub-rule nesting depth.
    #[builder(default = 64)]
    pub max_depth: usize,

    #[builder(default)]
    pub rating_thresholds: RatingTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::builder().build()
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Json`] for malformed JSON or an invalid
    /// rating table.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| json_error("<config>", &e))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn catalog_ttl(&self) -> Option<Duration> {
        self.catalog_ttl_secs.map(Duration::from_secs)
    }
}
