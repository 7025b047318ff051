//! Interpretation engine.
//!
//! This module turns catalog data into validated rule trees and evaluates
//! them: curves map property values to memberships, operators and hedges
//! combine and modify them, and the [`Engine`] ties catalog snapshots,
//! evaluation and the result cache together.

mod cache;
mod catalog;
mod config;
mod context;
mod curve;
mod engine;
mod error;
mod evaluator;
mod hedges;
mod loader;
mod normalizer;
mod operators;
mod rating;

pub use cache::{CacheEntry, CacheStats, ResultCache};
pub use catalog::{Catalog, CatalogData};
pub use config::{EngineConfig, MissingDataPolicy};
pub use context::{EvalContext, EvalOptions};
pub use curve::{
    crisp_matches, evaluate_curve, linear_interpolation, sigmoid_points, spline_interpolation,
    step_function,
};
pub use engine::Engine;
pub use error::{ConfigurationError, EngineError, compute_suggestions};
pub use evaluator::evaluate_tree;
pub use hedges::{apply_hedge, apply_hedge_all, limit_hedge, not_hedge, power_hedge};
pub use loader::{CatalogLoader, JsonCatalogLoader, StaticCatalogLoader, parse_catalog_json};
pub use normalizer::normalize;
pub use operators::{
    apply_operator, combine, fuzzy_and, fuzzy_average, fuzzy_or, fuzzy_product, fuzzy_sum,
    fuzzy_times,
};
pub use rating::{RatingTable, RatingThreshold};
