//! The engine facade: catalog snapshot, evaluation and result cache.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};
use std::time::{Instant, SystemTime};

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::interpreter::cache::{CacheStats, ResultCache};
use crate::interpreter::catalog::{Catalog, CatalogData};
use crate::interpreter::config::EngineConfig;
use crate::interpreter::context::{EvalContext, EvalOptions};
use crate::interpreter::error::compute_suggestions;
use crate::interpreter::evaluator::evaluate_tree;
use crate::interpreter::loader::{CatalogLoader, StaticCatalogLoader};
use crate::interpreter::{ConfigurationError, EngineError};
use crate::types::{
    HierarchicalRuleNode, InterpretationId, InterpretationResult, InterpretationTree, Property,
    PropertyData,
};

struct Snapshot {
    catalog: Arc<Catalog>,
    loaded_at: Instant,
    /// Bumped on every successful reload.
    generation: u64,
}

/// Evaluates interpretations against property data.
///
/// The engine owns a catalog snapshot obtained from a [`CatalogLoader`] and
/// a result cache. It is `Send + Sync`; evaluations running while the
/// catalog is reloaded keep the snapshot they started with.
///
/// # Example
///
/// ```
/// use fuzzy_interp::{Engine, EngineConfig, JsonCatalogLoader, RatingClass, property_data};
///
/// let loader = JsonCatalogLoader::from_json(r#"{
///     "properties": [{"id": "p1", "name": "slope"}],
///     "evaluations": [{
///         "id": "e1", "name": "Slope 0 to 10", "propertyName": "slope",
///         "points": [{"x": 0, "y": 0}, {"x": 10, "y": 1}]
///     }],
///     "rules": [{
///         "id": "r1", "name": "Steep Slopes",
///         "nodes": [
///             {"levelName": "Steep Slopes"},
///             {"levelName": "  Slope", "refId": "Slope 0 to 10"}
///         ]
///     }]
/// }"#);
///
/// let engine = Engine::new(loader, EngineConfig::default()).unwrap();
/// let result = engine.evaluate("Steep Slopes", &property_data! { "slope" => 5.0 }).unwrap();
/// assert_eq!(result.rating, Some(0.5));
/// assert_eq!(result.rating_class, RatingClass::Severe);
/// ```
pub struct Engine {
    loader: Box<dyn CatalogLoader>,
    config: EngineConfig,
    snapshot: RwLock<Snapshot>,
    cache: Mutex<ResultCache>,
}

impl Engine {
    /// Load a catalog and create an engine over it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the loader fails or the catalog
    /// does not validate.
    pub fn new(
        loader: impl CatalogLoader + 'static,
        config: EngineConfig,
    ) -> Result<Self, ConfigurationError> {
        let catalog = load(&loader)?;
        let cache = ResultCache::new(config.cache_max_size, config.cache_ttl());
        Ok(Self {
            loader: Box::new(loader),
            snapshot: RwLock::new(Snapshot {
                catalog: Arc::new(catalog),
                loaded_at: Instant::now(),
                generation: 0,
            }),
            cache: Mutex::new(cache),
            config,
        })
    }

    /// Create an engine over in-memory catalog data.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the catalog does not validate.
    pub fn from_data(data: CatalogData, config: EngineConfig) -> Result<Self, ConfigurationError> {
        Self::new(StaticCatalogLoader::new(data), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current catalog snapshot, reloading it first if its TTL passed.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.current().0
    }

    fn current(&self) -> (Arc<Catalog>, u64) {
        self.refresh_if_stale();
        let snapshot = self.read_snapshot();
        (Arc::clone(&snapshot.catalog), snapshot.generation)
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluate one interpretation for one subject.
    ///
    /// Results are cached per interpretation and input data; a cached result
    /// is returned as the same shared instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpretation does not exist, a property
    /// value has the wrong type, or evaluation fails.
    pub fn evaluate(
        &self,
        name: &str,
        data: &PropertyData,
    ) -> Result<Arc<InterpretationResult>, EngineError> {
        let (catalog, generation) = self.current();
        let tree = find_tree(&catalog, name)?;
        self.evaluate_tree(&catalog, generation, tree, data)
    }

    /// Evaluate an interpretation looked up by id.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::evaluate`].
    pub fn evaluate_by_id(
        &self,
        id: InterpretationId,
        data: &PropertyData,
    ) -> Result<Arc<InterpretationResult>, EngineError> {
        let (catalog, generation) = self.current();
        let tree = catalog
            .interpretation_by_id(id)
            .ok_or_else(|| EngineError::InterpretationNotFound {
                name: id.to_string(),
                suggestions: Vec::new(),
            })?;
        self.evaluate_tree(&catalog, generation, tree, data)
    }

    /// Evaluate one interpretation for many subjects in parallel.
    ///
    /// Results are in input order. Every record is rated against the same
    /// catalog snapshot, and a failing record does not affect the others.
    pub fn batch_evaluate(
        &self,
        name: &str,
        records: &[PropertyData],
    ) -> Vec<Result<Arc<InterpretationResult>, EngineError>> {
        let (catalog, generation) = self.current();
        records
            .par_iter()
            .enumerate()
            .map(|(index, data)| {
                let result = find_tree(&catalog, name)
                    .and_then(|tree| self.evaluate_tree(&catalog, generation, tree, data));
                if let Err(e) = &result {
                    warn!(interpretation = name, record = index, error = %e, "batch record failed");
                }
                result
            })
            .collect()
    }

    fn evaluate_tree(
        &self,
        catalog: &Catalog,
        generation: u64,
        tree: &InterpretationTree,
        data: &PropertyData,
    ) -> Result<Arc<InterpretationResult>, EngineError> {
        // NaN serializes like null, so such inputs bypass the cache
        let cacheable = data
            .values()
            .all(|v| v.as_number().is_none_or(f64::is_finite));

        if cacheable {
            if let Some(hit) = self.lock_cache().get(&tree.name, data) {
                debug!(interpretation = %tree.name, "cache hit");
                return Ok(hit);
            }
        }

        let result = Arc::new(self.compute(catalog, tree, data)?);
        debug!(
            interpretation = %tree.name,
            rating = ?result.rating,
            class = %result.rating_class,
            "evaluated"
        );
        if cacheable {
            let mut cache = self.lock_cache();
            // Results from a catalog replaced since `current` are dropped
            if self.read_snapshot().generation == generation {
                cache.set(&tree.name, data, Arc::clone(&result));
            }
        }
        Ok(result)
    }

    fn compute(
        &self,
        catalog: &Catalog,
        tree: &InterpretationTree,
        data: &PropertyData,
    ) -> Result<InterpretationResult, EngineError> {
        let mut ctx = EvalContext::new(data, EvalOptions::from(&self.config));
        let rating = evaluate_tree(tree, &mut ctx, catalog).inspect_err(|e| {
            if let EngineError::Evaluation { node, message } = e {
                error!(interpretation = %tree.name, node = %node, "{message}");
            }
        })?;

        let rating = match rating {
            Some(r) if r.is_nan() => {
                let e = EngineError::Evaluation {
                    node: tree.name.clone(),
                    message: "rating is not a number".to_string(),
                };
                error!(interpretation = %tree.name, "{e}");
                return Err(e);
            }
            Some(r) => Some(r.clamp(0.0, 1.0)),
            None => None,
        };

        let (evaluation_results, property_values) = ctx.into_parts();
        Ok(InterpretationResult {
            interpretation: tree.name.clone(),
            rating,
            rating_class: self.config.rating_thresholds.classify(rating),
            property_values,
            evaluation_results,
            timestamp: SystemTime::now(),
        })
    }

    // =========================================================================
    // Catalog Queries
    // =========================================================================

    /// Properties an interpretation (including its sub-rules) reads.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InterpretationNotFound`] for an unknown name.
    pub fn required_properties(&self, name: &str) -> Result<Vec<Property>, EngineError> {
        let catalog = self.catalog();
        Ok(find_tree(&catalog, name)?.required_properties.clone())
    }

    /// The normalized rule tree of an interpretation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InterpretationNotFound`] for an unknown name.
    pub fn rule_tree(&self, name: &str) -> Result<Vec<HierarchicalRuleNode>, EngineError> {
        let catalog = self.catalog();
        Ok(find_tree(&catalog, name)?.root.clone())
    }

    pub fn interpretation_names(&self) -> Vec<String> {
        self.catalog()
            .interpretation_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    // =========================================================================
    // Cache and Reload
    // =========================================================================

    pub fn cache_stats(&self) -> CacheStats {
        self.lock_cache().stats()
    }

    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    /// Remove expired cache entries, returning how many were removed.
    pub fn prune_cache(&self) -> usize {
        self.lock_cache().prune()
    }

    /// Load a fresh catalog and swap it in, clearing the result cache.
    ///
    /// On failure the current catalog stays in place.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the loader fails or the new
    /// catalog does not validate.
    pub fn reload(&self) -> Result<(), ConfigurationError> {
        let catalog = load(self.loader.as_ref())?;
        {
            let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            snapshot.catalog = Arc::new(catalog);
            snapshot.loaded_at = Instant::now();
            snapshot.generation += 1;
        }
        self.clear_cache();
        Ok(())
    }

    fn refresh_if_stale(&self) {
        let Some(ttl) = self.config.catalog_ttl() else {
            return;
        };
        if self.read_snapshot().loaded_at.elapsed() < ttl {
            return;
        }
        if let Err(e) = self.reload() {
            warn!(source = %self.loader.describe(), error = %e, "catalog reload failed, keeping previous catalog");
            // Retry after another full TTL instead of on every call
            self.snapshot
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .loaded_at = Instant::now();
        }
    }

    fn read_snapshot(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cache(&self) -> MutexGuard<'_, ResultCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load(loader: &dyn CatalogLoader) -> Result<Catalog, ConfigurationError> {
    let data = loader.load_catalog()?;
    let catalog = Catalog::build(data)?;
    info!(
        source = %loader.describe(),
        interpretations = catalog.interpretations().count(),
        evaluations = catalog.evaluations().count(),
        "catalog loaded"
    );
    Ok(catalog)
}

fn find_tree<'a>(catalog: &'a Catalog, name: &str) -> Result<&'a InterpretationTree, EngineError> {
    catalog
        .interpretation(name)
        .ok_or_else(|| EngineError::InterpretationNotFound {
            name: name.to_string(),
            suggestions: compute_suggestions(name, &catalog.interpretation_names()),
        })
}
