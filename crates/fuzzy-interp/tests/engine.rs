//! Integration tests for the engine facade and tree evaluation.

mod common;

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use approx::assert_relative_eq;
use fuzzy_interp::interpreter::parse_catalog_json;
use fuzzy_interp::{
    CatalogData, CatalogLoader, ConfigurationError, Engine, EngineConfig, EngineError,
    InterpretationId, JsonCatalogLoader, MissingDataPolicy, PropertyData, RatingClass,
    RatingTable, RatingThreshold, property_data,
};

fn engine() -> Engine {
    engine_with(EngineConfig::default())
}

fn engine_with(config: EngineConfig) -> Engine {
    Engine::new(JsonCatalogLoader::from_json(common::CATALOG), config).unwrap()
}

/// One evaluation per property plus the given rules.
fn catalog(rules: &str) -> CatalogData {
    let json = format!(
        r#"{{
            "properties": [
                {{"id": "p1", "name": "a"}},
                {{"id": "p2", "name": "b"}},
                {{"id": "p3", "name": "texture"}}
            ],
            "evaluations": [
                {{"id": "e1", "name": "A", "propertyName": "a",
                  "points": [{{"x": 0, "y": 0}}, {{"x": 10, "y": 1}}]}},
                {{"id": "e2", "name": "B", "propertyName": "b",
                  "points": [{{"x": 0, "y": 0}}, {{"x": 10, "y": 1}}]}},
                {{"id": "e3", "name": "Sandy", "propertyName": "texture",
                  "type": "crisp", "crispExpression": "= 'sand'"}}
            ],
            "rules": {rules}
        }}"#
    );
    parse_catalog_json(&json, "test").unwrap()
}

fn and_of_a_b(config: EngineConfig) -> Engine {
    let data = catalog(
        r#"[{"id": "r1", "name": "Both", "nodes": [
            {"levelName": "Both"},
            {"levelName": "  AND"},
            {"levelName": "    A", "refId": "A"},
            {"levelName": "    B", "refId": "B"}
        ]}]"#,
    );
    Engine::from_data(data, config).unwrap()
}

fn hedged(hedge: &str) -> Engine {
    let data = catalog(&format!(
        r#"[{{"id": "r1", "name": "Hedged", "nodes": [
            {{"levelName": "Hedged"}},
            {{"levelName": "  AND"}},
            {{"levelName": "    A", "refId": "A"}},
            {{"levelName": "    Guard", "nodeKind": "{hedge}"}},
            {{"levelName": "      B", "refId": "B"}}
        ]}}]"#
    ));
    Engine::from_data(data, EngineConfig::default()).unwrap()
}

// =========================================================================
// Evaluation
// =========================================================================

#[test]
fn evaluates_fixture() {
    let result = engine()
        .evaluate(
            "Dwellings",
            &property_data! {
                "slope" => 5.0,
                "flooding frequency" => "Frequent",
                "depth to bedrock" => 100.0,
            },
        )
        .unwrap();
    assert_eq!(result.interpretation, "Dwellings");
    assert_eq!(result.rating, Some(1.0));
    assert_eq!(result.rating_class, RatingClass::VerySevere);
    assert_eq!(result.node_rating("0.0.0"), Some(0.5));
    assert_eq!(result.node_rating("0.0.2"), Some(0.5));
}

#[test]
fn end_to_end_linear_curve() {
    let engine = and_of_a_b(EngineConfig::default());
    let rate = |a: f64| {
        engine
            .evaluate("Both", &property_data! { "a" => a, "b" => 10.0 })
            .unwrap()
            .rating
    };
    assert_eq!(rate(5.0), Some(0.5));
    assert_eq!(rate(-5.0), Some(0.0));
    assert_eq!(rate(15.0), Some(1.0));
}

#[test]
fn and_takes_minimum() {
    let result = and_of_a_b(EngineConfig::default())
        .evaluate("Both", &property_data! { "a" => 3.0, "b" => 7.0 })
        .unwrap();
    assert_relative_eq!(result.rating.unwrap(), 0.3);
    assert_eq!(result.rating_class, RatingClass::Moderate);
}

#[test]
fn node_results_are_keyed() {
    let result = and_of_a_b(EngineConfig::default())
        .evaluate("Both", &property_data! { "a" => 2.0, "b" => 6.0 })
        .unwrap();
    let keys: Vec<&str> = result.evaluation_results.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["0", "0.0", "0.0.0", "0.0.1"]);
    assert_relative_eq!(result.node_rating("0.0.1").unwrap(), 0.6);
}

#[test]
fn consumed_property_values_are_recorded() {
    let result = and_of_a_b(EngineConfig::default())
        .evaluate("Both", &property_data! { "a" => 2.0, "b" => 6.0, "unused" => 1.0 })
        .unwrap();
    let names: Vec<&str> = result.property_values.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn data_may_be_keyed_by_property_id() {
    let result = and_of_a_b(EngineConfig::default())
        .evaluate("Both", &property_data! { "p1" => 4.0, "p2" => 8.0 })
        .unwrap();
    assert_relative_eq!(result.rating.unwrap(), 0.4);
}

#[test]
fn unknown_interpretation_suggests() {
    match engine().evaluate("Dwelings", &PropertyData::new()) {
        Err(EngineError::InterpretationNotFound { name, suggestions }) => {
            assert_eq!(name, "Dwelings");
            assert_eq!(suggestions, vec!["Dwellings"]);
        }
        other => panic!("expected InterpretationNotFound, got {other:?}"),
    }
}

#[test]
fn text_for_numeric_curve_is_invalid_data() {
    let err = and_of_a_b(EngineConfig::default())
        .evaluate("Both", &property_data! { "a" => "steep", "b" => 1.0 })
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidPropertyData { .. }));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn evaluate_by_id() {
    let engine = engine();
    let data = property_data! { "slope" => 10.0 };
    let by_id = engine
        .evaluate_by_id(InterpretationId::from_name("Dwellings"), &data)
        .unwrap();
    let by_name = engine.evaluate("Dwellings", &data).unwrap();
    assert_eq!(by_id.rating, by_name.rating);
    assert!(matches!(
        engine.evaluate_by_id(InterpretationId::from_name("Roads"), &data),
        Err(EngineError::InterpretationNotFound { .. })
    ));
}

// =========================================================================
// Missing Data
// =========================================================================

#[test]
fn missing_property_makes_and_not_rated() {
    let result = and_of_a_b(EngineConfig::default())
        .evaluate("Both", &property_data! { "b" => 7.0 })
        .unwrap();
    assert_eq!(result.rating, None);
    assert_eq!(result.rating_class, RatingClass::NotRated);
    assert!(!result.is_rated());
    assert_eq!(result.evaluation_results.get("0.0.0"), Some(&None));
    assert_relative_eq!(result.node_rating("0.0.1").unwrap(), 0.7);
}

#[test]
fn explicit_null_is_the_same_as_absent() {
    let engine = and_of_a_b(EngineConfig::default());
    let absent = engine.evaluate("Both", &property_data! { "b" => 7.0 }).unwrap();
    let null = engine
        .evaluate("Both", &property_data! { "a" => None::<f64>, "b" => 7.0 })
        .unwrap();
    assert_eq!(absent.rating, null.rating);
}

#[test]
fn ignore_policy_combines_rated_children() {
    let config = EngineConfig::builder()
        .missing_data(MissingDataPolicy::Ignore)
        .build();
    let result = and_of_a_b(config)
        .evaluate("Both", &property_data! { "b" => 7.0 })
        .unwrap();
    assert_relative_eq!(result.rating.unwrap(), 0.7);
}

#[test]
fn null_or_substitutes_zero() {
    let result = hedged("null_or")
        .evaluate("Hedged", &property_data! { "a" => 4.0 })
        .unwrap();
    assert_eq!(result.rating, Some(0.0));
}

#[test]
fn not_null_and_substitutes_one() {
    let result = hedged("not_null_and")
        .evaluate("Hedged", &property_data! { "a" => 4.0 })
        .unwrap();
    assert_relative_eq!(result.rating.unwrap(), 0.4);
}

#[test]
fn null_not_rated_vetoes_even_when_ignoring() {
    let data = catalog(
        r#"[{"id": "r1", "name": "Veto", "nodes": [
            {"levelName": "Veto"},
            {"levelName": "  OR"},
            {"levelName": "    A", "refId": "A"},
            {"levelName": "    Required", "nodeKind": "null_not_rated"},
            {"levelName": "      B", "refId": "B"}
        ]}]"#,
    );
    let config = EngineConfig::builder()
        .missing_data(MissingDataPolicy::Ignore)
        .build();
    let engine = Engine::from_data(data, config).unwrap();

    let vetoed = engine.evaluate("Veto", &property_data! { "a" => 9.0 }).unwrap();
    assert_eq!(vetoed.rating, None);
    assert_eq!(vetoed.rating_class, RatingClass::NotRated);

    let rated = engine
        .evaluate("Veto", &property_data! { "a" => 9.0, "b" => 2.0 })
        .unwrap();
    assert_relative_eq!(rated.rating.unwrap(), 0.9);
}

#[test]
fn crisp_leaf_in_tree() {
    let data = catalog(
        r#"[{"id": "r1", "name": "Sand", "nodes": [
            {"levelName": "Sand"},
            {"levelName": "  NOT"},
            {"levelName": "    Is sandy", "refId": "Sandy"}
        ]}]"#,
    );
    let engine = Engine::from_data(data, EngineConfig::default()).unwrap();
    let rate = |texture: &str| {
        engine
            .evaluate("Sand", &property_data! { "texture" => texture })
            .unwrap()
            .rating
    };
    assert_eq!(rate("SAND"), Some(0.0));
    assert_eq!(rate("clay"), Some(1.0));
}

// =========================================================================
// Sub-rules
// =========================================================================

#[test]
fn sub_rule_nodes_are_prefixed() {
    let result = engine()
        .evaluate(
            "Dwellings",
            &property_data! {
                "slope" => 0.0,
                "flooding frequency" => "occasional",
                "depth to bedrock" => 150.0,
            },
        )
        .unwrap();
    assert_eq!(result.node_rating("0.0.1"), Some(1.0));
    assert_eq!(result.node_rating("0.0.1/0"), Some(1.0));
    assert_eq!(result.node_rating("0.0.1/0.0"), Some(1.0));
    assert_eq!(result.rating, Some(1.0));
}

#[test]
fn sub_rule_depth_is_limited() {
    let engine = engine_with(EngineConfig::builder().max_depth(1).build());
    let err = engine
        .evaluate("Dwellings", &property_data! { "slope" => 1.0 })
        .unwrap_err();
    match &err {
        EngineError::Evaluation { node, message } => {
            assert_eq!(node, "0.0.1");
            assert!(message.contains("depth"), "{message}");
        }
        other => panic!("expected Evaluation error, got {other:?}"),
    }
    assert_eq!(err.status_code(), 500);
}

// =========================================================================
// Catalog Queries
// =========================================================================

#[test]
fn required_properties_and_rule_tree() {
    let engine = engine();
    let names: Vec<String> = engine
        .required_properties("Dwellings")
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["slope", "flooding frequency", "depth to bedrock"]);

    let tree = engine.rule_tree("Dwellings").unwrap();
    assert_eq!(tree[0].children[0].children.len(), 3);
    assert!(matches!(
        engine.rule_tree("Nope"),
        Err(EngineError::InterpretationNotFound { .. })
    ));
    assert_eq!(engine.interpretation_names(), vec!["Flood Hazard", "Dwellings"]);
}

#[test]
fn custom_rating_table() {
    let table = RatingTable::new(vec![
        RatingThreshold::new(0.0, RatingClass::Slight),
        RatingThreshold::new(0.9, RatingClass::Severe),
    ])
    .unwrap();
    let engine = and_of_a_b(EngineConfig::builder().rating_thresholds(table).build());
    let result = engine
        .evaluate("Both", &property_data! { "a" => 8.0, "b" => 8.0 })
        .unwrap();
    assert_eq!(result.rating_class, RatingClass::Slight);
}

// =========================================================================
// Cache and Batch
// =========================================================================

#[test]
fn repeated_evaluation_hits_cache() {
    let engine = engine();
    let data = property_data! { "slope" => 3.0 };
    let first = engine.evaluate("Dwellings", &data).unwrap();
    let second = engine.evaluate("Dwellings", &data).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let stats = engine.cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
    assert_relative_eq!(stats.hit_rate, 0.5);

    engine.clear_cache();
    assert_eq!(engine.cache_stats().size, 0);
}

#[test]
fn nan_input_bypasses_cache() {
    let engine = engine();
    let data = property_data! { "flooding frequency" => "rare", "slope" => f64::NAN };
    assert!(engine.evaluate("Dwellings", &data).is_err());
    assert_eq!(engine.cache_stats().misses, 0);
}

#[test]
fn disabled_cache_stores_nothing() {
    let engine = engine_with(EngineConfig::builder().cache_max_size(0).build());
    let data = property_data! { "slope" => 3.0 };
    let first = engine.evaluate("Dwellings", &data).unwrap();
    let second = engine.evaluate("Dwellings", &data).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(engine.cache_stats().size, 0);
}

#[test]
fn batch_keeps_order_and_isolates_failures() {
    let engine = and_of_a_b(EngineConfig::default());
    let records = vec![
        property_data! { "a" => 2.0, "b" => 9.0 },
        property_data! { "a" => "oops", "b" => 9.0 },
        property_data! { "a" => 9.0, "b" => 4.0 },
        property_data! { "b" => 4.0 },
    ];
    let results = engine.batch_evaluate("Both", &records);
    assert_eq!(results.len(), 4);
    assert_relative_eq!(results[0].as_ref().unwrap().rating.unwrap(), 0.2);
    assert!(matches!(
        results[1],
        Err(EngineError::InvalidPropertyData { .. })
    ));
    assert_relative_eq!(results[2].as_ref().unwrap().rating.unwrap(), 0.4);
    assert_eq!(results[3].as_ref().unwrap().rating, None);
}

/// Serves fixed catalog data and counts how often it was asked to.
struct CountingLoader {
    data: CatalogData,
    loads: Arc<AtomicUsize>,
}

impl CatalogLoader for CountingLoader {
    fn load_catalog(&self) -> Result<CatalogData, ConfigurationError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.clone())
    }
}

#[test]
fn batch_uses_one_catalog_snapshot() {
    let loads = Arc::new(AtomicUsize::new(0));
    let loader = CountingLoader {
        data: catalog(
            r#"[{"id": "r1", "name": "OnlyA", "nodes": [
                {"levelName": "OnlyA"}, {"levelName": "  A", "refId": "A"}]}]"#,
        ),
        loads: Arc::clone(&loads),
    };
    let config = EngineConfig::builder().catalog_ttl_secs(0).build();
    let engine = Engine::new(loader, config).unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    let records: Vec<PropertyData> = (0..16)
        .map(|i| property_data! { "a" => f64::from(i) })
        .collect();
    let results = engine.batch_evaluate("OnlyA", &records);
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test]
fn batch_with_unknown_interpretation_fails_every_record() {
    let records = vec![PropertyData::new(), PropertyData::new()];
    let results = engine().batch_evaluate("Nope", &records);
    assert!(results.iter().all(Result::is_err));
}

// =========================================================================
// Reload
// =========================================================================

const SMALL: &str = r#"{
    "properties": [{"id": "p1", "name": "slope"}],
    "evaluations": [{"id": "e1", "name": "Slope", "propertyName": "slope",
        "points": [{"x": 0, "y": 0}, {"x": 10, "y": 1}]}],
    "rules": [{"id": "r1", "name": "Steep", "nodes": [
        {"levelName": "Steep"}, {"levelName": "  Slope", "refId": "Slope"}]}]
}"#;

#[test]
fn reload_swaps_catalog_and_clears_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    fs::write(&path, SMALL).unwrap();

    let engine = Engine::new(JsonCatalogLoader::from_path(&path), EngineConfig::default()).unwrap();
    let data = property_data! { "slope" => 5.0 };
    assert_eq!(engine.evaluate("Steep", &data).unwrap().rating, Some(0.5));
    assert_eq!(engine.cache_stats().size, 1);

    fs::write(&path, SMALL.replace(r#""x": 10"#, r#""x": 20"#)).unwrap();
    engine.reload().unwrap();
    assert_eq!(engine.cache_stats().size, 0);
    assert_eq!(engine.evaluate("Steep", &data).unwrap().rating, Some(0.25));
}

/// `SMALL` with a hundred thousand leaves under one AND, so evaluation
/// takes a while.
fn wide_catalog(upper: u32) -> String {
    let leaves: Vec<String> = (0..100_000)
        .map(|i| format!(r#"{{"levelName": "    Slope {i}", "refId": "Slope"}}"#))
        .collect();
    format!(
        r#"{{
            "properties": [{{"id": "p1", "name": "slope"}}],
            "evaluations": [{{"id": "e1", "name": "Slope", "propertyName": "slope",
                "points": [{{"x": 0, "y": 0}}, {{"x": {upper}, "y": 1}}]}}],
            "rules": [{{"id": "r1", "name": "Steep", "nodes": [
                {{"levelName": "Steep"}}, {{"levelName": "  AND"}}, {}]}}]
        }}"#,
        leaves.join(",")
    )
}

#[test]
fn result_from_replaced_catalog_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    fs::write(&path, wide_catalog(10)).unwrap();

    let engine = Arc::new(
        Engine::new(JsonCatalogLoader::from_path(&path), EngineConfig::default()).unwrap(),
    );
    let data = property_data! { "slope" => 5.0 };

    let in_flight = {
        let engine = Arc::clone(&engine);
        let data = data.clone();
        thread::spawn(move || engine.evaluate("Steep", &data).map(|r| r.rating))
    };
    thread::sleep(Duration::from_millis(30));
    fs::write(&path, wide_catalog(20)).unwrap();
    engine.reload().unwrap();
    assert!(in_flight.join().unwrap().unwrap().is_some());

    assert_eq!(engine.evaluate("Steep", &data).unwrap().rating, Some(0.25));
}

#[test]
fn failed_reload_keeps_previous_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    fs::write(&path, SMALL).unwrap();

    let engine = Engine::new(JsonCatalogLoader::from_path(&path), EngineConfig::default()).unwrap();
    fs::write(&path, "{ not json").unwrap();
    assert!(engine.reload().is_err());
    assert_eq!(engine.interpretation_names(), vec!["Steep"]);
}

#[test]
fn catalog_ttl_triggers_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    fs::write(&path, SMALL).unwrap();

    let config = EngineConfig::builder().catalog_ttl_secs(0).build();
    let engine = Engine::new(JsonCatalogLoader::from_path(&path), config).unwrap();
    assert_eq!(engine.interpretation_names(), vec!["Steep"]);

    fs::write(&path, SMALL.replace("Steep", "Gentle")).unwrap();
    thread::sleep(Duration::from_millis(5));
    assert_eq!(engine.interpretation_names(), vec!["Gentle"]);
}

#[test]
fn config_from_json() {
    let config = EngineConfig::from_json(
        r#"{"cache_max_size": 10, "missing_data": "ignore", "rating_thresholds": [
            {"threshold": 0.0, "class": "slight"},
            {"threshold": 0.5, "class": "severe"}
        ]}"#,
    )
    .unwrap();
    assert_eq!(config.cache_max_size, 10);
    assert_eq!(config.missing_data, MissingDataPolicy::Ignore);
    assert_eq!(config.rating_thresholds.thresholds().len(), 2);
    assert_eq!(config.cache_ttl_secs, 3600);

    let err = EngineConfig::from_json(
        r#"{"rating_thresholds": [{"threshold": 0.5, "class": "slight"},
            {"threshold": 0.1, "class": "severe"}]}"#,
    );
    assert!(err.is_err());
}
