//! Integration tests for the result cache.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use fuzzy_interp::{InterpretationResult, PropertyData, RatingClass, ResultCache, property_data};

const TTL: Duration = Duration::from_secs(60);

fn result(rating: f64) -> Arc<InterpretationResult> {
    Arc::new(InterpretationResult {
        interpretation: "Dwellings".to_string(),
        rating: Some(rating),
        rating_class: RatingClass::Slight,
        property_values: BTreeMap::new(),
        evaluation_results: BTreeMap::new(),
        timestamp: SystemTime::now(),
    })
}

fn record(slope: f64) -> PropertyData {
    property_data! { "slope" => slope }
}

// =========================================================================
// Get and Set
// =========================================================================

#[test]
fn set_then_get_returns_same_instance() {
    let mut cache = ResultCache::new(10, TTL);
    let stored = result(0.4);
    cache.set("Dwellings", &record(1.0), Arc::clone(&stored));

    let hit = cache.get("Dwellings", &record(1.0)).unwrap();
    assert!(Arc::ptr_eq(&hit, &stored));
    assert!(cache.get("Dwellings", &record(2.0)).is_none());
    assert!(cache.get("Roads", &record(1.0)).is_none());
}

#[test]
fn key_ignores_insertion_order() {
    let mut forward = PropertyData::new();
    forward.insert("a".to_string(), 1.0.into());
    forward.insert("b".to_string(), "loam".into());
    forward.insert("c".to_string(), None::<f64>.into());
    let reversed = property_data! { "c" => None::<f64>, "b" => "loam", "a" => 1.0 };

    assert_eq!(
        ResultCache::cache_key("Dwellings", &forward),
        ResultCache::cache_key("Dwellings", &reversed)
    );

    let mut cache = ResultCache::new(10, TTL);
    cache.set("Dwellings", &forward, result(0.1));
    assert!(cache.get("Dwellings", &reversed).is_some());
}

#[test]
fn key_distinguishes_types() {
    assert_ne!(
        ResultCache::cache_key("D", &property_data! { "x" => 1.0 }),
        ResultCache::cache_key("D", &property_data! { "x" => "1" })
    );
}

#[test]
fn hits_are_counted_per_entry() {
    let mut cache = ResultCache::new(10, TTL);
    cache.set("Dwellings", &record(1.0), result(0.4));
    cache.get("Dwellings", &record(1.0));
    cache.get("Dwellings", &record(1.0));
    assert_eq!(cache.peek("Dwellings", &record(1.0)).unwrap().hits, 2);
}

// =========================================================================
// Eviction
// =========================================================================

#[test]
fn overflow_evicts_exactly_one_oldest() {
    let mut cache = ResultCache::new(2, TTL);
    cache.set("D", &record(1.0), result(0.1));
    cache.set("D", &record(2.0), result(0.2));
    cache.set("D", &record(3.0), result(0.3));

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().evictions, 1);
    assert!(cache.peek("D", &record(1.0)).is_none());
    assert!(cache.peek("D", &record(3.0)).is_some());
}

#[test]
fn get_refreshes_recency() {
    let mut cache = ResultCache::new(2, TTL);
    cache.set("D", &record(1.0), result(0.1));
    cache.set("D", &record(2.0), result(0.2));
    cache.get("D", &record(1.0));
    cache.set("D", &record(3.0), result(0.3));

    assert!(cache.peek("D", &record(1.0)).is_some());
    assert!(cache.peek("D", &record(2.0)).is_none());
}

#[test]
fn overwriting_a_key_does_not_evict() {
    let mut cache = ResultCache::new(2, TTL);
    cache.set("D", &record(1.0), result(0.1));
    cache.set("D", &record(2.0), result(0.2));
    cache.set("D", &record(2.0), result(0.25));

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().evictions, 0);
    assert_eq!(cache.get("D", &record(2.0)).unwrap().rating, Some(0.25));
}

#[test]
fn zero_capacity_stores_nothing() {
    let mut cache = ResultCache::new(0, TTL);
    cache.set("D", &record(1.0), result(0.1));
    assert!(cache.is_empty());
    assert!(cache.get("D", &record(1.0)).is_none());
    assert_eq!(cache.stats().evictions, 0);
}

// =========================================================================
// Expiry
// =========================================================================

#[test]
fn expired_entry_is_a_miss_and_removed() {
    let mut cache = ResultCache::new(10, TTL);
    let start = Instant::now();
    cache.set_at("D", &record(1.0), result(0.1), start);

    assert!(
        cache
            .get_at("D", &record(1.0), start + Duration::from_secs(30))
            .is_some()
    );
    assert!(cache.get_at("D", &record(1.0), start + TTL).is_none());
    assert!(cache.is_empty());

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.expirations), (1, 1, 1));
}

#[test]
fn prune_removes_only_expired() {
    let mut cache = ResultCache::new(10, TTL);
    let start = Instant::now();
    cache.set_at("D", &record(1.0), result(0.1), start);
    cache.set_at("D", &record(2.0), result(0.2), start + Duration::from_secs(40));

    assert_eq!(cache.prune_at(start + Duration::from_secs(70)), 1);
    assert_eq!(cache.len(), 1);
    assert!(cache.peek("D", &record(2.0)).is_some());
    assert_eq!(cache.stats().expirations, 1);
}

// =========================================================================
// Stats
// =========================================================================

#[test]
fn stats_and_clear() {
    let mut cache = ResultCache::new(5, TTL);
    assert_eq!(cache.stats().hit_rate, 0.0);

    cache.set("D", &record(1.0), result(0.1));
    cache.get("D", &record(1.0));
    cache.get("D", &record(1.0));
    cache.get("D", &record(9.0));

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses), (2, 1));
    assert_eq!((stats.size, stats.max_size), (1, 5));
    assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-12);

    cache.clear();
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (0, 0, 0));
}

#[test]
fn stats_serialize_camel_case() {
    let cache = ResultCache::new(3, TTL);
    let json = serde_json::to_value(cache.stats()).unwrap();
    assert_eq!(json["maxSize"], 3);
    assert_eq!(json["hitRate"], 0.0);
}
