//! Result cache with LRU and TTL eviction.
//!
//! Entries are keyed by interpretation name plus the property data
//! serialized with sorted keys, so two maps with the same contents share an
//! entry. Recency is the insertion order of an [`IndexMap`]: a hit moves the
//! entry to the back, and an insert into a full cache evicts the front.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::Serialize;

use crate::types::{InterpretationResult, PropertyData, PropertyValue};

/// A cached result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: Arc<InterpretationResult>,
    /// When the entry was stored.
    pub timestamp: Instant,
    /// Number of times the entry was served.
    pub hits: u64,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
    /// Entries dropped because their TTL passed.
    pub expirations: u64,
    pub size: usize,
    pub max_size: usize,
    pub hit_rate: f64,
}

/// A bounded cache of interpretation results.
#[derive(Debug)]
pub struct ResultCache {
    entries: IndexMap<String, CacheEntry>,
    max_size: usize,
    ttl: Duration,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl ResultCache {
    /// Create a cache holding at most `max_size` entries for `ttl` each.
    ///
    /// A `max_size` of 0 stores nothing.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: IndexMap::new(),
            max_size,
            ttl,
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    /// The cache key for an interpretation and its input data.
    pub fn cache_key(name: &str, data: &PropertyData) -> String {
        let ordered: BTreeMap<&str, &PropertyValue> =
            data.iter().map(|(k, v)| (k.as_str(), v)).collect();
        let encoded = serde_json::to_string(&ordered).unwrap_or_default();
        format!("{name}\u{1f}{encoded}")
    }

    pub fn get(&mut self, name: &str, data: &PropertyData) -> Option<Arc<InterpretationResult>> {
        self.get_at(name, data, Instant::now())
    }

    /// Look up an entry as of `now`.
    ///
    /// An expired entry is removed and counts as a miss.
    pub fn get_at(
        &mut self,
        name: &str,
        data: &PropertyData,
        now: Instant,
    ) -> Option<Arc<InterpretationResult>> {
        let key = Self::cache_key(name, data);
        let Some(mut entry) = self.entries.shift_remove(&key) else {
            self.misses += 1;
            return None;
        };
        if self.is_expired(&entry, now) {
            self.misses += 1;
            self.expirations += 1;
            return None;
        }

        entry.hits += 1;
        self.hits += 1;
        let result = Arc::clone(&entry.result);
        self.entries.insert(key, entry);
        Some(result)
    }

    pub fn set(&mut self, name: &str, data: &PropertyData, result: Arc<InterpretationResult>) {
        self.set_at(name, data, result, Instant::now());
    }

    /// Store an entry as of `now`, evicting the least recently used entry
    /// if the cache is full.
    pub fn set_at(
        &mut self,
        name: &str,
        data: &PropertyData,
        result: Arc<InterpretationResult>,
        now: Instant,
    ) {
        if self.max_size == 0 {
            return;
        }
        let key = Self::cache_key(name, data);
        self.entries.shift_remove(&key);
        if self.entries.len() >= self.max_size && self.entries.shift_remove_index(0).is_some() {
            self.evictions += 1;
        }
        self.entries.insert(
            key,
            CacheEntry {
                result,
                timestamp: now,
                hits: 0,
            },
        );
    }

    pub fn prune(&mut self) -> usize {
        self.prune_at(Instant::now())
    }

    /// Remove every entry expired as of `now`, returning how many.
    pub fn prune_at(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.timestamp) < ttl);
        let removed = before - self.entries.len();
        self.expirations += removed as u64;
        removed
    }

    /// Drop all entries and reset the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
        self.expirations = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        };
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
            size: self.entries.len(),
            max_size: self.max_size,
            hit_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The stored entry for a key, without touching recency or counters.
    pub fn peek(&self, name: &str, data: &PropertyData) -> Option<&CacheEntry> {
        self.entries.get(&Self::cache_key(name, data))
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.timestamp) >= self.ttl
    }
}
