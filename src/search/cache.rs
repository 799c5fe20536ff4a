//! Query Result Cache
//!
//! Memoizes ranked result lists per normalized query for a fixed lifetime.
//!
//! ## Semantics
//! - **Expiry**: checked lazily on lookup. An expired entry reads as a miss and is evicted.
//! - **Flush**: drops every entry and resets the hit/miss counters.
//! - **Time**: read through the [`Clock`] trait so tests can move time by hand.

use super::types::{CacheStats, SearchOptions};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) > ttl
    }
}

pub struct QueryCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now, self.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries
                .remove_if(key, |_, entry| entry.is_expired(now, self.ttl));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn put(&self, key: String, value: V) {
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
        };
        self.entries.insert(key, entry);
    }

    pub fn flush(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of entries that have not expired yet.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired(now, self.ttl))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            keys: self.len(),
        }
    }
}

/// Key of a ranked search. `options` must already carry its effective limit.
pub fn search_key(query: &str, options: &SearchOptions) -> String {
    fn text(value: &Option<String>) -> String {
        value.as_deref().map(str::to_lowercase).unwrap_or_default()
    }

    format!(
        "search:{}:category={};minRating={};language={};limit={}",
        query.trim().to_lowercase(),
        text(&options.category),
        options.min_rating.map(|r| r.to_string()).unwrap_or_default(),
        text(&options.language),
        options.limit.map(|l| l.to_string()).unwrap_or_default(),
    )
}

pub fn category_key(category: &str) -> String {
    format!("category:{}", category.trim().to_lowercase())
}
