//! Invalidation-aware read cache.
//!
//! The cache is never a source of truth. Clearing it at any point changes
//! only how often the tree is walked, never what a read returns; the engine
//! keeps that true by invalidating every key a mutation can affect.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::clock::Clock;
use crate::node::DirEntry;

/// A cached read result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Listing(Vec<DirEntry>),
    Content(String),
}

/// Hit/miss counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

/// Key/value store with explicit invalidation, injected into the engine.
pub trait Cache {
    /// Look up `key`. Expired entries are misses.
    fn get(&mut self, key: &str) -> Option<CacheValue>;

    fn set(&mut self, key: &str, value: CacheValue, ttl: TimeDelta);

    fn invalidate(&mut self, key: &str);

    fn clear(&mut self);

    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// Cache key for the listing of directory `path`.
pub fn dir_key(path: &str) -> String {
    format!("dir:{path}")
}

/// Cache key for the content of file `name` under directory `parent`.
pub fn file_key(parent: &str, name: &str) -> String {
    format!("file:{parent}/{name}")
}

#[derive(Debug)]
struct CacheEntry {
    value: CacheValue,
    /// `None` when the TTL overflowed the calendar; such entries never expire.
    expires: Option<DateTime<Utc>>,
}

/// TTL cache checked lazily on access. Expired entries are evicted by the
/// `get` that finds them; nothing runs in the background.
pub struct TtlCache {
    entries: HashMap<String, CacheEntry>,
    clock: Rc<dyn Clock>,
    stats: CacheStats,
}

impl TtlCache {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
            stats: CacheStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cache for TtlCache {
    fn get(&mut self, key: &str) -> Option<CacheValue> {
        let now = self.clock.now();
        let fresh = match self.entries.get(key) {
            Some(entry) => entry.expires.is_none_or(|at| now < at),
            None => {
                self.stats.misses += 1;
                log::trace!("cache miss: {key}");
                return None;
            },
        };
        if !fresh {
            self.entries.remove(key);
            self.stats.misses += 1;
            log::trace!("cache expired: {key}");
            return None;
        }
        self.stats.hits += 1;
        log::trace!("cache hit: {key}");
        self.entries.get(key).map(|e| e.value.clone())
    }

    fn set(&mut self, key: &str, value: CacheValue, ttl: TimeDelta) {
        let expires = self.clock.now().checked_add_signed(ttl);
        self.entries
            .insert(key.to_string(), CacheEntry { value, expires });
    }

    fn invalidate(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.stats.invalidations += 1;
            log::trace!("cache invalidate: {key}");
        }
    }

    fn clear(&mut self) {
        self.stats.invalidations += self.entries.len() as u64;
        self.entries.clear();
    }

    fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// A cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&mut self, _key: &str) -> Option<CacheValue> {
        None
    }

    fn set(&mut self, _key: &str, _value: CacheValue, _ttl: TimeDelta) {}

    fn invalidate(&mut self, _key: &str) {}

    fn clear(&mut self) {}
}
