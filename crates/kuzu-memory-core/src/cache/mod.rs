//! Cache Layer (C10)
//!
//! Bounded LRU cache over recall results, keyed by query text + filter
//! fingerprint. A monotonic version counter invalidates every entry the
//! moment a new memory is written, so a cache hit never serves a result
//! that predates data the caller just stored (§4.9).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::memory::ScoredMemory;
use crate::recall::StrategyChoice;

struct Entry {
    memories: Vec<ScoredMemory>,
    degraded: bool,
    inserted_at: Instant,
    version: u64,
}

/// A recall-result cache bounded by entry count and staleness (§4.9).
pub struct RecallCache {
    inner: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
    version: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RecallCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = std::num::NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
            version: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Build the key a query maps to: normalized prompt, result limit,
    /// strategy, and filter fingerprint — deliberately *not* the render
    /// format, since this cache stores the scored-memory list and the
    /// same list can be rendered in any format on a hit (§4.9).
    pub fn key(normalized_prompt: &str, max: usize, strategy: StrategyChoice, filter_fingerprint: &str) -> String {
        format!("{normalized_prompt}::{max}::{strategy:?}::{filter_fingerprint}")
    }

    /// A fresh hit, or `None` on a miss (absent, expired, or stale
    /// version).
    pub fn get(&self, key: &str) -> Option<(Vec<ScoredMemory>, bool)> {
        let mut cache = self.inner.lock().unwrap();
        let current_version = self.version.load(Ordering::Acquire);

        if let Some(entry) = cache.get(key) {
            let fresh = entry.inserted_at.elapsed() < self.ttl && entry.version == current_version;
            if fresh {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some((entry.memories.clone(), entry.degraded));
            }
            cache.pop(key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn put(&self, key: String, memories: Vec<ScoredMemory>, degraded: bool) {
        let version = self.version.load(Ordering::Acquire);
        let mut cache = self.inner.lock().unwrap();
        cache.put(
            key,
            Entry {
                memories,
                degraded,
                inserted_at: Instant::now(),
                version,
            },
        );
    }

    /// Invalidate every cached entry. Called whenever the store is
    /// written to (§4.9: "writes invalidate the whole cache, not just a
    /// matching key" — memory writes can surface in recall results for
    /// queries unrelated to the written content via entity/temporal
    /// strategies, so per-key invalidation would under-invalidate).
    pub fn invalidate_all(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
