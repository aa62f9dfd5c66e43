//! In-memory result caches.
//!
//! `TtlCache` is a thread-safe LRU with per-entry expiry for analysis
//! results keyed by plain `operation:arg` strings, so a symbol can be
//! invalidated across every operation by substring. `ScanCache` is the
//! coarse per-timeframe slot pair (fetched series, scored output) that
//! absorbs whole-universe rescans inside its validity window.

use crate::domain::timeframe::Timeframe;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a whole-timeframe scan stays servable from memory.
pub const SCAN_CACHE_VALIDITY: Duration = Duration::from_secs(600);

struct Entry<V> {
    value: V,
    expires_at: Instant,
    last_used: u64,
}

struct Shard<V> {
    entries: HashMap<String, Entry<V>>,
    tick: u64,
    hits: u64,
    misses: u64,
}

/// Thread-safe LRU cache with per-entry TTL.
pub struct TtlCache<V> {
    inner: Mutex<Shard<V>>,
    maxsize: usize,
    default_ttl: Duration,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub maxsize: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_pct: f64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(maxsize: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Shard {
                entries: HashMap::new(),
                tick: 0,
                hits: 0,
                misses: 0,
            }),
            maxsize,
            default_ttl,
        }
    }

    /// Fetch a live entry, refreshing its recency. Expired entries are
    /// removed on the way out and count as misses.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut shard = self.inner.lock();
        let now = Instant::now();

        let expired = match shard.entries.get(key) {
            None => {
                shard.misses += 1;
                return None;
            }
            Some(entry) => now > entry.expires_at,
        };
        if expired {
            shard.entries.remove(key);
            shard.misses += 1;
            return None;
        }

        shard.tick += 1;
        let tick = shard.tick;
        shard.hits += 1;
        let entry = shard
            .entries
            .get_mut(key)
            .unwrap_or_else(|| unreachable!("entry checked above"));
        entry.last_used = tick;
        Some(entry.value.clone())
    }

    pub fn set(&self, key: &str, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let mut shard = self.inner.lock();

        while shard.entries.len() >= self.maxsize && !shard.entries.contains_key(key) {
            let oldest = shard
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => shard.entries.remove(&k),
                None => break,
            };
        }

        shard.tick += 1;
        let tick = shard.tick;
        shard.entries.insert(
            key.to_owned(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
                last_used: tick,
            },
        );
    }

    pub fn delete(&self, key: &str) {
        self.inner.lock().entries.remove(key);
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Drop every entry whose key contains `pattern`; answers how many
    /// were dropped.
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let mut shard = self.inner.lock();
        let keys: Vec<String> = shard
            .entries
            .keys()
            .filter(|k| k.contains(pattern))
            .cloned()
            .collect();
        for key in &keys {
            shard.entries.remove(key);
        }
        keys.len()
    }

    pub fn stats(&self) -> CacheStats {
        let shard = self.inner.lock();
        let total = shard.hits + shard.misses;
        CacheStats {
            size: shard.entries.len(),
            maxsize: self.maxsize,
            hits: shard.hits,
            misses: shard.misses,
            hit_rate_pct: if total > 0 {
                shard.hits as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        }
    }

    /// Cache-aside: serve a live entry or run `compute`, storing only a
    /// produced value. `None` results are never cached, so a symbol that
    /// fails once is retried on the next request.
    pub fn get_or_compute<F>(&self, key: &str, compute: F) -> Option<V>
    where
        F: FnOnce() -> Option<V>,
    {
        if let Some(hit) = self.get(key) {
            return Some(hit);
        }
        let value = compute()?;
        self.set(key, value.clone());
        Some(value)
    }
}

struct Slot<D, S> {
    series: Option<D>,
    scored: Option<S>,
    stamp: Option<Instant>,
}

impl<D, S> Slot<D, S> {
    fn empty() -> Self {
        Self {
            series: None,
            scored: None,
            stamp: None,
        }
    }

    fn valid(&self, validity: Duration) -> bool {
        self.stamp.is_some_and(|t| t.elapsed() < validity)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScanSlotStatus {
    pub timeframe: Timeframe,
    pub cached: bool,
    pub age_seconds: u64,
    pub valid: bool,
}

/// One slot per timeframe, each holding the fetched series map and the
/// scored output from the last whole-universe pass. Both share a single
/// timestamp; storing either side refreshes the slot.
pub struct ScanCache<D, S> {
    slots: Mutex<HashMap<Timeframe, Slot<D, S>>>,
    validity: Duration,
}

impl<D: Clone, S: Clone> ScanCache<D, S> {
    pub fn new(validity: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            validity,
        }
    }

    pub fn series(&self, timeframe: Timeframe) -> Option<D> {
        let slots = self.slots.lock();
        slots
            .get(&timeframe)
            .filter(|slot| slot.valid(self.validity))
            .and_then(|slot| slot.series.clone())
    }

    pub fn scored(&self, timeframe: Timeframe) -> Option<S> {
        let slots = self.slots.lock();
        slots
            .get(&timeframe)
            .filter(|slot| slot.valid(self.validity))
            .and_then(|slot| slot.scored.clone())
    }

    pub fn store_series(&self, timeframe: Timeframe, series: D) {
        let mut slots = self.slots.lock();
        let slot = slots.entry(timeframe).or_insert_with(Slot::empty);
        slot.series = Some(series);
        slot.stamp = Some(Instant::now());
    }

    pub fn store_scored(&self, timeframe: Timeframe, scored: S) {
        let mut slots = self.slots.lock();
        let slot = slots.entry(timeframe).or_insert_with(Slot::empty);
        slot.scored = Some(scored);
        slot.stamp = Some(Instant::now());
    }

    pub fn invalidate(&self, timeframe: Timeframe) {
        self.slots.lock().remove(&timeframe);
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    pub fn status(&self) -> Vec<ScanSlotStatus> {
        let slots = self.slots.lock();
        Timeframe::ALL
            .iter()
            .map(|&timeframe| match slots.get(&timeframe) {
                Some(slot) if slot.stamp.is_some() => {
                    let age = slot
                        .stamp
                        .map(|t| t.elapsed().as_secs())
                        .unwrap_or_default();
                    ScanSlotStatus {
                        timeframe,
                        cached: true,
                        age_seconds: age,
                        valid: slot.valid(self.validity),
                    }
                }
                _ => ScanSlotStatus {
                    timeframe,
                    cached: false,
                    age_seconds: 0,
                    valid: false,
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn get_set_and_stats() {
        let cache: TtlCache<u32> = TtlCache::new(10, Duration::from_secs(60));
        assert_eq!(cache.get("a"), None);
        cache.set("a", 1);
        assert_eq!(cache.get("a"), Some(1));

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn expired_entries_read_as_misses() {
        let cache: TtlCache<u32> = TtlCache::new(10, Duration::from_millis(5));
        cache.set("a", 1);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let cache: TtlCache<u32> = TtlCache::new(2, Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);
        // Touch "a" so "b" is the eviction candidate
        assert_eq!(cache.get("a"), Some(1));
        cache.set("c", 3);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn overwrite_at_capacity_keeps_other_keys() {
        let cache: TtlCache<u32> = TtlCache::new(2, Duration::from_secs(60));
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn pattern_invalidation_by_substring() {
        let cache: TtlCache<u32> = TtlCache::new(10, Duration::from_secs(60));
        cache.set("analyze:INFY:daily", 1);
        cache.set("history:INFY", 2);
        cache.set("analyze:TCS:daily", 3);
        assert_eq!(cache.invalidate_pattern("INFY"), 2);
        assert_eq!(cache.get("analyze:TCS:daily"), Some(3));
        assert_eq!(cache.get("history:INFY"), None);
    }

    #[test]
    fn get_or_compute_skips_none() {
        let cache: TtlCache<u32> = TtlCache::new(10, Duration::from_secs(60));
        assert_eq!(cache.get_or_compute("k", || None), None);
        // A failed compute leaves nothing behind; the next call retries
        assert_eq!(cache.get_or_compute("k", || Some(7)), Some(7));
        assert_eq!(cache.get_or_compute("k", || Some(99)), Some(7));
    }

    #[test]
    fn scan_cache_slots_share_a_stamp() {
        let cache: ScanCache<Vec<u32>, String> = ScanCache::new(Duration::from_secs(60));
        assert!(cache.series(Timeframe::Daily).is_none());

        cache.store_series(Timeframe::Daily, vec![1, 2, 3]);
        cache.store_scored(Timeframe::Daily, "scored".into());
        assert_eq!(cache.series(Timeframe::Daily), Some(vec![1, 2, 3]));
        assert_eq!(cache.scored(Timeframe::Daily), Some("scored".into()));
        assert!(cache.series(Timeframe::Weekly).is_none());

        cache.invalidate(Timeframe::Daily);
        assert!(cache.scored(Timeframe::Daily).is_none());
    }

    #[test]
    fn scan_cache_expires_whole_slot() {
        let cache: ScanCache<u32, u32> = ScanCache::new(Duration::from_millis(5));
        cache.store_series(Timeframe::Weekly, 1);
        thread::sleep(Duration::from_millis(20));
        assert!(cache.series(Timeframe::Weekly).is_none());
        let status = cache.status();
        let weekly = status
            .iter()
            .find(|s| s.timeframe == Timeframe::Weekly)
            .unwrap();
        assert!(weekly.cached && !weekly.valid);
    }
}
