//! Result cache (C10, §4.10).
//!
//! Keyed by the content [`Fingerprint`](crate::fingerprint::Fingerprint) of
//! `(OptimizationInput, OptimizationParameters)`. Entries expire after a
//! configurable TTL and the cache evicts least-recently-used entries once
//! `max_entries` is exceeded. At most one computation per key runs at a
//! time: concurrent callers for the same key block on the first caller's
//! result instead of racing the driver (§4.10's single-flight requirement).

use std::collections::{HashMap, VecDeque};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::fingerprint::Fingerprint;
use crate::result::OptimizationResult;

/// Tunables for the cache itself, independent of any one run's parameters.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Cumulative counters a host can inspect to judge whether caching is
/// pulling its weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

enum Slot {
    /// A computation for this key is in progress; waiters block on the
    /// cache's condvar until it resolves to `Ready` or is removed.
    InFlight,
    Ready {
        result: OptimizationResult,
        inserted_at: Instant,
    },
}

struct Inner {
    entries: HashMap<Fingerprint, Slot>,
    /// Most-recently-used keys at the back; used for LRU eviction. Only
    /// `Ready` keys ever appear here.
    lru: VecDeque<Fingerprint>,
    stats: CacheStats,
}

impl Inner {
    fn touch(&mut self, key: &Fingerprint) {
        if let Some(pos) = self.lru.iter().position(|k| k == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key.clone());
    }

    fn evict_if_over_capacity(&mut self, max_entries: usize) {
        while self.lru.len() > max_entries {
            if let Some(oldest) = self.lru.pop_front() {
                self.entries.remove(&oldest);
                self.stats.evictions += 1;
            } else {
                break;
            }
        }
        self.stats.size = self.entries.len();
    }
}

/// The result cache. Cheap to share: wrap in `Arc` if multiple threads need
/// their own handle (the engine keeps one and hands out clones of that
/// `Arc`, not of the cache itself).
pub struct ResultCache {
    config: CacheConfig,
    inner: Mutex<Inner>,
    condvar: Condvar,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                lru: VecDeque::new(),
                stats: CacheStats::default(),
            }),
            condvar: Condvar::new(),
        }
    }

    /// Returns the cached result for `key` if present and unexpired, running
    /// `runner` to produce it otherwise. At most one `runner` executes per
    /// key at a time; other callers for the same key block until it
    /// finishes. Only [`OptimizationResult::is_cacheable`] results are kept;
    /// anything else is returned to its caller but never stored, so the
    /// next call retries the computation.
    pub fn compute_or_get(
        &self,
        key: Fingerprint,
        runner: impl FnOnce() -> OptimizationResult,
    ) -> OptimizationResult {
        let mut guard = self.inner.lock().unwrap();
        loop {
            match guard.entries.get(&key) {
                Some(Slot::Ready { result, inserted_at }) => {
                    if inserted_at.elapsed() < self.config.ttl {
                        let result = result.clone();
                        guard.stats.hits += 1;
                        guard.touch(&key);
                        return result;
                    }
                    // Expired: drop it and fall through to a fresh computation.
                    guard.entries.remove(&key);
                    if let Some(pos) = guard.lru.iter().position(|k| *k == key) {
                        guard.lru.remove(pos);
                    }
                }
                Some(Slot::InFlight) => {
                    guard = self.condvar.wait(guard).unwrap();
                    continue;
                }
                None => {}
            }
            break;
        }

        guard.entries.insert(key.clone(), Slot::InFlight);
        guard.stats.misses += 1;
        drop(guard);

        let result = runner();

        let mut guard = self.inner.lock().unwrap();
        if result.is_cacheable() {
            guard.entries.insert(
                key.clone(),
                Slot::Ready {
                    result: result.clone(),
                    inserted_at: Instant::now(),
                },
            );
            guard.touch(&key);
            guard.evict_if_over_capacity(self.config.max_entries);
        } else {
            guard.entries.remove(&key);
        }
        drop(guard);
        self.condvar.notify_all();
        result
    }

    /// Current cumulative counters, plus the live entry count.
    pub fn stats(&self) -> CacheStats {
        let guard = self.inner.lock().unwrap();
        CacheStats {
            size: guard.entries.len(),
            ..guard.stats
        }
    }

    /// Drops every entry (in-flight computations are left to finish but
    /// their results are not stored).
    pub fn clear(&self) {
        let mut guard = self.inner.lock().unwrap();
        guard.entries.retain(|_, slot| matches!(slot, Slot::InFlight));
        guard.lru.clear();
        guard.stats.size = guard.entries.len();
    }

    /// Evicts expired entries without waiting for their natural LRU turn.
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut guard = self.inner.lock().unwrap();
        let ttl = self.config.ttl;
        let expired: Vec<Fingerprint> = guard
            .entries
            .iter()
            .filter_map(|(k, slot)| match slot {
                Slot::Ready { inserted_at, .. } if inserted_at.elapsed() >= ttl => Some(k.clone()),
                _ => None,
            })
            .collect();
        for key in &expired {
            guard.entries.remove(key);
            if let Some(pos) = guard.lru.iter().position(|k| k == key) {
                guard.lru.remove(pos);
            }
        }
        guard.stats.size = guard.entries.len();
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RunStatus;
    use crate::variant::Variant;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fake_result(status: RunStatus) -> OptimizationResult {
        OptimizationResult {
            run_id: "r1".to_string(),
            status,
            best_solution: None,
            cost: Some(1.0),
            breakdown: None,
            iterations: 1,
            elapsed_ms: 0,
            convergence: vec![1.0],
            variant: Variant::Basic,
            seed: None,
        }
    }

    #[test]
    fn hit_avoids_recomputation() {
        let cache = ResultCache::new(CacheConfig::default());
        let key = Fingerprint("k1".to_string());
        let calls = Arc::new(AtomicU32::new(0));

        let calls_clone = calls.clone();
        cache.compute_or_get(key.clone(), move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            fake_result(RunStatus::Completed)
        });
        let calls_clone = calls.clone();
        cache.compute_or_get(key, move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            fake_result(RunStatus::Completed)
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn failed_results_are_never_cached() {
        let cache = ResultCache::new(CacheConfig::default());
        let key = Fingerprint("k2".to_string());
        cache.compute_or_get(key.clone(), || fake_result(RunStatus::Failed));
        cache.compute_or_get(key, || fake_result(RunStatus::Failed));
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn expired_entries_are_recomputed() {
        let cache = ResultCache::new(CacheConfig {
            max_entries: 100,
            ttl: Duration::from_millis(1),
        });
        let key = Fingerprint("k3".to_string());
        cache.compute_or_get(key.clone(), || fake_result(RunStatus::Completed));
        std::thread::sleep(Duration::from_millis(5));
        cache.compute_or_get(key, || fake_result(RunStatus::Completed));
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn lru_eviction_respects_capacity() {
        let cache = ResultCache::new(CacheConfig {
            max_entries: 1,
            ttl: Duration::from_secs(3600),
        });
        cache.compute_or_get(Fingerprint("a".to_string()), || {
            fake_result(RunStatus::Completed)
        });
        cache.compute_or_get(Fingerprint("b".to_string()), || {
            fake_result(RunStatus::Completed)
        });
        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn concurrent_callers_single_flight() {
        let cache = Arc::new(ResultCache::new(CacheConfig::default()));
        let calls = Arc::new(AtomicU32::new(0));
        let key = Fingerprint("shared".to_string());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                let key = key.clone();
                std::thread::spawn(move || {
                    cache.compute_or_get(key, move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(20));
                        fake_result(RunStatus::Completed)
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
