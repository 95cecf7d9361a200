//! In-memory observation cache keyed by `(symbol, period)`.
//!
//! Entries are shared as `Arc<[Observation]>` so repeated profile runs over
//! the same series (different bin counts, different attribution) never copy
//! or re-read it. Entries expire after an optional TTL and can be
//! invalidated explicitly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use super::provider::{DataError, MarketDataSource};
use crate::domain::{Observation, Period};

/// Cache key. Symbols are normalised to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub period: Period,
}

impl CacheKey {
    pub fn new(symbol: &str, period: Period) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            period,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    observations: Arc<[Observation]>,
    stored_at: Instant,
}

/// Hit/miss counters, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// Thread-safe keyed cache of observation series.
#[derive(Debug)]
pub struct ObservationCache {
    state: Mutex<CacheState>,
    ttl: Option<Duration>,
}

impl ObservationCache {
    /// Cache whose entries never expire.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl: None,
        }
    }

    /// Cache whose entries expire `ttl` after being stored.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    // A panic while holding the lock cannot leave the map half-updated.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match self.ttl {
            None => true,
            Some(ttl) => entry.stored_at.elapsed() < ttl,
        }
    }

    /// Fresh entry for `key`, if any. Expired entries are evicted.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<[Observation]>> {
        let mut state = self.lock();
        let fresh = state.entries.get(key).map(|e| self.is_fresh(e));
        match fresh {
            Some(true) => {
                state.hits += 1;
                state.entries.get(key).map(|e| Arc::clone(&e.observations))
            }
            Some(false) => {
                state.entries.remove(key);
                state.misses += 1;
                None
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, key: CacheKey, observations: Vec<Observation>) -> Arc<[Observation]> {
        let shared: Arc<[Observation]> = observations.into();
        self.lock().entries.insert(
            key,
            CacheEntry {
                observations: Arc::clone(&shared),
                stored_at: Instant::now(),
            },
        );
        shared
    }

    /// Cached series for `key`, or the result of `fetch` (stored on success).
    ///
    /// Failed fetches are not cached.
    pub fn get_or_fetch<F>(&self, key: CacheKey, fetch: F) -> Result<Arc<[Observation]>, DataError>
    where
        F: FnOnce() -> Result<Vec<Observation>, DataError>,
    {
        if let Some(hit) = self.get(&key) {
            debug!(symbol = %key.symbol, period = %key.period, "observation cache hit");
            return Ok(hit);
        }
        debug!(symbol = %key.symbol, period = %key.period, "observation cache miss");
        let observations = fetch()?;
        Ok(self.insert(key, observations))
    }

    /// Drop one entry. Returns true if it was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    /// Drop every entry for `symbol`, whatever the period.
    pub fn invalidate_symbol(&self, symbol: &str) -> usize {
        let symbol = symbol.trim().to_uppercase();
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|k, _| k.symbol != symbol);
        before - state.entries.len()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Number of stored entries (expired ones included until touched).
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
        }
    }
}

impl Default for ObservationCache {
    fn default() -> Self {
        Self::new()
    }
}

/// A market data source fronted by an [`ObservationCache`].
pub struct CachedSource<S> {
    inner: S,
    cache: ObservationCache,
}

impl<S: MarketDataSource> CachedSource<S> {
    pub fn new(inner: S, cache: ObservationCache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &ObservationCache {
        &self.cache
    }

    /// Shared series for `(symbol, period)`, fetched at most once while fresh.
    pub fn observations(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Arc<[Observation]>, DataError> {
        self.cache.get_or_fetch(CacheKey::new(symbol, period), || {
            self.inner.fetch(symbol, period)
        })
    }
}

impl<S: MarketDataSource> MarketDataSource for CachedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<Observation>, DataError> {
        self.observations(symbol, period).map(|obs| obs.to_vec())
    }
}
