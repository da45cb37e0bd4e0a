use crate::models::stock::StockData;
use crate::models::ticker::TickerSymbol;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Entries younger than this are served without a network call.
pub const FRESHNESS_WINDOW_MS: u64 = 300_000; // 5 minutes

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Arc<StockData>,
    pub fetched_at_epoch_millis: u64,
    pub ticker: TickerSymbol,
}

impl CacheEntry {
    pub fn is_fresh(&self, now_millis: u64) -> bool {
        is_fresh(self, now_millis)
    }
}

/// A clock behind the entry's timestamp counts as zero age.
pub fn is_fresh(entry: &CacheEntry, now_millis: u64) -> bool {
    now_millis.saturating_sub(entry.fetched_at_epoch_millis) < FRESHNESS_WINDOW_MS
}

/// Ticker data keyed by symbol. Unbounded; entries leave only through
/// [`TickerCache::clear`] or [`TickerCache::clear_for`].
#[derive(Debug, Default)]
pub struct TickerCache {
    entries: Mutex<HashMap<TickerSymbol, CacheEntry>>,
}

impl TickerCache {
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section is a single map operation, so a poisoned lock
    // still guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<TickerSymbol, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, ticker: &TickerSymbol) -> Option<CacheEntry> {
        self.lock().get(ticker).cloned()
    }

    /// Stores `entry` under its own ticker, returning whatever it replaced.
    pub fn insert(&self, entry: CacheEntry) -> Option<CacheEntry> {
        self.lock().insert(entry.ticker.clone(), entry)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn clear_for(&self, ticker: &TickerSymbol) -> Option<CacheEntry> {
        self.lock().remove(ticker)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Cached tickers with their fetch time, sorted by symbol.
    pub fn snapshot(&self) -> Vec<(TickerSymbol, u64)> {
        let mut out: Vec<_> = self
            .lock()
            .values()
            .map(|e| (e.ticker.clone(), e.fetched_at_epoch_millis))
            .collect();
        out.sort();
        out
    }
}
