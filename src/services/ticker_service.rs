use crate::api::{BackendApi, StockDataSource};
use crate::config::Config;
use crate::error::Result;
use crate::models::cache::{CacheEntry, TickerCache};
use crate::models::stock::StockData;
use crate::models::ticker::TickerSymbol;
use crate::models::ticker_list::TickerList;
use crate::utils::clock::{Clock, SystemClock};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Outcome of the most recent ticker data request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed(String),
}

/// Ticker data handed back by [`TickerService::request`].
#[derive(Debug, Clone)]
pub struct Fetched {
    pub data: Arc<StockData>,
    pub fetched_at_epoch_millis: u64,
    pub from_cache: bool,
}

/// Owns the ticker cache and decides when the backend is called.
///
/// Concurrent stale requests for the same ticker are not coalesced: each one
/// goes to the backend and the last to finish wins the cache slot.
pub struct TickerService<S = BackendApi> {
    source: S,
    cache: Arc<TickerCache>,
    clock: Arc<dyn Clock>,
    ticker_list: Mutex<TickerList>,
    selected: Mutex<Option<TickerSymbol>>,
    status: Mutex<RequestStatus>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TickerService<BackendApi> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            BackendApi::new(config),
            Arc::new(TickerCache::new()),
            Arc::new(SystemClock),
        )
    }
}

impl<S: StockDataSource> TickerService<S> {
    pub fn new(source: S, cache: Arc<TickerCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            cache,
            clock,
            ticker_list: Mutex::new(TickerList::default()),
            selected: Mutex::new(None),
            status: Mutex::new(RequestStatus::Idle),
        }
    }

    pub fn cache(&self) -> &Arc<TickerCache> {
        &self.cache
    }

    /// Current time on the clock used for freshness decisions.
    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    pub fn get(&self, ticker: &TickerSymbol) -> Option<CacheEntry> {
        self.cache.get(ticker)
    }

    /// Serves a fresh cached entry, or fetches and caches a new one.
    ///
    /// A failed fetch leaves any existing entry for `ticker` in place.
    pub async fn request(&self, ticker: &TickerSymbol) -> Result<Fetched> {
        *lock(&self.status) = RequestStatus::Loading;

        let now = self.clock.now_millis();
        match self.cache.get(ticker) {
            Some(entry) if entry.is_fresh(now) => {
                debug!("Cache hit for {}", ticker);
                *lock(&self.status) = RequestStatus::Succeeded;
                return Ok(Fetched {
                    data: entry.payload,
                    fetched_at_epoch_millis: entry.fetched_at_epoch_millis,
                    from_cache: true,
                });
            }
            Some(entry) => debug!(
                "Cache entry for {} is stale ({} ms old)",
                ticker,
                now.saturating_sub(entry.fetched_at_epoch_millis)
            ),
            None => debug!("Cache miss for {}", ticker),
        }

        info!("Fetching ticker data for {}", ticker);
        let data = match self.source.fetch_ticker_data(ticker).await {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to fetch ticker data for {}: {}", ticker, e);
                *lock(&self.status) = RequestStatus::Failed(e.to_string());
                return Err(e);
            }
        };

        if !data.symbol().eq_ignore_ascii_case(ticker.as_str()) {
            warn!(
                "Backend returned symbol {} for {}; caching under {}",
                data.symbol(),
                ticker,
                ticker
            );
        }

        let entry = CacheEntry {
            payload: Arc::new(data),
            fetched_at_epoch_millis: self.clock.now_millis(),
            ticker: ticker.clone(),
        };
        self.cache.insert(entry.clone());
        *lock(&self.status) = RequestStatus::Succeeded;

        Ok(Fetched {
            data: entry.payload,
            fetched_at_epoch_millis: entry.fetched_at_epoch_millis,
            from_cache: false,
        })
    }

    pub fn clear(&self) {
        info!("Clearing ticker cache ({} entries)", self.cache.len());
        self.cache.clear();
    }

    pub fn clear_for(&self, ticker: &TickerSymbol) -> bool {
        let removed = self.cache.clear_for(ticker).is_some();
        debug!("Cleared cache for {}: {}", ticker, removed);
        removed
    }

    /// Marks `ticker` as selected and requests its data.
    pub async fn select(&self, ticker: &TickerSymbol) -> Result<Fetched> {
        *lock(&self.selected) = Some(ticker.clone());
        self.request(ticker).await
    }

    pub fn selected(&self) -> Option<TickerSymbol> {
        lock(&self.selected).clone()
    }

    pub fn status(&self) -> RequestStatus {
        lock(&self.status).clone()
    }

    /// Replaces the known ticker list. On failure the previous list stays.
    pub async fn refresh_ticker_list(&self, query: &str) -> Result<TickerList> {
        let list = self.source.fetch_ticker_list(query).await.map_err(|e| {
            error!("Failed to fetch ticker list: {}", e);
            e
        })?;
        info!("Loaded {} tickers", list.len());
        *lock(&self.ticker_list) = list.clone();
        Ok(list)
    }

    pub fn ticker_list(&self) -> TickerList {
        lock(&self.ticker_list).clone()
    }

    pub fn search(&self, term: &str) -> Vec<String> {
        lock(&self.ticker_list).filter(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TickerError;
    use crate::models::cache::FRESHNESS_WINDOW_MS;
    use crate::utils::clock::ManualClock;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Replays scripted responses and counts calls.
    #[derive(Default)]
    struct ScriptedSource {
        data: Mutex<VecDeque<Result<StockData>>>,
        lists: Mutex<VecDeque<Result<TickerList>>>,
        calls: AtomicUsize,
        latency: Duration,
    }

    impl ScriptedSource {
        fn with_latency(latency: Duration) -> Self {
            Self {
                latency,
                ..Self::default()
            }
        }

        fn push(&self, result: Result<StockData>) {
            lock(&self.data).push_back(result);
        }

        fn push_list(&self, result: Result<TickerList>) {
            lock(&self.lists).push_back(result);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StockDataSource for ScriptedSource {
        async fn fetch_ticker_data(&self, _ticker: &TickerSymbol) -> Result<StockData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = lock(&self.data)
                .pop_front()
                .unwrap_or_else(|| Err(TickerError::FetchFailed("no scripted response".into())));
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            result
        }

        async fn fetch_ticker_list(&self, _query: &str) -> Result<TickerList> {
            lock(&self.lists)
                .pop_front()
                .unwrap_or_else(|| Err(TickerError::FetchFailed("no scripted list".into())))
        }
    }

    fn stock(symbol: &str, price: f64) -> StockData {
        serde_json::from_value(serde_json::json!({
            "info_data": { "symbol": symbol, "regularMarketPrice": price },
            "history_data": []
        }))
        .unwrap()
    }

    fn ticker(s: &str) -> TickerSymbol {
        TickerSymbol::parse(s).unwrap()
    }

    fn service() -> (TickerService<ScriptedSource>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let svc = TickerService::new(
            ScriptedSource::default(),
            Arc::new(TickerCache::new()),
            clock.clone(),
        );
        (svc, clock)
    }

    #[tokio::test]
    async fn follows_the_freshness_timeline() {
        let (svc, clock) = service();
        let aapl = ticker("AAPL");
        svc.source.push(Ok(stock("AAPL", 100.0)));
        svc.source.push(Ok(stock("AAPL", 200.0)));

        let first = svc.request(&aapl).await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(svc.source.calls(), 1);
        assert!(svc.get(&aapl).unwrap().is_fresh(clock.now_millis()));

        clock.set(100_000);
        let second = svc.request(&aapl).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(svc.source.calls(), 1);
        assert!(Arc::ptr_eq(&first.data, &second.data));

        clock.set(400_000);
        let third = svc.request(&aapl).await.unwrap();
        assert!(!third.from_cache);
        assert_eq!(svc.source.calls(), 2);
        assert_eq!(third.data.info_data.regular_market_price, Some(200.0));
        assert_eq!(svc.get(&aapl).unwrap().fetched_at_epoch_millis, 400_000);
    }

    #[tokio::test]
    async fn concurrent_stale_requests_both_reach_backend() {
        let clock = Arc::new(ManualClock::new(0));
        let svc = TickerService::new(
            ScriptedSource::with_latency(Duration::from_millis(20)),
            Arc::new(TickerCache::new()),
            clock.clone(),
        );
        let aapl = ticker("AAPL");
        svc.source.push(Ok(stock("AAPL", 0.5)));
        svc.source.push(Ok(stock("AAPL", 1.0)));
        svc.source.push(Ok(stock("AAPL", 2.0)));

        svc.request(&aapl).await.unwrap();
        clock.set(400_000);

        let (a, b) = tokio::join!(svc.request(&aapl), svc.request(&aapl));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(svc.source.calls(), 3);
        assert!(!a.from_cache);
        assert!(!b.from_cache);
        assert_eq!(svc.cache().len(), 1);
        let stored = svc.get(&aapl).unwrap().payload.info_data.regular_market_price;
        assert!(matches!(stored, Some(p) if p == 1.0 || p == 2.0));
    }

    #[tokio::test]
    async fn now_millis_follows_injected_clock() {
        let (svc, clock) = service();
        clock.set(123_456);
        assert_eq!(svc.now_millis(), 123_456);
    }

    #[tokio::test]
    async fn refetches_exactly_at_window_edge() {
        let (svc, clock) = service();
        let aapl = ticker("AAPL");
        svc.source.push(Ok(stock("AAPL", 1.0)));
        svc.source.push(Ok(stock("AAPL", 2.0)));

        svc.request(&aapl).await.unwrap();
        clock.set(FRESHNESS_WINDOW_MS - 1);
        assert!(svc.request(&aapl).await.unwrap().from_cache);
        clock.set(FRESHNESS_WINDOW_MS);
        assert!(!svc.request(&aapl).await.unwrap().from_cache);
        assert_eq!(svc.source.calls(), 2);
    }

    #[tokio::test]
    async fn failure_keeps_stale_entry() {
        let (svc, clock) = service();
        let aapl = ticker("AAPL");
        svc.source.push(Ok(stock("AAPL", 100.0)));
        svc.source.push(Err(TickerError::FetchFailed("backend returned 502".into())));

        svc.request(&aapl).await.unwrap();
        clock.set(400_000);
        let err = svc.request(&aapl).await.unwrap_err();
        assert_eq!(err, TickerError::FetchFailed("backend returned 502".into()));

        let entry = svc.get(&aapl).unwrap();
        assert_eq!(entry.fetched_at_epoch_millis, 0);
        assert_eq!(entry.payload.info_data.regular_market_price, Some(100.0));
        assert!(matches!(svc.status(), RequestStatus::Failed(_)));
    }

    #[tokio::test]
    async fn failure_on_first_request_caches_nothing() {
        let (svc, _clock) = service();
        let aapl = ticker("AAPL");
        svc.source.push(Err(TickerError::FetchFailed("connection refused".into())));

        assert!(svc.request(&aapl).await.is_err());
        assert!(svc.get(&aapl).is_none());
        assert_eq!(svc.source.calls(), 1);
    }

    #[tokio::test]
    async fn failure_does_not_touch_other_tickers() {
        let (svc, _clock) = service();
        svc.source.push(Ok(stock("MSFT", 1.0)));
        svc.source.push(Err(TickerError::FetchFailed("timeout".into())));

        svc.request(&ticker("MSFT")).await.unwrap();
        assert!(svc.request(&ticker("AAPL")).await.is_err());
        assert!(svc.get(&ticker("MSFT")).is_some());
    }

    #[tokio::test]
    async fn clear_for_forces_refetch_of_that_ticker_only() {
        let (svc, _clock) = service();
        svc.source.push(Ok(stock("AAPL", 1.0)));
        svc.source.push(Ok(stock("MSFT", 1.0)));
        svc.source.push(Ok(stock("AAPL", 2.0)));

        svc.request(&ticker("AAPL")).await.unwrap();
        svc.request(&ticker("MSFT")).await.unwrap();
        assert!(svc.clear_for(&ticker("AAPL")));
        assert!(!svc.clear_for(&ticker("AAPL")));

        assert!(svc.request(&ticker("MSFT")).await.unwrap().from_cache);
        assert!(!svc.request(&ticker("AAPL")).await.unwrap().from_cache);
        assert_eq!(svc.source.calls(), 3);
    }

    #[tokio::test]
    async fn clear_empties_cache() {
        let (svc, _clock) = service();
        svc.source.push(Ok(stock("AAPL", 1.0)));
        svc.request(&ticker("AAPL")).await.unwrap();
        svc.clear();
        assert!(svc.get(&ticker("AAPL")).is_none());
        assert!(svc.cache().is_empty());
    }

    #[tokio::test]
    async fn mismatched_symbol_is_cached_under_requested_ticker() {
        let (svc, _clock) = service();
        svc.source.push(Ok(stock("BRK-B", 1.0)));
        svc.request(&ticker("BRK.B")).await.unwrap();
        assert!(svc.get(&ticker("BRK.B")).is_some());
        assert!(svc.get(&ticker("BRK-B")).is_none());
    }

    #[tokio::test]
    async fn select_records_selection_and_status() {
        let (svc, _clock) = service();
        assert_eq!(svc.status(), RequestStatus::Idle);
        assert!(svc.selected().is_none());

        svc.source.push(Ok(stock("TSLA", 1.0)));
        svc.select(&ticker("tsla")).await.unwrap();
        assert_eq!(svc.selected(), Some(ticker("TSLA")));
        assert_eq!(svc.status(), RequestStatus::Succeeded);
    }

    #[tokio::test]
    async fn ticker_list_refresh_and_search() {
        let (svc, _clock) = service();
        let list: TickerList =
            serde_json::from_str(r#"{"data": {"AAPL": false, "AMD": false, "MSFT": true}}"#)
                .unwrap();
        svc.source.push_list(Ok(list));
        svc.source
            .push_list(Err(TickerError::FetchFailed("ticker list: backend returned 500".into())));

        assert_eq!(svc.refresh_ticker_list("").await.unwrap().len(), 3);
        assert_eq!(svc.search("a"), vec!["AAPL", "AMD"]);

        assert!(svc.refresh_ticker_list("x").await.is_err());
        assert_eq!(svc.ticker_list().len(), 3);
    }
}
