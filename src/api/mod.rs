pub mod backend;

use crate::error::Result;
use crate::models::stock::StockData;
use crate::models::ticker::TickerSymbol;
use crate::models::ticker_list::TickerList;
use async_trait::async_trait;

pub use backend::BackendApi;

/// Anything that can produce ticker data on a cache miss.
#[async_trait]
pub trait StockDataSource: Send + Sync {
    async fn fetch_ticker_data(&self, ticker: &TickerSymbol) -> Result<StockData>;

    async fn fetch_ticker_list(&self, query: &str) -> Result<TickerList>;
}
