use crate::api::StockDataSource;
use crate::config::Config;
use crate::error::{Result, TickerError};
use crate::models::stock::StockData;
use crate::models::ticker::TickerSymbol;
use crate::models::ticker_list::TickerList;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

/// HTTP client for the dashboard backend.
pub struct BackendApi {
    client: Client,
    ticker_data_url: String,
    ticker_list_url: String,
}

impl BackendApi {
    pub fn new(config: &Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            ticker_data_url: config.ticker_data_url(),
            ticker_list_url: config.ticker_list_url(),
        }
    }

    /// POSTs `body` as JSON and returns the raw response bytes of a 2xx reply.
    async fn post_json(&self, url: &str, body: serde_json::Value, what: &str) -> Result<Vec<u8>> {
        debug!("Sending request to {}", url);
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TickerError::FetchFailed(format!("{}: transport error: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TickerError::FetchFailed(format!(
                "{}: backend returned {}",
                what, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TickerError::FetchFailed(format!("{}: reading body: {}", what, e)))?;
        debug!("Received {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl StockDataSource for BackendApi {
    async fn fetch_ticker_data(&self, ticker: &TickerSymbol) -> Result<StockData> {
        let what = format!("ticker data for {}", ticker);
        let body = self
            .post_json(&self.ticker_data_url, json!({ "ticker": ticker }), &what)
            .await?;
        StockData::from_slice(&body).map_err(|e| match e {
            TickerError::FetchFailed(msg) => TickerError::FetchFailed(format!("{}: {}", what, msg)),
            other => other,
        })
    }

    async fn fetch_ticker_list(&self, query: &str) -> Result<TickerList> {
        let body = self
            .post_json(&self.ticker_list_url, json!({ "query": query }), "ticker list")
            .await?;
        let list: TickerList = serde_json::from_slice(&body)
            .map_err(|e| TickerError::FetchFailed(format!("ticker list: malformed response: {}", e)))?;
        debug!("Parsed {} tickers from response", list.len());
        Ok(list)
    }
}
