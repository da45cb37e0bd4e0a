use crate::error::{Result, TickerError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Ticker data as returned by the backend's ticker-data endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockData {
    pub info_data: StockInfo,
    pub history_data: Vec<StockEntry>,
}

/// Quote and company fields. Only the fields the dashboard reads are typed;
/// everything else the backend sends is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInfo {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub regular_market_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub regular_market_change_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub day_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub day_high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", rename = "trailingPE", skip_serializing_if = "Option::is_none")]
    pub trailing_pe: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Numbers, numeric strings, or anything else as `None`. yfinance sends
/// strings like `"Infinity"` for undefined ratios.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

/// One row of daily price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StockEntry {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub dividends: f64,
    #[serde(default, rename = "Stock Splits")]
    pub stock_splits: f64,
}

impl StockData {
    /// Parse and validate a raw response body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let data: StockData = serde_json::from_slice(body)
            .map_err(|e| TickerError::FetchFailed(format!("malformed ticker data: {}", e)))?;
        data.validate()?;
        Ok(data)
    }

    pub fn validate(&self) -> Result<()> {
        if self.info_data.symbol.trim().is_empty() {
            return Err(TickerError::FetchFailed(
                "ticker data is missing info_data.symbol".to_string(),
            ));
        }
        for entry in &self.history_data {
            let prices = [entry.open, entry.high, entry.low, entry.close];
            if prices.iter().any(|p| !p.is_finite()) {
                return Err(TickerError::FetchFailed(format!(
                    "non-finite price in history row {}",
                    entry.date
                )));
            }
        }
        Ok(())
    }

    pub fn symbol(&self) -> &str {
        &self.info_data.symbol
    }

    /// Most recent `n` history rows, oldest first.
    pub fn recent_history(&self, n: usize) -> &[StockEntry] {
        let start = self.history_data.len().saturating_sub(n);
        &self.history_data[start..]
    }
}
