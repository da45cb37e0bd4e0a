use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Symbols known to the backend, each with a "selected" flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerList {
    #[serde(rename = "data", default)]
    pub tickers: BTreeMap<String, bool>,
}

impl TickerList {
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Case-insensitive substring match, sorted by symbol.
    pub fn filter(&self, term: &str) -> Vec<String> {
        let needle = term.trim().to_lowercase();
        self.tickers
            .keys()
            .filter(|symbol| symbol.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}
