use crate::error::{Result, TickerError};
use tracing::debug;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_TICKER_DATA_PATH: &str = "/api/getTickerData";
pub const DEFAULT_TICKER_LIST_PATH: &str = "/api/getTickers";

/// Where the backend lives and which endpoints to call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend_url: String,
    pub ticker_data_path: String,
    pub ticker_list_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            ticker_data_path: DEFAULT_TICKER_DATA_PATH.to_string(),
            ticker_list_path: DEFAULT_TICKER_LIST_PATH.to_string(),
        }
    }
}

impl Config {
    /// Reads `TICKER_BACKEND_URL`, `TICKER_DATA_PATH` and `TICKER_LIST_PATH`,
    /// loading a `.env` file first if one exists.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            backend_url: lookup("TICKER_BACKEND_URL").unwrap_or(defaults.backend_url),
            ticker_data_path: lookup("TICKER_DATA_PATH").unwrap_or(defaults.ticker_data_path),
            ticker_list_path: lookup("TICKER_LIST_PATH").unwrap_or(defaults.ticker_list_path),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(TickerError::Config(format!(
                "TICKER_BACKEND_URL must be an http(s) URL, got {:?}",
                self.backend_url
            )));
        }
        for (name, path) in [
            ("TICKER_DATA_PATH", &self.ticker_data_path),
            ("TICKER_LIST_PATH", &self.ticker_list_path),
        ] {
            if !path.starts_with('/') {
                return Err(TickerError::Config(format!(
                    "{} must start with '/', got {:?}",
                    name, path
                )));
            }
        }
        Ok(())
    }

    pub fn ticker_data_url(&self) -> String {
        self.join(&self.ticker_data_path)
    }

    pub fn ticker_list_url(&self) -> String {
        self.join(&self.ticker_list_path)
    }

    fn join(&self, path: &str) -> String {
        format!("{}{}", self.backend_url.trim().trim_end_matches('/'), path)
    }
}
