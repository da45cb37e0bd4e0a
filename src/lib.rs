pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used items
pub use config::Config;
pub use error::{Result, TickerError};
pub use models::cache::{CacheEntry, TickerCache, FRESHNESS_WINDOW_MS};
pub use models::ticker::TickerSymbol;
pub use services::ticker_service::{Fetched, RequestStatus, TickerService};
