pub mod cache;
pub mod stock;
pub mod ticker;
pub mod ticker_list;
