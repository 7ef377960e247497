pub mod app;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod duration;
pub mod error;
pub mod format;
pub mod market_data;
pub mod models;
pub mod notify;
pub mod portfolio;
pub mod staleness;
pub mod storage;
