mod models;
mod provider;
pub mod providers;

pub use models::{Candle, InstrumentInfo, Operation, OperationKind, PortfolioTotals, Position};
pub use provider::MarketDataSource;
