use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::{InstrumentInfo, Operation, PortfolioTotals, Position};

/// Read-only view of a brokerage account.
///
/// The account-status core only needs [`fetch_portfolio`](Self::fetch_portfolio)
/// and [`fetch_operations`](Self::fetch_operations). The per-instrument calls
/// back the share-yield report; sources that cannot provide them keep the
/// empty defaults.
#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_portfolio(&self, account_id: &str) -> Result<PortfolioTotals>;

    async fn fetch_operations(
        &self,
        account_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Operation>>;

    async fn fetch_positions(&self, _account_id: &str) -> Result<Vec<Position>> {
        Ok(Vec::new())
    }

    /// Close of the last daily candle on `date`, if the instrument traded.
    async fn fetch_previous_close(&self, _figi: &str, _date: NaiveDate) -> Result<Option<Decimal>> {
        Ok(None)
    }

    async fn fetch_instrument(&self, _figi: &str) -> Result<Option<InstrumentInfo>> {
        Ok(None)
    }

    fn name(&self) -> &str;
}
