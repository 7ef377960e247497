use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::StatusError;
use crate::market_data::{MarketDataSource, Operation, OperationKind, PortfolioTotals};
use crate::models::{HistorySnapshot, MetricSet, PortfolioMetrics};
use crate::staleness::{check_cache_staleness, log_cache_staleness, CacheState};
use crate::storage::HistoryStore;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_OPERATIONS_LOOKBACK: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Which operations are summed into the payout totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationsWindow {
    /// From midnight UTC of a fixed date up to now.
    Since(NaiveDate),
    /// A rolling window ending now.
    Lookback(Duration),
}

impl OperationsWindow {
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = match self {
            OperationsWindow::Since(date) => date.and_time(chrono::NaiveTime::MIN).and_utc(),
            OperationsWindow::Lookback(span) => chrono::Duration::from_std(*span)
                .ok()
                .and_then(|span| now.checked_sub_signed(span))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        };
        (from.min(now), now)
    }
}

impl Default for OperationsWindow {
    fn default() -> Self {
        OperationsWindow::Lookback(DEFAULT_OPERATIONS_LOOKBACK)
    }
}

/// Time-bounded cache of derived account metrics.
///
/// Every successful refresh replaces the cached metrics and refresh time
/// together and records a [`HistorySnapshot`] in the history store. A failed
/// refresh changes nothing, so the next call retries immediately.
pub struct PortfolioSnapshotCache {
    source: Arc<dyn MarketDataSource>,
    account_id: String,
    history: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    fields: MetricSet,
    window: OperationsWindow,
    metrics: Option<PortfolioMetrics>,
    last_refresh: Option<DateTime<Utc>>,
}

impl PortfolioSnapshotCache {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        account_id: impl Into<String>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            source,
            account_id: account_id.into(),
            history,
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_CACHE_TTL,
            fields: MetricSet::default(),
            window: OperationsWindow::default(),
            metrics: None,
            last_refresh: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_metric_set(mut self, fields: MetricSet) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_operations_window(mut self, window: OperationsWindow) -> Self {
        self.window = window;
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn metric_set(&self) -> &MetricSet {
        &self.fields
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// The cached metrics, regardless of age.
    pub fn cached(&self) -> Option<&PortfolioMetrics> {
        self.metrics.as_ref()
    }

    pub fn state(&self) -> CacheState {
        check_cache_staleness(self.last_refresh, self.clock.now(), self.ttl).state()
    }

    /// Current metrics, refreshing first when the cache is cold or older than the TTL.
    pub async fn get_metrics(&mut self) -> Result<PortfolioMetrics, StatusError> {
        let check = check_cache_staleness(self.last_refresh, self.clock.now(), self.ttl);
        log_cache_staleness(&self.account_id, &check);

        if !check.is_stale {
            if let Some(metrics) = &self.metrics {
                return Ok(metrics.clone());
            }
        }
        self.refresh().await
    }

    /// Fetch unconditionally.
    pub async fn refresh(&mut self) -> Result<PortfolioMetrics, StatusError> {
        let now = self.clock.now();
        let metrics = self.fetch_metrics(now).await?;

        self.metrics = Some(metrics.clone());
        self.last_refresh = Some(now);
        info!(
            account = %self.account_id,
            source = self.source.name(),
            total_amount = %metrics.total_amount,
            total_currencies = %metrics.total_currencies,
            "portfolio metrics refreshed"
        );

        let snapshot = HistorySnapshot::capture(&metrics, now);
        if let Err(err) = self.history.save(&snapshot).await {
            warn!(
                account = %self.account_id,
                location = %self.history.location(),
                error = %err,
                "failed to persist history snapshot"
            );
        }

        Ok(metrics)
    }

    async fn fetch_metrics(&self, now: DateTime<Utc>) -> Result<PortfolioMetrics, StatusError> {
        let totals = self
            .source
            .fetch_portfolio(&self.account_id)
            .await
            .map_err(StatusError::data_source)?;

        let operations = if self.fields.tracks_payouts() {
            let (from, to) = self.window.bounds(now);
            debug!(account = %self.account_id, %from, %to, "fetching operations");
            Some(
                self.source
                    .fetch_operations(&self.account_id, from, to)
                    .await
                    .map_err(StatusError::data_source)?,
            )
        } else {
            None
        };

        Ok(derive_metrics(totals, operations.as_deref()))
    }
}

/// Combine portfolio totals with payout sums. Without operations the payout
/// fields stay `None`.
pub fn derive_metrics(totals: PortfolioTotals, operations: Option<&[Operation]>) -> PortfolioMetrics {
    let (total_coupons, total_dividend) = match operations {
        Some(ops) => (
            Some(sum_payouts(ops, &OperationKind::Coupon)),
            Some(sum_payouts(ops, &OperationKind::Dividend)),
        ),
        None => (None, None),
    };

    PortfolioMetrics {
        total_amount: totals.total_amount,
        total_currencies: totals.total_currencies,
        total_shares: totals.total_shares,
        total_bonds: totals.total_bonds,
        total_etf: totals.total_etf,
        total_coupons,
        total_dividend,
    }
}

fn sum_payouts(operations: &[Operation], kind: &OperationKind) -> Decimal {
    operations
        .iter()
        .filter(|op| &op.kind == kind)
        .map(|op| op.amount)
        .sum::<Decimal>()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn payout_sums_round_to_cents() {
        let ops = vec![
            Operation::new(OperationKind::Coupon, d("10.105")),
            Operation::new(OperationKind::Coupon, d("20.1")),
            Operation::new(OperationKind::Dividend, d("5.555")),
            Operation::new(OperationKind::Input, d("100000")),
            Operation::new(OperationKind::Other("OPERATION_TYPE_TAX".into()), d("-3")),
        ];

        let metrics = derive_metrics(PortfolioTotals::default(), Some(&ops));
        assert_eq!(metrics.total_coupons, Some(d("30.21")));
        assert_eq!(metrics.total_dividend, Some(d("5.56")));
    }

    #[test]
    fn untracked_payouts_stay_absent() {
        let totals = PortfolioTotals {
            total_amount: d("100000"),
            total_currencies: d("10000"),
            ..Default::default()
        };
        let metrics = derive_metrics(totals, None);
        assert_eq!(metrics.total_amount, d("100000"));
        assert_eq!(metrics.total_currencies, d("10000"));
        assert_eq!(metrics.total_coupons, None);
        assert_eq!(metrics.total_dividend, None);
    }

    #[test]
    fn operations_window_bounds() {
        let now = Utc.with_ymd_and_hms(2025, 8, 15, 12, 0, 0).unwrap();

        let since = OperationsWindow::Since(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(
            since.bounds(now),
            (Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(), now)
        );

        let lookback = OperationsWindow::Lookback(Duration::from_secs(24 * 60 * 60));
        assert_eq!(
            lookback.bounds(now),
            (Utc.with_ymd_and_hms(2025, 8, 14, 12, 0, 0).unwrap(), now)
        );

        let future = OperationsWindow::Since(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(future.bounds(now), (now, now));
    }
}
