#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use invest_status::clock::{FixedClock, ManualClock};
use invest_status::market_data::{
    InstrumentInfo, MarketDataSource, Operation, OperationKind, PortfolioTotals, Position,
};
use invest_status::notify::Notifier;
use rust_decimal::Decimal;

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 9, 0, 0).unwrap()
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(start_time()))
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start_time()))
}

pub fn totals(amount: &str, bonds: &str, shares: &str, etf: &str, cash: &str) -> PortfolioTotals {
    PortfolioTotals {
        total_amount: d(amount),
        total_currencies: d(cash),
        total_shares: d(shares),
        total_bonds: d(bonds),
        total_etf: d(etf),
    }
}

/// Scripted data source with call counters.
#[derive(Default)]
pub struct MockSource {
    totals: Mutex<PortfolioTotals>,
    operations: Mutex<Vec<Operation>>,
    positions: Mutex<Vec<Position>>,
    closes: Mutex<HashMap<String, Decimal>>,
    instruments: Mutex<HashMap<String, InstrumentInfo>>,
    last_window: Mutex<Option<(DateTime<Utc>, DateTime<Utc>)>>,
    fail: AtomicBool,
    portfolio_calls: AtomicUsize,
    operations_calls: AtomicUsize,
}

impl MockSource {
    pub fn new(totals: PortfolioTotals) -> Arc<Self> {
        let source = Self::default();
        *source.totals.lock().unwrap() = totals;
        Arc::new(source)
    }

    pub fn set_totals(&self, totals: PortfolioTotals) {
        *self.totals.lock().unwrap() = totals;
    }

    pub fn set_cash(&self, cash: &str) {
        self.totals.lock().unwrap().total_currencies = d(cash);
    }

    pub fn set_operations(&self, ops: Vec<(OperationKind, &str)>) {
        *self.operations.lock().unwrap() = ops
            .into_iter()
            .map(|(kind, amount)| Operation::new(kind, d(amount)))
            .collect();
    }

    pub fn add_share(&self, figi: &str, ticker: &str, name: &str, average: &str, current: &str) {
        self.positions.lock().unwrap().push(Position {
            figi: figi.to_string(),
            instrument_type: "share".to_string(),
            quantity: Decimal::from(10),
            average_price: d(average),
            current_price: Some(d(current)),
        });
        self.instruments.lock().unwrap().insert(
            figi.to_string(),
            InstrumentInfo {
                figi: figi.to_string(),
                ticker: ticker.to_string(),
                name: name.to_string(),
            },
        );
    }

    pub fn set_previous_close(&self, figi: &str, close: &str) {
        self.closes.lock().unwrap().insert(figi.to_string(), d(close));
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn portfolio_calls(&self) -> usize {
        self.portfolio_calls.load(Ordering::SeqCst)
    }

    pub fn operations_calls(&self) -> usize {
        self.operations_calls.load(Ordering::SeqCst)
    }

    pub fn last_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        *self.last_window.lock().unwrap()
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("connection reset by peer");
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataSource for MockSource {
    async fn fetch_portfolio(&self, _account_id: &str) -> Result<PortfolioTotals> {
        self.portfolio_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.totals.lock().unwrap().clone())
    }

    async fn fetch_operations(
        &self,
        _account_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Operation>> {
        self.operations_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        *self.last_window.lock().unwrap() = Some((from, to));
        Ok(self.operations.lock().unwrap().clone())
    }

    async fn fetch_positions(&self, _account_id: &str) -> Result<Vec<Position>> {
        self.check()?;
        Ok(self.positions.lock().unwrap().clone())
    }

    async fn fetch_previous_close(&self, figi: &str, _date: NaiveDate) -> Result<Option<Decimal>> {
        Ok(self.closes.lock().unwrap().get(figi).copied())
    }

    async fn fetch_instrument(&self, figi: &str) -> Result<Option<InstrumentInfo>> {
        Ok(self.instruments.lock().unwrap().get(figi).cloned())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Notifier that records deliveries instead of sending them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, destination: &str, text: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("chat unreachable");
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), text.to_string()));
        Ok(())
    }
}
