use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account-level totals as reported by the broker, in the base currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub total_amount: Decimal,
    pub total_currencies: Decimal,
    pub total_shares: Decimal,
    pub total_bonds: Decimal,
    pub total_etf: Decimal,
}

/// Broker operation categories the account status cares about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Coupon,
    Dividend,
    /// Cash deposited into the account.
    Input,
    Other(String),
}

impl OperationKind {
    /// Map a T-Invest `OperationType` enum name.
    pub fn from_api_name(name: &str) -> Self {
        match name {
            "OPERATION_TYPE_COUPON" => OperationKind::Coupon,
            "OPERATION_TYPE_DIVIDEND" => OperationKind::Dividend,
            "OPERATION_TYPE_INPUT" => OperationKind::Input,
            other => OperationKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    /// Signed payment amount in the base currency.
    pub amount: Decimal,
    pub date: Option<DateTime<Utc>>,
}

impl Operation {
    pub fn new(kind: OperationKind, amount: Decimal) -> Self {
        Self {
            kind,
            amount,
            date: None,
        }
    }
}

/// One holding in the portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub figi: String,
    /// e.g. "share", "bond", "etf", "currency".
    pub instrument_type: String,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub current_price: Option<Decimal>,
}

impl Position {
    pub fn is_share(&self) -> bool {
        self.instrument_type == "share"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    pub figi: String,
    pub ticker: String,
    pub name: String,
}

/// Daily OHLC candle; only the close is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub time: Option<DateTime<Utc>>,
    pub close: Decimal,
}
