use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One summary metric of the account, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    TotalAmount,
    TotalBonds,
    TotalShares,
    TotalEtf,
    TotalCoupons,
    TotalDividend,
    TotalCurrencies,
}

impl MetricField {
    pub fn is_payout(self) -> bool {
        matches!(self, MetricField::TotalCoupons | MetricField::TotalDividend)
    }
}

/// The metrics a deployment tracks, always kept in report order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSet {
    fields: Vec<MetricField>,
}

impl MetricSet {
    const ALL: [MetricField; 7] = [
        MetricField::TotalAmount,
        MetricField::TotalBonds,
        MetricField::TotalShares,
        MetricField::TotalEtf,
        MetricField::TotalCoupons,
        MetricField::TotalDividend,
        MetricField::TotalCurrencies,
    ];

    /// Portfolio totals plus accrued coupons and dividends.
    pub fn with_payouts() -> Self {
        Self {
            fields: Self::ALL.to_vec(),
        }
    }

    /// Portfolio totals only; operations are never fetched.
    pub fn without_payouts() -> Self {
        Self {
            fields: Self::ALL.into_iter().filter(|f| !f.is_payout()).collect(),
        }
    }

    pub fn from_flag(track_payouts: bool) -> Self {
        if track_payouts {
            Self::with_payouts()
        } else {
            Self::without_payouts()
        }
    }

    pub fn fields(&self) -> &[MetricField] {
        &self.fields
    }

    pub fn contains(&self, field: MetricField) -> bool {
        self.fields.contains(&field)
    }

    pub fn tracks_payouts(&self) -> bool {
        self.fields.iter().any(|f| f.is_payout())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        Self::with_payouts()
    }
}

/// Derived account metrics from one successful refresh.
///
/// Amounts are in the account's base currency. Payout fields are `None` when
/// the deployment does not track them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub total_amount: Decimal,
    pub total_currencies: Decimal,
    pub total_shares: Decimal,
    pub total_bonds: Decimal,
    pub total_etf: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_coupons: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_dividend: Option<Decimal>,
}

impl PortfolioMetrics {
    pub fn get(&self, field: MetricField) -> Option<Decimal> {
        match field {
            MetricField::TotalAmount => Some(self.total_amount),
            MetricField::TotalCurrencies => Some(self.total_currencies),
            MetricField::TotalShares => Some(self.total_shares),
            MetricField::TotalBonds => Some(self.total_bonds),
            MetricField::TotalEtf => Some(self.total_etf),
            MetricField::TotalCoupons => self.total_coupons,
            MetricField::TotalDividend => self.total_dividend,
        }
    }
}
