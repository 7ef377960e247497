use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::{MetricField, PortfolioMetrics};

/// The last observed metrics, as persisted between runs.
///
/// Every field is optional: an empty snapshot stands for "no baseline yet",
/// which is what a missing or unreadable history record loads as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub total_currencies: Option<Decimal>,
    #[serde(default)]
    pub total_shares: Option<Decimal>,
    #[serde(default)]
    pub total_bonds: Option<Decimal>,
    #[serde(default)]
    pub total_etf: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_coupons: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_dividend: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl HistorySnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture a complete metric set at `at`.
    pub fn capture(metrics: &PortfolioMetrics, at: DateTime<Utc>) -> Self {
        Self {
            total_amount: Some(metrics.total_amount),
            total_currencies: Some(metrics.total_currencies),
            total_shares: Some(metrics.total_shares),
            total_bonds: Some(metrics.total_bonds),
            total_etf: Some(metrics.total_etf),
            total_coupons: metrics.total_coupons,
            total_dividend: metrics.total_dividend,
            timestamp: Some(at),
        }
    }

    pub fn get(&self, field: MetricField) -> Option<Decimal> {
        match field {
            MetricField::TotalAmount => self.total_amount,
            MetricField::TotalCurrencies => self.total_currencies,
            MetricField::TotalShares => self.total_shares,
            MetricField::TotalBonds => self.total_bonds,
            MetricField::TotalEtf => self.total_etf,
            MetricField::TotalCoupons => self.total_coupons,
            MetricField::TotalDividend => self.total_dividend,
        }
    }

    /// True when no metric value is present.
    pub fn is_empty(&self) -> bool {
        self.total_amount.is_none()
            && self.total_currencies.is_none()
            && self.total_shares.is_none()
            && self.total_bonds.is_none()
            && self.total_etf.is_none()
            && self.total_coupons.is_none()
            && self.total_dividend.is_none()
    }
}

/// Accepts RFC 3339 strings and bare Unix seconds (older records).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Rfc3339(DateTime<Utc>),
        UnixSeconds(f64),
    }

    let raw: Option<RawTimestamp> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTimestamp::Rfc3339(ts)) => Some(ts),
        Some(RawTimestamp::UnixSeconds(secs)) => {
            let whole = secs.trunc() as i64;
            let nanos = ((secs - secs.trunc()) * 1e9).round() as u32;
            Utc.timestamp_opt(whole, nanos.min(999_999_999)).single()
        }
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_copies_every_tracked_value() {
        let at = Utc.with_ymd_and_hms(2025, 8, 1, 9, 30, 0).unwrap();
        let metrics = PortfolioMetrics {
            total_amount: Decimal::from(100_000),
            total_currencies: Decimal::from(10_000),
            total_shares: Decimal::from(30_000),
            total_bonds: Decimal::from(40_000),
            total_etf: Decimal::from(20_000),
            total_coupons: Some(Decimal::new(125_050, 2)),
            total_dividend: None,
        };

        let snapshot = HistorySnapshot::capture(&metrics, at);
        assert_eq!(snapshot.get(MetricField::TotalCurrencies), Some(Decimal::from(10_000)));
        assert_eq!(snapshot.get(MetricField::TotalCoupons), Some(Decimal::new(125_050, 2)));
        assert_eq!(snapshot.get(MetricField::TotalDividend), None);
        assert_eq!(snapshot.timestamp, Some(at));
        assert!(!snapshot.is_empty());
        assert!(HistorySnapshot::empty().is_empty());
    }

    #[test]
    fn reads_numeric_values_and_unix_timestamp() {
        let json = r#"{
            "total_amount": 100500,
            "total_currencies": 1200.5,
            "total_shares": 30000,
            "total_bonds": 40000,
            "total_etf": 20000,
            "total_coupons": 310.25,
            "total_dividend": 0.0,
            "timestamp": 1754040600.5
        }"#;

        let snapshot: HistorySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.total_amount, Some(Decimal::from(100_500)));
        assert_eq!(snapshot.total_currencies, Some(Decimal::new(12_005, 1)));
        assert_eq!(snapshot.total_coupons, Some(Decimal::new(31_025, 2)));
        let ts = snapshot.timestamp.unwrap();
        assert_eq!(ts.timestamp(), 1_754_040_600);
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn missing_fields_load_as_absent() {
        let snapshot: HistorySnapshot = serde_json::from_str(r#"{"total_currencies": "7000"}"#).unwrap();
        assert_eq!(snapshot.total_currencies, Some(Decimal::from(7000)));
        assert_eq!(snapshot.total_amount, None);
        assert_eq!(snapshot.timestamp, None);
    }

    #[test]
    fn writes_rfc3339_timestamp_and_string_decimals() {
        let at = Utc.with_ymd_and_hms(2025, 8, 1, 9, 30, 0).unwrap();
        let snapshot = HistorySnapshot::capture(
            &PortfolioMetrics {
                total_currencies: Decimal::new(700_050, 2),
                ..Default::default()
            },
            at,
        );
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["total_currencies"], "7000.50");
        assert_eq!(value["timestamp"], "2025-08-01T09:30:00Z");
        assert!(value.get("total_coupons").is_none());
    }
}
