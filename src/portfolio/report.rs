use serde::{Deserialize, Serialize};

use crate::format::{format_amount, format_delta, AmountStyle};
use crate::models::{HistorySnapshot, MetricField, MetricSet, PortfolioMetrics};

/// Language of human-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    pub fn label(self, field: MetricField) -> &'static str {
        match (self, field) {
            (Locale::Ru, MetricField::TotalAmount) => "Общая стоимость портфеля",
            (Locale::Ru, MetricField::TotalBonds) => "Стоимость облигаций",
            (Locale::Ru, MetricField::TotalShares) => "Стоимость акций",
            (Locale::Ru, MetricField::TotalEtf) => "Стоимость фондов",
            (Locale::Ru, MetricField::TotalCoupons) => "Купонов выплачено",
            (Locale::Ru, MetricField::TotalDividend) => "Дивидендов выплачено",
            (Locale::Ru, MetricField::TotalCurrencies) => "Доступные денежные средства",
            (Locale::En, MetricField::TotalAmount) => "Total portfolio value",
            (Locale::En, MetricField::TotalBonds) => "Bonds",
            (Locale::En, MetricField::TotalShares) => "Shares",
            (Locale::En, MetricField::TotalEtf) => "Funds",
            (Locale::En, MetricField::TotalCoupons) => "Coupons paid",
            (Locale::En, MetricField::TotalDividend) => "Dividends paid",
            (Locale::En, MetricField::TotalCurrencies) => "Available cash",
        }
    }

    /// Heading placed above the status text in chat replies.
    pub fn status_header(self) -> &'static str {
        match self {
            Locale::Ru => "📊 *Текущий статус портфеля:*",
            Locale::En => "📊 *Current portfolio status:*",
        }
    }

    /// Generic notice delivered when a status could not be produced.
    pub fn error_notice(self) -> &'static str {
        match self {
            Locale::Ru => "⚠️ Произошла ошибка при получении данных",
            Locale::En => "⚠️ Failed to fetch portfolio data",
        }
    }

    pub fn status_command_description(self) -> &'static str {
        match self {
            Locale::Ru => "Показать статус портфеля",
            Locale::En => "Show portfolio status",
        }
    }

    pub fn yields_command_description(self) -> &'static str {
        match self {
            Locale::Ru => "Показать доходность акций",
            Locale::En => "Show share yields",
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ru" => Ok(Locale::Ru),
            "en" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// Renders metrics and their change against a baseline, one line per tracked field.
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    fields: MetricSet,
    locale: Locale,
    style: AmountStyle,
}

impl ReportFormatter {
    pub fn new(fields: MetricSet, locale: Locale, style: AmountStyle) -> Self {
        Self { fields, locale, style }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn fields(&self) -> &MetricSet {
        &self.fields
    }

    /// Pure function of its inputs. Fields missing from `current` render as zero;
    /// fields missing from `previous` render without a delta.
    pub fn render(&self, current: &PortfolioMetrics, previous: &HistorySnapshot) -> String {
        self.fields
            .fields()
            .iter()
            .map(|&field| self.render_line(field, current, previous))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_line(
        &self,
        field: MetricField,
        current: &PortfolioMetrics,
        previous: &HistorySnapshot,
    ) -> String {
        let value = current.get(field).unwrap_or_default();
        let mut line = format!(
            "{}: {}",
            self.locale.label(field),
            format_amount(value, &self.style)
        );
        if let Some(delta) = previous
            .get(field)
            .and_then(|before| format_delta(value - before, &self.style))
        {
            line.push(' ');
            line.push_str(&delta);
        }
        line
    }
}
