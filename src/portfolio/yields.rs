use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::StatusError;
use crate::format::format_fixed;
use crate::market_data::{MarketDataSource, Position};

use super::Locale;

const NAME_WIDTH: usize = 15;
const RULE_WIDTH: usize = 50;

/// Performance of one share position, in percent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareYield {
    pub figi: String,
    pub ticker: String,
    pub name: String,
    /// Change of the current price against the average purchase price.
    pub total_yield: Decimal,
    /// Change of the current price against the previous day's close.
    pub daily_yield: Decimal,
}

/// `(current - base) / base * 100`, or zero when either side is unknown or the base is not positive.
pub fn percent_change(current: Option<Decimal>, base: Option<Decimal>) -> Decimal {
    match (current, base) {
        (Some(current), Some(base)) if base > Decimal::ZERO => {
            (current - base) / base * Decimal::ONE_HUNDRED
        }
        _ => Decimal::ZERO,
    }
}

/// Per-share yield table for the portfolio's share positions.
pub struct ShareYieldReport {
    source: Arc<dyn MarketDataSource>,
    account_id: String,
    clock: Arc<dyn Clock>,
    invest_start: Option<NaiveDate>,
    locale: Locale,
}

impl ShareYieldReport {
    pub fn new(source: Arc<dyn MarketDataSource>, account_id: impl Into<String>) -> Self {
        Self {
            source,
            account_id: account_id.into(),
            clock: Arc::new(SystemClock),
            invest_start: None,
            locale: Locale::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_invest_start(mut self, start: Option<NaiveDate>) -> Self {
        self.invest_start = start;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Fetch positions, prices and instrument names; rows come back sorted by
    /// daily yield, best first.
    pub async fn collect(&self) -> Result<Vec<ShareYield>, StatusError> {
        let positions = self
            .source
            .fetch_positions(&self.account_id)
            .await
            .map_err(StatusError::data_source)?;
        let yesterday = self.clock.today().pred_opt().unwrap_or(NaiveDate::MIN);

        let mut rows = Vec::new();
        for position in positions.iter().filter(|p| p.is_share()) {
            rows.push(self.collect_one(position, yesterday).await?);
        }
        rows.sort_by(|a, b| b.daily_yield.cmp(&a.daily_yield));
        debug!(account = %self.account_id, shares = rows.len(), "collected share yields");
        Ok(rows)
    }

    async fn collect_one(&self, position: &Position, yesterday: NaiveDate) -> Result<ShareYield, StatusError> {
        let previous_close = self
            .source
            .fetch_previous_close(&position.figi, yesterday)
            .await
            .map_err(StatusError::data_source)?;
        let (ticker, name) = match self
            .source
            .fetch_instrument(&position.figi)
            .await
            .map_err(StatusError::data_source)?
        {
            Some(info) => (info.ticker, info.name),
            None => {
                warn!(figi = %position.figi, "instrument not found, using FIGI");
                (position.figi.clone(), String::new())
            }
        };

        Ok(ShareYield {
            figi: position.figi.clone(),
            ticker,
            name: name.chars().take(NAME_WIDTH).collect(),
            total_yield: percent_change(position.current_price, Some(position.average_price)),
            daily_yield: percent_change(position.current_price, previous_close),
        })
    }

    pub async fn render(&self) -> Result<String, StatusError> {
        let rows = self.collect().await?;
        let day = self
            .invest_start
            .map(|start| (self.clock.today() - start).num_days());
        Ok(render_share_yields(&rows, day, self.locale))
    }
}

/// Render the table; `day` is the day counter since the first investment.
pub fn render_share_yields(rows: &[ShareYield], day: Option<i64>, locale: Locale) -> String {
    let (day_word, ticker, name, total, daily, empty) = match locale {
        Locale::Ru => (
            "День",
            "Тикер",
            "Наименование",
            "За всё время",
            "За сегодня",
            "Акции в портфеле не найдены.",
        ),
        Locale::En => ("Day", "Ticker", "Name", "All time", "Today", "No shares in the portfolio."),
    };

    let mut out = String::new();
    if let Some(day) = day {
        out.push_str(&format!("\n{day_word} {day}.\n\n"));
    }
    if rows.is_empty() {
        out.push_str(empty);
        out.push('\n');
        return out;
    }

    out.push_str(&format!("{ticker:<7} {name:<15} {total:<10}   {daily:<10}\n"));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "${:<7} {:<15} {:>10}% {:>10}% \n",
            row.ticker,
            row.name,
            format_fixed(row.total_yield, 2),
            format_fixed(row.daily_yield, 2),
        ));
    }
    out
}
