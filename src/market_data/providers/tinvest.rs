//! T-Invest (Tinkoff Invest) REST client.
//!
//! Every call is a JSON `POST` to
//! `<base>/tinkoff.public.invest.api.contract.v1.<Service>/<Method>` with a
//! bearer token. Money values arrive as `{units, nano}` pairs (`units` may be
//! encoded as a JSON string) and are converted exactly to [`Decimal`].

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::market_data::{
    Candle, InstrumentInfo, MarketDataSource, Operation, OperationKind, PortfolioTotals, Position,
};

pub const DEFAULT_BASE_URL: &str = "https://invest-public-api.tinkoff.ru/rest";
const CONTRACT_PREFIX: &str = "tinkoff.public.invest.api.contract.v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `{units, nano}` money/quotation pair.
#[derive(Debug, Clone, Default, Deserialize)]
struct ApiNumber {
    #[serde(default, deserialize_with = "deserialize_units")]
    units: i64,
    #[serde(default)]
    nano: i32,
}

impl ApiNumber {
    fn to_decimal(&self) -> Decimal {
        (Decimal::from(self.units) + Decimal::new(i64::from(self.nano), 9)).normalize()
    }
}

fn deserialize_units<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUnits {
        Number(i64),
        Text(String),
    }

    match RawUnits::deserialize(deserializer)? {
        RawUnits::Number(n) => Ok(n),
        RawUnits::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

fn amount(value: &Option<ApiNumber>) -> Decimal {
    value.as_ref().map(ApiNumber::to_decimal).unwrap_or(Decimal::ZERO)
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioResponse {
    total_amount_portfolio: Option<ApiNumber>,
    total_amount_currencies: Option<ApiNumber>,
    total_amount_shares: Option<ApiNumber>,
    total_amount_bonds: Option<ApiNumber>,
    total_amount_etf: Option<ApiNumber>,
    #[serde(default)]
    positions: Vec<PortfolioPosition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioPosition {
    figi: String,
    #[serde(default)]
    instrument_type: String,
    quantity: Option<ApiNumber>,
    average_position_price: Option<ApiNumber>,
    current_price: Option<ApiNumber>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioRequest<'a> {
    account_id: &'a str,
    currency: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OperationsRequest<'a> {
    account_id: &'a str,
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct OperationsResponse {
    #[serde(default)]
    operations: Vec<ApiOperation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiOperation {
    #[serde(default)]
    operation_type: String,
    payment: Option<ApiNumber>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CandlesRequest<'a> {
    instrument_id: &'a str,
    from: String,
    to: String,
    interval: &'a str,
}

#[derive(Debug, Deserialize)]
struct CandlesResponse {
    #[serde(default)]
    candles: Vec<ApiCandle>,
}

#[derive(Debug, Deserialize)]
struct ApiCandle {
    close: Option<ApiNumber>,
    time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareByRequest<'a> {
    id_type: &'a str,
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShareByResponse {
    instrument: Option<ApiInstrument>,
}

#[derive(Debug, Deserialize)]
struct ApiInstrument {
    #[serde(default)]
    figi: String,
    #[serde(default)]
    ticker: String,
    #[serde(default)]
    name: String,
}

/// Error body returned by the gateway on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    description: String,
}

/// Outcome of a call that may legitimately find nothing.
enum Lookup<T> {
    Found(T),
    NotFound,
}

/// Client for the T-Invest REST gateway.
pub struct TInvestClient {
    client: Client,
    token: SecretString,
    base_url: String,
}

impl TInvestClient {
    pub fn new(token: SecretString) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("invest-status/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another gateway (sandbox, mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn call<Req, Resp>(&self, service: &str, method: &str, body: &Req) -> Result<Lookup<Resp>>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{CONTRACT_PREFIX}.{service}/{method}", self.base_url);
        debug!(service, method, "t-invest request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token.expose_secret())
            .header("accept", "application/json")
            .json(body)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {method} response body"))?;

        if status == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }

        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiError>(&text) {
                Ok(err) if !err.message.is_empty() || !err.description.is_empty() => format!(
                    "code={} message={} {}",
                    err.code.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string()),
                    err.message,
                    err.description
                ),
                _ => text.trim().to_string(),
            };
            anyhow::bail!("T-Invest {method} failed: status={status}, {}", detail.trim());
        }

        let parsed = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {method} response"))?;
        Ok(Lookup::Found(parsed))
    }

    async fn call_required<Req, Resp>(&self, service: &str, method: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        match self.call(service, method, body).await? {
            Lookup::Found(resp) => Ok(resp),
            Lookup::NotFound => Err(anyhow!("T-Invest {method} failed: status=404 Not Found")),
        }
    }

    async fn get_portfolio(&self, account_id: &str) -> Result<PortfolioResponse> {
        self.call_required(
            "OperationsService",
            "GetPortfolio",
            &PortfolioRequest {
                account_id,
                currency: "RUB",
            },
        )
        .await
    }
}

#[async_trait::async_trait]
impl MarketDataSource for TInvestClient {
    async fn fetch_portfolio(&self, account_id: &str) -> Result<PortfolioTotals> {
        let portfolio = self.get_portfolio(account_id).await?;

        let total_amount = portfolio
            .total_amount_portfolio
            .as_ref()
            .map(ApiNumber::to_decimal)
            .context("GetPortfolio response has no totalAmountPortfolio")?;

        Ok(PortfolioTotals {
            total_amount,
            total_currencies: amount(&portfolio.total_amount_currencies),
            total_shares: amount(&portfolio.total_amount_shares),
            total_bonds: amount(&portfolio.total_amount_bonds),
            total_etf: amount(&portfolio.total_amount_etf),
        })
    }

    async fn fetch_operations(
        &self,
        account_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Operation>> {
        let response: OperationsResponse = self
            .call_required(
                "OperationsService",
                "GetOperations",
                &OperationsRequest {
                    account_id,
                    from: rfc3339(from),
                    to: rfc3339(to),
                },
            )
            .await?;

        Ok(response
            .operations
            .into_iter()
            .map(|op| Operation {
                kind: OperationKind::from_api_name(&op.operation_type),
                amount: amount(&op.payment),
                date: op.date,
            })
            .collect())
    }

    async fn fetch_positions(&self, account_id: &str) -> Result<Vec<Position>> {
        let portfolio = self.get_portfolio(account_id).await?;
        Ok(portfolio
            .positions
            .into_iter()
            .map(|p| Position {
                figi: p.figi,
                instrument_type: p.instrument_type,
                quantity: amount(&p.quantity),
                average_price: amount(&p.average_position_price),
                current_price: p.current_price.as_ref().map(ApiNumber::to_decimal),
            })
            .collect())
    }

    async fn fetch_previous_close(&self, figi: &str, date: NaiveDate) -> Result<Option<Decimal>> {
        let from = date.and_hms_opt(0, 0, 0).context("invalid candle start")?.and_utc();
        let to = date.and_hms_opt(23, 59, 59).context("invalid candle end")?.and_utc();

        let response = match self
            .call::<_, CandlesResponse>(
                "MarketDataService",
                "GetCandles",
                &CandlesRequest {
                    instrument_id: figi,
                    from: rfc3339(from),
                    to: rfc3339(to),
                    interval: "CANDLE_INTERVAL_DAY",
                },
            )
            .await?
        {
            Lookup::Found(resp) => resp,
            Lookup::NotFound => return Ok(None),
        };

        let candles: Vec<Candle> = response
            .candles
            .into_iter()
            .filter_map(|c| {
                c.close.map(|close| Candle {
                    time: c.time,
                    close: close.to_decimal(),
                })
            })
            .collect();

        Ok(candles.last().map(|c| c.close))
    }

    async fn fetch_instrument(&self, figi: &str) -> Result<Option<InstrumentInfo>> {
        let response = self
            .call::<_, ShareByResponse>(
                "InstrumentsService",
                "ShareBy",
                &ShareByRequest {
                    id_type: "INSTRUMENT_ID_TYPE_FIGI",
                    id: figi,
                },
            )
            .await?;

        Ok(match response {
            Lookup::Found(ShareByResponse {
                instrument: Some(instrument),
            }) => Some(InstrumentInfo {
                figi: if instrument.figi.is_empty() {
                    figi.to_string()
                } else {
                    instrument.figi
                },
                ticker: instrument.ticker,
                name: instrument.name,
            }),
            _ => None,
        })
    }

    fn name(&self) -> &str {
        "t-invest"
    }
}
