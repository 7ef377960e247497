//! Wiring between configuration, credentials and the account-status core,
//! shared by the command-line front-ends.

mod bot;
mod config;
mod poller;

pub use bot::StatusBot;
pub use config::config_output;
pub use poller::{compute_next_delay, PollOutcome, Poller};

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::ResolvedConfig;
use crate::credentials::{keys, CredentialStore};
use crate::error::StatusError;
use crate::market_data::providers::TInvestClient;
use crate::market_data::MarketDataSource;
use crate::portfolio::{
    AccountStatusService, PortfolioSnapshotCache, ReportFormatter, ShareYieldReport,
};
use crate::storage::JsonFileHistoryStore;

/// Which front-end a service is built for; each keeps its own history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    Periodic,
}

impl Mode {
    pub fn history_path(self, config: &ResolvedConfig) -> PathBuf {
        config
            .history_path(matches!(self, Mode::Periodic))
            .to_path_buf()
    }
}

/// Broker access resolved from config and credentials.
pub struct BrokerSecrets {
    pub token: SecretString,
    pub account_id: String,
}

/// Chat delivery resolved from config and credentials.
pub struct ChatSecrets {
    pub token: SecretString,
    pub chat_id: String,
}

async fn require(store: &dyn CredentialStore, key: &str) -> Result<SecretString, StatusError> {
    store
        .get(key)
        .await
        .map_err(|err| {
            StatusError::configuration(format!(
                "failed to read credential {key} from {} backend: {err:#}",
                store.backend()
            ))
        })?
        .ok_or_else(|| {
            StatusError::configuration(format!(
                "credential {key} is not set ({} backend)",
                store.backend()
            ))
        })
}

async fn setting_or_credential(
    setting: Option<&str>,
    store: &dyn CredentialStore,
    key: &str,
) -> Result<String, StatusError> {
    use secrecy::ExposeSecret;

    match setting.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Ok(value.to_string()),
        None => Ok(require(store, key).await?.expose_secret().trim().to_string()),
    }
}

pub async fn resolve_broker(
    config: &ResolvedConfig,
    store: &dyn CredentialStore,
) -> Result<BrokerSecrets, StatusError> {
    let token = require(store, keys::BROKER_TOKEN).await?;
    let account_id =
        setting_or_credential(config.account.id.as_deref(), store, keys::ACCOUNT_ID).await?;
    Ok(BrokerSecrets { token, account_id })
}

pub async fn resolve_chat(
    config: &ResolvedConfig,
    store: &dyn CredentialStore,
) -> Result<ChatSecrets, StatusError> {
    let token = require(store, keys::TELEGRAM_TOKEN).await?;
    let chat_id =
        setting_or_credential(config.telegram.chat_id.as_deref(), store, keys::CHAT_ID).await?;
    Ok(ChatSecrets { token, chat_id })
}

pub fn build_source(
    config: &ResolvedConfig,
    token: SecretString,
) -> Result<Arc<dyn MarketDataSource>, StatusError> {
    let mut client = TInvestClient::new(token)
        .map_err(|err| StatusError::configuration(format!("{err:#}")))?;
    if let Some(base_url) = config.account.api_base_url.as_deref() {
        client = client.with_base_url(base_url);
    }
    Ok(Arc::new(client))
}

pub fn build_formatter(config: &ResolvedConfig) -> ReportFormatter {
    ReportFormatter::new(
        config.display.metric_set(),
        config.display.locale,
        config.display.amount_style(),
    )
}

/// Build the status service for `mode`, loading its baseline.
pub async fn build_service(
    config: &ResolvedConfig,
    source: Arc<dyn MarketDataSource>,
    account_id: &str,
    mode: Mode,
    clock: Arc<dyn Clock>,
) -> AccountStatusService {
    let history_path = mode.history_path(config);
    info!(?mode, history = %history_path.display(), "building account status service");

    let history = Arc::new(JsonFileHistoryStore::new(history_path));
    let cache = PortfolioSnapshotCache::new(source, account_id, history)
        .with_clock(clock)
        .with_ttl(config.refresh.cache_ttl)
        .with_metric_set(config.display.metric_set())
        .with_operations_window(config.account.operations_window());

    AccountStatusService::open(
        cache,
        build_formatter(config),
        config.history.baseline_policy(),
    )
    .await
}

pub fn build_yield_report(
    config: &ResolvedConfig,
    source: Arc<dyn MarketDataSource>,
    account_id: &str,
) -> ShareYieldReport {
    ShareYieldReport::new(source, account_id)
        .with_clock(Arc::new(SystemClock))
        .with_invest_start(config.account.invest_start)
        .with_locale(config.display.locale)
}
