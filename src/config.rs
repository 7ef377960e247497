use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialConfig;
use crate::duration::{deserialize_duration, serialize_duration};
use crate::format::AmountStyle;
use crate::models::MetricSet;
use crate::portfolio::{BaselinePolicy, Locale, OperationsWindow};

/// Brokerage account settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Account id; falls back to the `account_id` credential.
    pub id: Option<String>,

    /// Sum payouts from this date on. Takes precedence over `operations_lookback`.
    pub operations_from: Option<NaiveDate>,

    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub operations_lookback: Duration,

    /// First investment day, for the day counter in the yield report.
    pub invest_start: Option<NaiveDate>,

    /// Override of the broker REST endpoint.
    pub api_base_url: Option<String>,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            id: None,
            operations_from: None,
            operations_lookback: crate::portfolio::DEFAULT_OPERATIONS_LOOKBACK,
            invest_start: None,
            api_base_url: None,
        }
    }
}

impl AccountConfig {
    pub fn operations_window(&self) -> OperationsWindow {
        match self.operations_from {
            Some(date) => OperationsWindow::Since(date),
            None => OperationsWindow::Lookback(self.operations_lookback),
        }
    }
}

/// Cache and polling cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Maximum age of cached metrics.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub cache_ttl: Duration,

    /// Delay between the end of one poll and the start of the next.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub poll_interval: Duration,

    /// Uniform random offset (plus or minus) applied to each poll interval.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub poll_jitter: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            cache_ttl: crate::portfolio::DEFAULT_CACHE_TTL,
            poll_interval: Duration::from_secs(31),
            poll_jitter: Duration::ZERO,
        }
    }
}

/// History record locations, relative to the data directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub interactive: PathBuf,
    pub periodic: PathBuf,
    /// Compare each change check with the previous one instead of the record
    /// loaded at startup.
    pub advance_baseline: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            interactive: PathBuf::from("status_history.json"),
            periodic: PathBuf::from("cron_history.json"),
            advance_baseline: true,
        }
    }
}

impl HistoryConfig {
    pub fn baseline_policy(&self) -> BaselinePolicy {
        BaselinePolicy::from_flag(self.advance_baseline)
    }
}

/// Report rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub locale: Locale,

    /// Decimal places for amounts.
    pub decimals: u32,

    /// Thousands separator; empty disables grouping.
    pub grouping_separator: String,

    /// Wrap amounts in `*...*` for chat markdown.
    pub markdown: bool,

    /// Include coupon and dividend totals.
    pub track_payouts: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let style = AmountStyle::default();
        Self {
            locale: Locale::default(),
            decimals: style.decimals,
            grouping_separator: style.grouping_separator,
            markdown: style.markdown,
            track_payouts: true,
        }
    }
}

impl DisplayConfig {
    pub fn amount_style(&self) -> AmountStyle {
        AmountStyle {
            decimals: self.decimals,
            grouping_separator: self.grouping_separator.clone(),
            markdown: self.markdown,
        }
    }

    pub fn metric_set(&self) -> MetricSet {
        MetricSet::from_flag(self.track_payouts)
    }
}

/// Chat delivery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Destination chat; falls back to the `chat_id` credential.
    pub chat_id: Option<String>,

    /// Override of the Bot API endpoint.
    pub api_base_url: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file location.
    /// If not specified, defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    pub account: AccountConfig,
    pub refresh: RefreshConfig,
    pub history: HistoryConfig,
    pub display: DisplayConfig,
    pub telegram: TelegramConfig,
    pub credentials: CredentialConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Resolve the data directory path.
    ///
    /// If `data_dir` is set and relative, it's resolved relative to `config_dir`.
    /// If `data_dir` is not set, returns `config_dir`.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }

    fn resolve(self, config_dir: &Path) -> ResolvedConfig {
        let data_dir = self.resolve_data_dir(config_dir);
        ResolvedConfig {
            interactive_history: data_dir.join(&self.history.interactive),
            periodic_history: data_dir.join(&self.history.periodic),
            data_dir,
            account: self.account,
            refresh: self.refresh,
            history: self.history,
            display: self.display,
            telegram: self.telegram,
            credentials: self.credentials,
        }
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    /// History record of the interactive front-ends.
    pub interactive_history: PathBuf,
    /// History record of the periodic poller.
    pub periodic_history: PathBuf,
    pub account: AccountConfig,
    pub refresh: RefreshConfig,
    pub history: HistoryConfig,
    pub display: DisplayConfig,
    pub telegram: TelegramConfig,
    pub credentials: CredentialConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./invest-status.toml` if it exists in current directory
/// 2. `~/.local/share/invest-status/invest-status.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("invest-status.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("invest-status").join("invest-status.toml");
    }

    local_config
}

impl ResolvedConfig {
    /// Load and resolve config from a file path.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        Ok(Config::load(&config_path)?.resolve(config_dir))
    }

    /// Load config, falling back to defaults rooted at the intended config
    /// directory if the file doesn't exist.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };
        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?;

        Ok(Config::default().resolve(config_dir))
    }

    /// History record path for the given front-end.
    pub fn history_path(&self, periodic: bool) -> &Path {
        if periodic {
            &self.periodic_history
        } else {
            &self.interactive_history
        }
    }
}
