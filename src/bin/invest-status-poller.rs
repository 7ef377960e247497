use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use invest_status::app::{self, Mode, Poller};
use invest_status::clock::SystemClock;
use invest_status::config::{default_config_path, ResolvedConfig};
use invest_status::duration::parse_duration;
use invest_status::notify::TelegramNotifier;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(name = "invest-status-poller")]
#[command(about = "Report account status to Telegram whenever the cash balance changes")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Poll interval override (e.g. 31s, 5m)
    #[arg(long, value_parser = parse_duration_arg)]
    interval: Option<Duration>,

    /// Jitter override (e.g. 0s, 10s)
    #[arg(long, value_parser = parse_duration_arg)]
    jitter: Option<Duration>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = ResolvedConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    if let Some(interval) = cli.interval {
        config.refresh.poll_interval = interval;
    }
    if let Some(jitter) = cli.jitter {
        config.refresh.poll_jitter = jitter;
    }

    let store = config.credentials.build();
    let broker = app::resolve_broker(&config, store.as_ref()).await?;
    let chat = app::resolve_chat(&config, store.as_ref()).await?;

    let mut telegram = TelegramNotifier::new(chat.token)?;
    if let Some(base_url) = config.telegram.api_base_url.as_deref() {
        telegram = telegram.with_base_url(base_url);
    }

    let source = app::build_source(&config, broker.token)?;
    let service = app::build_service(
        &config,
        source,
        &broker.account_id,
        Mode::Periodic,
        Arc::new(SystemClock),
    )
    .await;

    let mut poller = Poller::new(service, Arc::new(telegram), chat.chat_id)
        .with_interval(config.refresh.poll_interval, config.refresh.poll_jitter);

    if cli.once {
        let outcome = poller.poll_once().await;
        info!(?outcome, "single poll finished");
        return Ok(());
    }

    poller.run().await
}
