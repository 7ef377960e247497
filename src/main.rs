use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use invest_status::app::{self, Mode, StatusBot};
use invest_status::clock::SystemClock;
use invest_status::config::{default_config_path, ResolvedConfig};
use invest_status::notify::TelegramNotifier;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "invest-status")]
#[command(about = "Brokerage account status with change tracking")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the account status with changes since the last run
    Status,
    /// Print per-share yields
    Yields,
    /// Show current configuration
    Config,
    /// Answer /status and /yields in the configured Telegram chat
    Bot,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = ResolvedConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match cli.command.unwrap_or(Command::Status) {
        Command::Config => {
            let output = app::config_output(&config_path, &config);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Status => {
            let store = config.credentials.build();
            let broker = app::resolve_broker(&config, store.as_ref()).await?;
            let source = app::build_source(&config, broker.token)?;
            let mut service = app::build_service(
                &config,
                source,
                &broker.account_id,
                Mode::Interactive,
                Arc::new(SystemClock),
            )
            .await;
            println!("{}", service.status_text().await?);
        }
        Command::Yields => {
            let store = config.credentials.build();
            let broker = app::resolve_broker(&config, store.as_ref()).await?;
            let source = app::build_source(&config, broker.token)?;
            let report = app::build_yield_report(&config, source, &broker.account_id);
            print!("{}", report.render().await?);
        }
        Command::Bot => {
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
                source.clone(),
                &broker.account_id,
                Mode::Interactive,
                Arc::new(SystemClock),
            )
            .await;
            let yields = app::build_yield_report(&config, source, &broker.account_id);

            StatusBot::new(telegram, chat.chat_id, service, yields)
                .run()
                .await?;
        }
    }

    Ok(())
}
