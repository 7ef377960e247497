use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::notify::{BotCommand, TelegramNotifier, Update};
use crate::portfolio::{AccountStatusService, ShareYieldReport};

const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(25);
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Interactive chat front-end answering `/status` and `/yields`.
///
/// Replies always go to the configured chat.
pub struct StatusBot {
    telegram: TelegramNotifier,
    chat_id: String,
    service: AccountStatusService,
    yields: ShareYieldReport,
    poll_timeout: Duration,
    offset: Option<i64>,
}

impl StatusBot {
    pub fn new(
        telegram: TelegramNotifier,
        chat_id: impl Into<String>,
        service: AccountStatusService,
        yields: ShareYieldReport,
    ) -> Self {
        Self {
            telegram,
            chat_id: chat_id.into(),
            service,
            yields,
            poll_timeout: LONG_POLL_TIMEOUT,
            offset: None,
        }
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn commands(&self) -> Vec<BotCommand> {
        let locale = self.service.formatter().locale();
        vec![
            BotCommand::new("status", locale.status_command_description()),
            BotCommand::new("yields", locale.yields_command_description()),
        ]
    }

    pub async fn register_commands(&self) -> Result<()> {
        self.telegram.set_my_commands(&self.commands()).await
    }

    /// Answer one update. Returns whether a reply was sent.
    pub async fn handle_update(&mut self, update: &Update) -> Result<bool> {
        let Some(command) = update.message.as_ref().and_then(|m| m.command()) else {
            return Ok(false);
        };
        debug!(update_id = update.update_id, command, "handling bot command");

        let reply = match command {
            "status" => self.service.status_message().await,
            "yields" => self.yields_reply().await,
            _ => return Ok(false),
        };
        self.telegram.send_message(&self.chat_id, &reply).await?;
        Ok(true)
    }

    async fn yields_reply(&mut self) -> String {
        match self.yields.render().await {
            Ok(table) => format!("```\n{}\n```", table.trim_matches('\n')),
            Err(err) => {
                error!(error = %err, "yields command failed");
                self.service.formatter().locale().error_notice().to_string()
            }
        }
    }

    /// Fetch one batch of updates and answer them, advancing the offset.
    pub async fn poll_updates(&mut self) -> Result<usize> {
        let updates = self
            .telegram
            .get_updates(self.offset, self.poll_timeout)
            .await?;
        let mut handled = 0;
        for update in &updates {
            self.offset = Some(update.update_id + 1);
            match self.handle_update(update).await {
                Ok(true) => handled += 1,
                Ok(false) => {}
                Err(err) => warn!(error = %format!("{err:#}"), "failed to send bot reply"),
            }
        }
        Ok(handled)
    }

    /// Register commands, then long-poll until Ctrl-C.
    pub async fn run(mut self) -> Result<()> {
        if let Err(err) = self.register_commands().await {
            warn!(error = %format!("{err:#}"), "failed to register bot commands");
        }
        info!("bot started");

        loop {
            tokio::select! {
                result = self.poll_updates() => {
                    if let Err(err) = result {
                        warn!(error = %format!("{err:#}"), "polling updates failed");
                        tokio::time::sleep(ERROR_BACKOFF).await;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("bot stopping");
                    break;
                }
            }
        }

        Ok(())
    }
}
