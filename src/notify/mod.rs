mod telegram;

pub use telegram::{BotCommand, ChatMessage, TelegramNotifier, Update};

use anyhow::Result;

/// Delivery channel for rendered status text.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, destination: &str, text: &str) -> Result<()>;
}
