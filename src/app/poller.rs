use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

use crate::duration::format_duration;
use crate::notify::Notifier;
use crate::portfolio::AccountStatusService;

/// Result of one poll iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Cash balance unchanged; nothing sent.
    Unchanged,
    /// Status text delivered.
    Reported,
    /// Fetching or delivery failed; the error notice was attempted.
    Failed(String),
}

/// Periodic change watcher: reports the account status whenever the cash
/// balance moves.
pub struct Poller {
    service: AccountStatusService,
    notifier: Arc<dyn Notifier>,
    chat_id: String,
    interval: Duration,
    jitter: Duration,
}

impl Poller {
    pub fn new(service: AccountStatusService, notifier: Arc<dyn Notifier>, chat_id: impl Into<String>) -> Self {
        Self {
            service,
            notifier,
            chat_id: chat_id.into(),
            interval: Duration::from_secs(31),
            jitter: Duration::ZERO,
        }
    }

    pub fn with_interval(mut self, interval: Duration, jitter: Duration) -> Self {
        self.interval = interval;
        self.jitter = jitter;
        self
    }

    pub fn service(&self) -> &AccountStatusService {
        &self.service
    }

    pub async fn poll_once(&mut self) -> PollOutcome {
        match self.check_and_report().await {
            Ok(true) => PollOutcome::Reported,
            Ok(false) => PollOutcome::Unchanged,
            Err(err) => {
                let message = format!("{err:#}");
                error!(error = %message, "poll cycle failed");
                let notice = self.service.formatter().locale().error_notice();
                if let Err(send_err) = self.notifier.notify(&self.chat_id, notice).await {
                    warn!(error = %format!("{send_err:#}"), "failed to deliver error notice");
                }
                PollOutcome::Failed(message)
            }
        }
    }

    /// A cycle that fails after detecting a change rewinds the service
    /// baselines, so the next cycle detects the same change and reports it.
    async fn check_and_report(&mut self) -> anyhow::Result<bool> {
        let checkpoint = self.service.checkpoint();
        let result = self.report_if_changed().await;
        if result.is_err() {
            self.service.restore(checkpoint);
        }
        result
    }

    async fn report_if_changed(&mut self) -> anyhow::Result<bool> {
        if !self.service.has_alertable_change().await? {
            return Ok(false);
        }
        let text = self.service.status_text().await?;
        self.notifier.notify(&self.chat_id, &text).await?;
        Ok(true)
    }

    /// Poll until Ctrl-C. The delay runs from the end of one iteration to the
    /// start of the next.
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(
            interval = %format_duration(self.interval),
            jitter = %format_duration(self.jitter),
            "poller started"
        );

        loop {
            let outcome = self.poll_once().await;
            info!(?outcome, "poll cycle finished");

            let sleep = tokio::time::sleep(compute_next_delay(self.interval, self.jitter));
            tokio::pin!(sleep);

            tokio::select! {
                _ = &mut sleep => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("poller stopping");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// `interval` shifted by a uniform random offset in `[-jitter, +jitter]`,
/// never below one second.
pub fn compute_next_delay(interval: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return interval;
    }

    let base_ms = interval.as_millis().min(u128::from(u64::MAX)) as i128;
    let jitter_ms = jitter.as_millis().min(u128::from(u64::MAX)) as i128;
    let offset = rand::thread_rng().gen_range(-jitter_ms..=jitter_ms);

    let delay_ms = (base_ms + offset).clamp(1_000, i128::from(u64::MAX)) as u64;
    Duration::from_millis(delay_ms)
}
