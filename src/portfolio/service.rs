use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::StatusError;
use crate::models::HistorySnapshot;
use crate::staleness::CacheState;

use super::{ChangeDetector, PortfolioSnapshotCache, ReportFormatter};

/// Where `has_alertable_change` takes its baseline from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselinePolicy {
    /// Compare against the previous check's observation. The persisted record
    /// only seeds the first comparison; later ones use the in-memory value even
    /// when saving it failed.
    #[default]
    PreviousCheck,
    /// Keep the record loaded when the service was opened.
    LoadOnce,
}

impl BaselinePolicy {
    pub fn from_flag(advance: bool) -> Self {
        if advance {
            BaselinePolicy::PreviousCheck
        } else {
            BaselinePolicy::LoadOnce
        }
    }
}

/// The account-status surface used by front-ends.
///
/// One instance per (account, history key). Calls are network-bound; the
/// service holds no locks and is driven by a single task.
pub struct AccountStatusService {
    cache: PortfolioSnapshotCache,
    formatter: ReportFormatter,
    detector: ChangeDetector,
    policy: BaselinePolicy,
    /// Deltas in `status_text` are computed against this; replaced after each render.
    render_baseline: HistorySnapshot,
    /// Used by `has_alertable_change` under [`BaselinePolicy::LoadOnce`].
    initial_baseline: HistorySnapshot,
    /// Last observation under [`BaselinePolicy::PreviousCheck`]; `None` until
    /// one exists in memory or in the store.
    detection_baseline: Option<HistorySnapshot>,
}

/// Saved baselines, for undoing a check whose report never reached anyone.
#[derive(Debug, Clone)]
pub struct BaselineCheckpoint {
    render: HistorySnapshot,
    detection: Option<HistorySnapshot>,
}

impl AccountStatusService {
    /// Build the service, loading the persisted baseline from the cache's history store.
    pub async fn open(
        cache: PortfolioSnapshotCache,
        formatter: ReportFormatter,
        policy: BaselinePolicy,
    ) -> Self {
        let baseline = cache.history().load().await;
        debug!(
            account = %cache.account_id(),
            location = %cache.history().location(),
            empty = baseline.is_empty(),
            "loaded status baseline"
        );
        Self {
            cache,
            formatter,
            detector: ChangeDetector::new(),
            policy,
            render_baseline: baseline.clone(),
            detection_baseline: (!baseline.is_empty()).then(|| baseline.clone()),
            initial_baseline: baseline,
        }
    }

    pub fn state(&self) -> CacheState {
        self.cache.state()
    }

    pub fn formatter(&self) -> &ReportFormatter {
        &self.formatter
    }

    pub fn cache(&self) -> &PortfolioSnapshotCache {
        &self.cache
    }

    pub fn render_baseline(&self) -> &HistorySnapshot {
        &self.render_baseline
    }

    /// Render current metrics against the last rendered (or persisted) baseline.
    pub async fn status_text(&mut self) -> Result<String, StatusError> {
        let current = self.cache.get_metrics().await?;
        let text = self.formatter.render(&current, &self.render_baseline);

        let at = self.cache.last_refresh().unwrap_or_else(Utc::now);
        self.render_baseline = HistorySnapshot::capture(&current, at);
        Ok(text)
    }

    /// Like [`status_text`](Self::status_text), but failures become the
    /// localized error notice after being logged.
    pub async fn status_text_or_notice(&mut self) -> String {
        self.status_text_logged()
            .await
            .unwrap_or_else(|| self.formatter.locale().error_notice().to_string())
    }

    /// Chat-ready status: the localized header followed by the status text,
    /// or the error notice alone.
    pub async fn status_message(&mut self) -> String {
        let locale = self.formatter.locale();
        match self.status_text_logged().await {
            Some(text) => format!("{}\n\n{text}", locale.status_header()),
            None => locale.error_notice().to_string(),
        }
    }

    async fn status_text_logged(&mut self) -> Option<String> {
        match self.status_text().await {
            Ok(text) => Some(text),
            Err(err) => {
                error!(
                    account = %self.cache.account_id(),
                    error = %err,
                    "failed to produce account status"
                );
                None
            }
        }
    }

    pub fn checkpoint(&self) -> BaselineCheckpoint {
        BaselineCheckpoint {
            render: self.render_baseline.clone(),
            detection: self.detection_baseline.clone(),
        }
    }

    /// Put the baselines back as they were at `checkpoint`, so the next check
    /// sees the same change again.
    pub fn restore(&mut self, checkpoint: BaselineCheckpoint) {
        self.render_baseline = checkpoint.render;
        self.detection_baseline = checkpoint.detection;
    }

    /// Refresh and compare the cash balance with the baseline.
    pub async fn has_alertable_change(&mut self) -> Result<bool, StatusError> {
        let baseline = match self.policy {
            BaselinePolicy::PreviousCheck => match &self.detection_baseline {
                Some(previous) => previous.clone(),
                None => self.cache.history().load().await,
            },
            BaselinePolicy::LoadOnce => self.initial_baseline.clone(),
        };

        let current = self.cache.refresh().await?;
        let changed = self.detector.has_changed(&current, Some(&baseline));
        if self.policy == BaselinePolicy::PreviousCheck {
            let at = self.cache.last_refresh().unwrap_or_else(Utc::now);
            self.detection_baseline = Some(HistorySnapshot::capture(&current, at));
        }
        info!(
            account = %self.cache.account_id(),
            changed,
            baseline = ?baseline.total_currencies,
            current = %current.total_currencies,
            "checked for cash balance change"
        );
        Ok(changed)
    }
}
