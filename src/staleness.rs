//! Staleness detection for the cached portfolio snapshot.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

/// Lifecycle of the cached metrics, driven purely by elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing fetched yet.
    Cold,
    Fresh,
    Stale,
}

/// Result of a staleness check.
#[derive(Debug, Clone)]
pub struct StalenessCheck {
    pub is_stale: bool,
    pub age: Option<Duration>,
    pub threshold: Duration,
}

impl StalenessCheck {
    pub fn stale(age: Duration, threshold: Duration) -> Self {
        Self { is_stale: true, age: Some(age), threshold }
    }

    pub fn fresh(age: Duration, threshold: Duration) -> Self {
        Self { is_stale: false, age: Some(age), threshold }
    }

    pub fn missing(threshold: Duration) -> Self {
        Self { is_stale: true, age: None, threshold }
    }

    pub fn state(&self) -> CacheState {
        match (self.age, self.is_stale) {
            (None, _) => CacheState::Cold,
            (Some(_), true) => CacheState::Stale,
            (Some(_), false) => CacheState::Fresh,
        }
    }
}

/// Check whether a snapshot refreshed at `last_refresh` has outlived `ttl`.
///
/// The snapshot is stale only once its age strictly exceeds the TTL. A
/// refresh time in the future (clock adjusted backwards) counts as age zero.
pub fn check_cache_staleness(
    last_refresh: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> StalenessCheck {
    match last_refresh {
        Some(at) => {
            let age = (now - at).to_std().unwrap_or(Duration::ZERO);
            if age > ttl {
                StalenessCheck::stale(age, ttl)
            } else {
                StalenessCheck::fresh(age, ttl)
            }
        }
        None => StalenessCheck::missing(ttl),
    }
}

/// Log the outcome of a cache staleness check.
pub fn log_cache_staleness(account: &str, check: &StalenessCheck) {
    let age_str = check
        .age
        .map(crate::duration::format_duration)
        .unwrap_or_else(|| "never".to_string());

    debug!(
        account = account,
        age = %age_str,
        ttl = %crate::duration::format_duration(check.threshold),
        state = ?check.state(),
        "portfolio cache staleness check"
    );
}
