use crate::models::{HistorySnapshot, PortfolioMetrics};

/// Decides whether a fresh observation warrants an alert.
///
/// Only the available cash balance gates alerts; valuation fields move with
/// market prices on every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn new() -> Self {
        Self
    }

    /// True iff a baseline cash balance exists and differs exactly from the current one.
    pub fn has_changed(&self, current: &PortfolioMetrics, previous: Option<&HistorySnapshot>) -> bool {
        match previous.and_then(|p| p.total_currencies) {
            Some(baseline) => current.total_currencies != baseline,
            None => false,
        }
    }
}
