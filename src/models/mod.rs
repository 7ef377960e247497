mod metrics;
mod snapshot;

pub use metrics::{MetricField, MetricSet, PortfolioMetrics};
pub use snapshot::HistorySnapshot;
