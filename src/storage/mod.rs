mod json_file;
mod memory;

pub use json_file::JsonFileHistoryStore;
pub use memory::MemoryHistoryStore;

use crate::error::StatusError;
use crate::models::HistorySnapshot;

/// Durable home of the last observed snapshot for one history key.
///
/// Each operating mode (interactive query, periodic poll) gets its own store
/// so their baselines never interfere.
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load the last record. Missing or unreadable records load as an empty
    /// snapshot; this never fails.
    async fn load(&self) -> HistorySnapshot;

    /// Replace the record wholesale.
    async fn save(&self, snapshot: &HistorySnapshot) -> Result<(), StatusError>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
