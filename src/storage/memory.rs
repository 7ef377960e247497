//! In-memory history store for tests and embedding.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Mutex;

use crate::error::StatusError;
use crate::models::HistorySnapshot;

use super::HistoryStore;

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    snapshot: Mutex<Option<HistorySnapshot>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record.
    pub fn with_snapshot(snapshot: HistorySnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail, as a full disk would.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn current(&self) -> Option<HistorySnapshot> {
        self.snapshot.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self) -> HistorySnapshot {
        self.snapshot.lock().await.clone().unwrap_or_default()
    }

    async fn save(&self, snapshot: &HistorySnapshot) -> Result<(), StatusError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StatusError::persistence(self.location(), "simulated write failure"));
        }
        *self.snapshot.lock().await = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
