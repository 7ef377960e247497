use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::StatusError;
use crate::models::HistorySnapshot;

use super::HistoryStore;

/// History record kept as a single pretty-printed JSON file.
///
/// ```text
/// data/
///   status_history.json   # interactive mode
///   cron_history.json     # periodic mode
/// ```
///
/// Saves write a sibling `*.tmp` file and rename it over the record, so a
/// crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "history.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_snapshot(&self) -> Result<Option<HistorySnapshot>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                let snapshot = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse JSON from {:?}", self.path))?;
                Ok(Some(snapshot))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", self.path)),
        }
    }

    async fn write_snapshot(&self, snapshot: &HistorySnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create directory")?;
        }

        let content =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize JSON")?;
        let tmp = self.temp_path();
        fs::write(&tmp, content)
            .await
            .with_context(|| format!("Failed to write {tmp:?}"))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("Failed to replace {:?}", self.path));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn load(&self) -> HistorySnapshot {
        match self.read_snapshot().await {
            Ok(Some(snapshot)) => {
                debug!(path = %self.path.display(), "loaded history baseline");
                snapshot
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "no history baseline yet");
                HistorySnapshot::empty()
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %format!("{err:#}"),
                    "ignoring unreadable history baseline"
                );
                HistorySnapshot::empty()
            }
        }
    }

    async fn save(&self, snapshot: &HistorySnapshot) -> Result<(), StatusError> {
        self.write_snapshot(snapshot)
            .await
            .map_err(|err| StatusError::persistence(&self.path, format!("{err:#}")))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_file_sits_next_to_record() {
        let store = JsonFileHistoryStore::new("/var/lib/invest-status/cron_history.json");
        assert_eq!(
            store.temp_path(),
            PathBuf::from("/var/lib/invest-status/cron_history.json.tmp")
        );
    }
}
