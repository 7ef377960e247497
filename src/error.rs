use std::path::PathBuf;

/// Failure taxonomy of the account-status core.
///
/// Data-source and persistence failures are recoverable: the next scheduled
/// call simply tries again. Configuration failures stop a front-end before it
/// starts serving.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// Network, authorization or malformed-response failure while fetching.
    #[error("data source error: {0:#}")]
    DataSource(anyhow::Error),

    /// History record could not be written (reads degrade to an empty baseline).
    #[error("history persistence error at {}: {message}", .path.display())]
    Persistence { path: PathBuf, message: String },

    /// A required credential or identifier is missing.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StatusError {
    pub fn data_source(err: impl Into<anyhow::Error>) -> Self {
        Self::DataSource(err.into())
    }

    pub fn persistence(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// True when the process must not proceed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
