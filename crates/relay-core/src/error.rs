use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    InvalidDirective(String),

    #[error("no configuration found for repository: {0}")]
    UnknownRepository(String),

    #[error("failed to push notification to {queue}: {reason}")]
    DeliveryFailed { queue: String, reason: String },

    #[error("source queue unavailable: {0}")]
    SourceUnavailable(String),

    #[error("registry file not found: {}", .0.display())]
    RegistryNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
