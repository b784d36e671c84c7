use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid index URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Fetch cancelled")]
    Cancelled,

    #[error("Fetch timed out after {0:?}")]
    TimedOut(std::time::Duration),

    #[error("Output stream closed by consumer")]
    OutputClosed,

    #[error("Window task failed: {0}")]
    Task(String),
}

impl FetchError {
    /// Whether another attempt at the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status(_) | Self::Decode(_))
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache entry is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to move cache entry into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Window ending at {0} is still open and cannot be cached")]
    OpenWindow(chrono::DateTime<chrono::Utc>),

    #[error("Cache task failed: {0}")]
    Task(String),
}
