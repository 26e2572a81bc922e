use thiserror::Error;

use aicreator_remote::RemoteError;

/// Failure surfaced at the repository boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Rejected before any I/O happened.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx from the backend, or a generation job that failed.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Local store or media file failure.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("no user is logged in")]
    NotLoggedIn,

    #[error("operation cancelled")]
    Cancelled,
}

impl SyncError {
    /// Short text suitable for a toast or status line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Network(_) => "Network error, please check your connection".into(),
            Self::Rejected { status, message } => {
                if message.is_empty() {
                    format!("Request failed ({})", status)
                } else {
                    format!("Request failed ({}): {}", status, message)
                }
            }
            Self::Storage(_) => "Could not access local data".into(),
            Self::NotLoggedIn => "Please log in first".into(),
            Self::Cancelled => "Operation cancelled".into(),
        }
    }
}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Network(msg) => Self::Network(msg),
            RemoteError::Rejected { status, message } => Self::Rejected { status, message },
            RemoteError::Decode(msg) => Self::Network(format!("unexpected response: {}", msg)),
            RemoteError::Io(msg) => Self::Storage(msg),
        }
    }
}

impl From<anyhow::Error> for SyncError {
    fn from(e: anyhow::Error) -> Self {
        Self::Storage(format!("{:#}", e))
    }
}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(e: tokio::task::JoinError) -> Self {
        if e.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Storage(format!("background task failed: {}", e))
        }
    }
}
