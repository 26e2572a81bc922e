use thiserror::Error;

/// Why a remote call produced no payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// No response: connect failure, timeout, broken body stream.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status, or the job failed.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 2xx with a body we could not decode.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Local file access while building a request or saving a download.
    #[error("file error: {0}")]
    Io(String),
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Rejected {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
