use thiserror::Error;

/// Everything that can go wrong talking to the backend, phrased for the alert
/// the user ends up seeing.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// HTTP succeeded but the envelope carried a failure status.
    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },

    #[error("server response did not contain the expected data")]
    MissingData,

    #[error("could not read server response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("not signed in or session expired")]
    Unauthorized,

    #[error("could not read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Whether trying the same request again can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Rejected { status, .. } => *status,
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }
}
