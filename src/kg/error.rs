use thiserror::Error;

/// Failures of a backend request. None of these escape the load controller.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("background worker stopped before responding")]
    WorkerGone,
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(error)
        }
    }
}

impl FetchError {
    /// Short text for toasts and inline messages.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout => "The graph service did not answer in time.".to_owned(),
            Self::Network(_) => "Could not reach the graph service.".to_owned(),
            Self::Status { status, .. } => format!("The graph service returned HTTP {status}."),
            Self::Decode(_) => "The graph service sent an unreadable response.".to_owned(),
            Self::WorkerGone => "The request was interrupted.".to_owned(),
        }
    }
}
