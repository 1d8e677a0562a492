#[derive(Debug, Clone, PartialEq)]
pub enum SessionRepositoryError {
    NotFound,
    Unauthorized,
    Conflict(String),
    Network(String),
    Serialization(String),
    UnexpectedStatus { status: u16, body: String },
}

impl SessionRepositoryError {
    /// Failures that another attempt could plausibly get past.
    pub fn is_transient(&self) -> bool {
        match self {
            SessionRepositoryError::Network(_) => true,
            SessionRepositoryError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for SessionRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionRepositoryError::NotFound => write!(f, "Session not found"),
            SessionRepositoryError::Unauthorized => write!(f, "Not authorized for this session"),
            SessionRepositoryError::Conflict(msg) => write!(f, "Session conflict: {}", msg),
            SessionRepositoryError::Network(msg) => write!(f, "Network error: {}", msg),
            SessionRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            SessionRepositoryError::UnexpectedStatus { status, body } => {
                write!(f, "Unexpected status {}: {}", status, body)
            }
        }
    }
}

impl std::error::Error for SessionRepositoryError {}

impl From<reqwest::Error> for SessionRepositoryError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            SessionRepositoryError::Serialization(error.to_string())
        } else {
            SessionRepositoryError::Network(error.to_string())
        }
    }
}
