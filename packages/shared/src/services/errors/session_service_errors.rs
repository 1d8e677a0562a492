use crate::repositories::errors::session_repository_errors::SessionRepositoryError;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionServiceError {
    RepositoryError(SessionRepositoryError),
    InvalidJoinCode(String),
    InvalidConfiguration(String),
    SessionFull,
    /// The action does not apply to the session's current state.
    InvalidState(String),
}

impl std::fmt::Display for SessionServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionServiceError::RepositoryError(err) => write!(f, "Repository error: {}", err),
            SessionServiceError::InvalidJoinCode(code) => {
                write!(f, "Invalid join code: '{}'", code)
            }
            SessionServiceError::InvalidConfiguration(msg) => {
                write!(f, "Invalid session configuration: {}", msg)
            }
            SessionServiceError::SessionFull => write!(f, "Session already has two players"),
            SessionServiceError::InvalidState(msg) => write!(f, "Invalid session state: {}", msg),
        }
    }
}

impl std::error::Error for SessionServiceError {}

impl From<SessionRepositoryError> for SessionServiceError {
    fn from(err: SessionRepositoryError) -> Self {
        SessionServiceError::RepositoryError(err)
    }
}
