use std::sync::Arc;

use tracing::{error, info};

use crate::models::session::requests::CreateSessionRequest;
use crate::models::session::responses::{CreateSessionResponse, JoinSessionResponse};
use crate::models::session::{normalize_join_code, WinType, MAX_QUESTIONS_COUNT};
use crate::repositories::errors::session_repository_errors::SessionRepositoryError;
use crate::repositories::session_repository::SessionRepository;
use crate::services::errors::session_service_errors::SessionServiceError;

/// User-initiated session actions. Failures are returned to the caller as-is
/// and never retried here.
#[derive(Clone)]
pub struct SessionService {
    repository: Arc<dyn SessionRepository + Send + Sync>,
}

impl SessionService {
    pub fn new(repository: Arc<dyn SessionRepository + Send + Sync>) -> Self {
        SessionService { repository }
    }

    pub async fn create_session(
        &self,
        track_id: &str,
        questions_count: u32,
        win_type: WinType,
        win_value: Option<u32>,
    ) -> Result<CreateSessionResponse, SessionServiceError> {
        let request = build_create_request(track_id, questions_count, win_type, win_value)?;

        let response = self
            .repository
            .create_session(&request)
            .await
            .map_err(|e| {
                error!("Failed to create session on track {}: {}", track_id, e);
                SessionServiceError::from(e)
            })?;

        info!(
            "Created session {} with join code {}",
            response.session_id, response.session_code
        );
        Ok(response)
    }

    /// Joins by code. Malformed codes are rejected before any request is made.
    pub async fn join_session(
        &self,
        session_code: &str,
    ) -> Result<JoinSessionResponse, SessionServiceError> {
        let code = normalize_join_code(session_code)
            .ok_or_else(|| SessionServiceError::InvalidJoinCode(session_code.trim().to_string()))?;

        match self.repository.join_session(&code).await {
            Ok(response) => {
                info!("Joined session {} with code {}", response.session_id, code);
                Ok(response)
            }
            Err(SessionRepositoryError::Conflict(msg)) if msg.contains("full") => {
                Err(SessionServiceError::SessionFull)
            }
            Err(SessionRepositoryError::NotFound) => Err(SessionServiceError::InvalidJoinCode(code)),
            Err(e) => {
                error!("Failed to join session with code {}: {}", code, e);
                Err(SessionServiceError::from(e))
            }
        }
    }

    pub async fn leave_session(&self, session_id: &str) -> Result<(), SessionServiceError> {
        if session_id.is_empty() {
            return Err(SessionServiceError::InvalidState(
                "Session ID cannot be empty".to_string(),
            ));
        }

        self.repository
            .leave_session(session_id)
            .await
            .map_err(|e| {
                error!("Failed to leave session {}: {}", session_id, e);
                SessionServiceError::from(e)
            })?;

        info!("Left session {}", session_id);
        Ok(())
    }
}

pub fn build_create_request(
    track_id: &str,
    questions_count: u32,
    win_type: WinType,
    win_value: Option<u32>,
) -> Result<CreateSessionRequest, SessionServiceError> {
    if track_id.trim().is_empty() {
        return Err(SessionServiceError::InvalidConfiguration(
            "Track ID cannot be empty".to_string(),
        ));
    }
    if questions_count == 0 || questions_count > MAX_QUESTIONS_COUNT {
        return Err(SessionServiceError::InvalidConfiguration(format!(
            "Questions count must be between 1 and {}",
            MAX_QUESTIONS_COUNT
        )));
    }

    let win_value = match win_type {
        WinType::FirstToErrors => match win_value {
            Some(errors) if errors >= 1 && errors <= questions_count => Some(errors),
            _ => {
                return Err(SessionServiceError::InvalidConfiguration(format!(
                    "first_to_errors needs an error limit between 1 and {}",
                    questions_count
                )))
            }
        },
        WinType::HighestPercentage => None,
    };

    Ok(CreateSessionRequest {
        track_id: track_id.trim().to_string(),
        questions_count,
        win_type,
        win_value,
    })
}
