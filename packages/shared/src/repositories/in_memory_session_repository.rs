use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::identity::ClientIdentity;
use crate::models::results::SessionResults;
use crate::models::session::requests::CreateSessionRequest;
use crate::models::session::responses::{
    CreateSessionResponse, DeclareReadyResponse, JoinSessionResponse,
};
use crate::models::session::{
    normalize_join_code, Participant, ParticipantRole, Session, SessionSnapshot, SessionStatus,
    JOIN_CODE_LENGTH,
};
use crate::repositories::errors::session_repository_errors::SessionRepositoryError;
use crate::repositories::session_repository::SessionRepository;

#[derive(Default)]
struct StoreState {
    sessions: HashMap<String, Session>,
    results: HashMap<String, SessionResults>,
    unreachable: HashSet<String>,
}

/// An in-process stand-in for the session server. It keeps the authoritative
/// records and hands out one [`InMemorySessionClient`] per player.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    state: Arc<RwLock<StoreState>>,
    auto_start: bool,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the match on the first status read after both players are ready.
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn client(&self, identity: ClientIdentity) -> InMemorySessionClient {
        InMemorySessionClient {
            store: self.clone(),
            identity,
        }
    }

    pub async fn session(&self, session_id: &str) -> Option<Session> {
        self.state.read().await.sessions.get(session_id).cloned()
    }

    pub async fn start_match(&self, session_id: &str) -> Result<(), SessionRepositoryError> {
        let mut state = self.state.write().await;
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or(SessionRepositoryError::NotFound)?;

        if session.status != SessionStatus::Ready {
            return Err(SessionRepositoryError::Conflict(format!(
                "cannot start a session in status {}",
                session.status
            )));
        }
        session.status = SessionStatus::InProgress;
        info!("Session {} started", session_id);
        Ok(())
    }

    pub async fn complete_session(
        &self,
        session_id: &str,
        results: SessionResults,
    ) -> Result<(), SessionRepositoryError> {
        let mut state = self.state.write().await;
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or(SessionRepositoryError::NotFound)?;

        if session.status != SessionStatus::InProgress {
            return Err(SessionRepositoryError::Conflict(format!(
                "cannot complete a session in status {}",
                session.status
            )));
        }
        session.status = SessionStatus::Completed;
        state.results.insert(session_id.to_string(), results);
        info!("Session {} completed", session_id);
        Ok(())
    }

    /// Makes every call from `user_id` fail as if the device lost its network.
    pub async fn set_unreachable(&self, user_id: &str, unreachable: bool) {
        let mut state = self.state.write().await;
        if unreachable {
            state.unreachable.insert(user_id.to_string());
        } else {
            state.unreachable.remove(user_id);
        }
    }

    fn generate_code(state: &StoreState) -> String {
        loop {
            let code: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(JOIN_CODE_LENGTH)
                .map(char::from)
                .collect::<String>()
                .to_ascii_uppercase();
            let taken = state
                .sessions
                .values()
                .any(|s| s.code.as_deref() == Some(code.as_str()));
            if !taken {
                return code;
            }
        }
    }
}

fn touch(session: &mut Session, user_id: &str) {
    let now = Utc::now();
    if let Some(participant) = session.participant_mut(user_id) {
        // strictly increasing so a peer always sees the heartbeat move
        let next = match participant.last_seen_at {
            Some(previous) if previous >= now => previous + Duration::milliseconds(1),
            _ => now,
        };
        participant.last_seen_at = Some(next);
    }
}

/// One player's view of an [`InMemorySessionStore`].
#[derive(Clone)]
pub struct InMemorySessionClient {
    store: InMemorySessionStore,
    identity: ClientIdentity,
}

impl InMemorySessionClient {
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    async fn ensure_reachable(&self) -> Result<(), SessionRepositoryError> {
        let state = self.store.state.read().await;
        if state.unreachable.contains(&self.identity.user_id) {
            return Err(SessionRepositoryError::Network(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionClient {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, SessionRepositoryError> {
        self.ensure_reachable().await?;
        if request.questions_count == 0 {
            return Err(SessionRepositoryError::UnexpectedStatus {
                status: 400,
                body: "questionsCount must be positive".to_string(),
            });
        }

        let mut state = self.store.state.write().await;
        let code = InMemorySessionStore::generate_code(&state);
        let creator = Participant::new(
            &self.identity.user_id,
            &self.identity.display_name,
            ParticipantRole::Creator,
        );
        let mut session = Session::new(
            &request.track_id,
            &code,
            request.questions_count,
            request.win_type,
            request.win_value,
            creator,
        );
        touch(&mut session, &self.identity.user_id);

        let response = CreateSessionResponse {
            session_id: session.id.clone(),
            session_code: code,
            status: session.status,
        };
        debug!("Created session {} for {}", session.id, self.identity.user_id);
        state.sessions.insert(session.id.clone(), session);
        Ok(response)
    }

    async fn join_session(
        &self,
        session_code: &str,
    ) -> Result<JoinSessionResponse, SessionRepositoryError> {
        self.ensure_reachable().await?;
        let code = normalize_join_code(session_code).ok_or(SessionRepositoryError::NotFound)?;

        let mut state = self.store.state.write().await;
        let session = state
            .sessions
            .values_mut()
            .find(|s| s.code.as_deref() == Some(code.as_str()))
            .ok_or(SessionRepositoryError::NotFound)?;

        if session.status != SessionStatus::Waiting {
            return Err(SessionRepositoryError::Conflict(format!(
                "session is {}",
                session.status
            )));
        }

        let already_joined = session.participant_mut(&self.identity.user_id).is_some();
        if !already_joined {
            if session.is_full() {
                return Err(SessionRepositoryError::Conflict(
                    "session is full".to_string(),
                ));
            }
            session.participants.push(Participant::new(
                &self.identity.user_id,
                &self.identity.display_name,
                ParticipantRole::Joiner,
            ));
        }
        if session.is_full() {
            session.code = None;
        }
        touch(session, &self.identity.user_id);

        Ok(JoinSessionResponse {
            session_id: session.id.clone(),
            participants: session.participants.clone(),
            status: session.status,
        })
    }

    async fn get_session_status(
        &self,
        session_id: &str,
    ) -> Result<SessionSnapshot, SessionRepositoryError> {
        self.ensure_reachable().await?;
        let auto_start = self.store.auto_start;

        let mut state = self.store.state.write().await;
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or(SessionRepositoryError::NotFound)?;

        touch(session, &self.identity.user_id);
        if auto_start && session.status == SessionStatus::Ready {
            session.status = SessionStatus::InProgress;
            info!("Session {} started", session_id);
        }
        Ok(session.snapshot())
    }

    async fn declare_ready(
        &self,
        session_id: &str,
    ) -> Result<DeclareReadyResponse, SessionRepositoryError> {
        self.ensure_reachable().await?;

        let mut state = self.store.state.write().await;
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or(SessionRepositoryError::NotFound)?;

        let user_id = self.identity.user_id.as_str();
        if session.participant_mut(user_id).is_none() {
            return Err(SessionRepositoryError::Unauthorized);
        }

        // a peer may already have moved the session on; report where it is
        if session_accepts_ready(session.status) {
            if let Some(participant) = session.participant_mut(user_id) {
                participant.is_ready = true;
            }
            if session.all_ready() && session.status == SessionStatus::Waiting {
                session.status = SessionStatus::Ready;
                info!("Session {} has both players ready", session_id);
            }
        }
        touch(session, user_id);

        Ok(DeclareReadyResponse {
            status: session.status,
            all_ready: session.all_ready(),
        })
    }

    async fn leave_session(&self, session_id: &str) -> Result<(), SessionRepositoryError> {
        self.ensure_reachable().await?;

        let mut state = self.store.state.write().await;
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or(SessionRepositoryError::NotFound)?;

        if !session.status.is_terminal() {
            session.status = SessionStatus::Cancelled;
            session.code = None;
            info!("Session {} cancelled by {}", session_id, self.identity.user_id);
        }
        Ok(())
    }

    async fn get_results(&self, session_id: &str) -> Result<SessionResults, SessionRepositoryError> {
        self.ensure_reachable().await?;

        let state = self.store.state.read().await;
        state
            .results
            .get(session_id)
            .cloned()
            .ok_or(SessionRepositoryError::NotFound)
    }
}

fn session_accepts_ready(status: SessionStatus) -> bool {
    matches!(status, SessionStatus::Waiting | SessionStatus::Ready)
}
