use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::models::results::SessionResults;
use crate::models::session::requests::{CreateSessionRequest, JoinSessionRequest};
use crate::models::session::responses::{
    CreateSessionResponse, DeclareReadyResponse, ErrorResponse, JoinSessionResponse,
};
use crate::models::session::SessionSnapshot;
use crate::repositories::errors::session_repository_errors::SessionRepositoryError;

#[cfg(test)]
use mockall::automock;

/// The remote, authoritative session record. Every call acts on behalf of the
/// authenticated caller the implementation was built for.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, SessionRepositoryError>;

    async fn join_session(
        &self,
        session_code: &str,
    ) -> Result<JoinSessionResponse, SessionRepositoryError>;

    async fn get_session_status(
        &self,
        session_id: &str,
    ) -> Result<SessionSnapshot, SessionRepositoryError>;

    async fn declare_ready(
        &self,
        session_id: &str,
    ) -> Result<DeclareReadyResponse, SessionRepositoryError>;

    async fn leave_session(&self, session_id: &str) -> Result<(), SessionRepositoryError>;

    async fn get_results(&self, session_id: &str) -> Result<SessionResults, SessionRepositoryError>;
}

pub struct HttpSessionRepository {
    client: Client,
    config: ClientConfig,
}

impl HttpSessionRepository {
    pub fn new(config: ClientConfig) -> Result<Self, SessionRepositoryError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SessionRepositoryError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn session_url(&self, session_id: &str, action: &str) -> String {
        self.config
            .endpoint(&format!("/multiplayer/sessions/{}/{}", session_id, action))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.config.auth_token.trim_start_matches("Bearer ");
        request.bearer_auth(token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SessionRepositoryError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        debug!("Session API responded with {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        // prefer the server's {"error": ...} message over the raw body
        let body = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error)
            .unwrap_or(text);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SessionRepositoryError::Unauthorized,
            StatusCode::NOT_FOUND => SessionRepositoryError::NotFound,
            StatusCode::CONFLICT => SessionRepositoryError::Conflict(body),
            _ => SessionRepositoryError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            },
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SessionRepositoryError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| SessionRepositoryError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl SessionRepository for HttpSessionRepository {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, SessionRepositoryError> {
        let url = self.config.endpoint("/multiplayer/sessions");
        self.send_json(self.client.post(url).json(request)).await
    }

    async fn join_session(
        &self,
        session_code: &str,
    ) -> Result<JoinSessionResponse, SessionRepositoryError> {
        let url = self.config.endpoint("/multiplayer/sessions/join");
        let payload = JoinSessionRequest {
            session_code: session_code.to_string(),
        };
        self.send_json(self.client.post(url).json(&payload)).await
    }

    async fn get_session_status(
        &self,
        session_id: &str,
    ) -> Result<SessionSnapshot, SessionRepositoryError> {
        let url = self.session_url(session_id, "status");
        let mut snapshot: SessionSnapshot = self.send_json(self.client.get(url)).await?;
        if snapshot.session_id.is_empty() {
            snapshot.session_id = session_id.to_string();
        }
        Ok(snapshot)
    }

    async fn declare_ready(
        &self,
        session_id: &str,
    ) -> Result<DeclareReadyResponse, SessionRepositoryError> {
        let url = self.session_url(session_id, "ready");
        self.send_json(self.client.post(url)).await
    }

    async fn leave_session(&self, session_id: &str) -> Result<(), SessionRepositoryError> {
        let url = self.session_url(session_id, "leave");
        self.send(self.client.post(url)).await?;
        Ok(())
    }

    async fn get_results(&self, session_id: &str) -> Result<SessionResults, SessionRepositoryError> {
        let url = self.session_url(session_id, "results");
        self.send_json(self.client.get(url)).await
    }
}
