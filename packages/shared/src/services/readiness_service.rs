use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::models::lifecycle::NavigationAction;
use crate::repositories::session_repository::SessionRepository;
use crate::services::errors::session_service_errors::SessionServiceError;
use crate::services::session_lifecycle::SessionLifecycle;

/// Lets this client declare itself ready exactly once per session attempt.
pub struct ReadinessHandshake {
    repository: Arc<dyn SessionRepository + Send + Sync>,
    lifecycle: Arc<Mutex<SessionLifecycle>>,
    // set while a declaration is in flight or has succeeded
    declared: AtomicBool,
}

impl ReadinessHandshake {
    pub fn new(
        repository: Arc<dyn SessionRepository + Send + Sync>,
        lifecycle: Arc<Mutex<SessionLifecycle>>,
    ) -> Self {
        ReadinessHandshake {
            repository,
            lifecycle,
            declared: AtomicBool::new(false),
        }
    }

    pub fn is_declared(&self) -> bool {
        self.declared.load(Ordering::Acquire)
    }

    /// Submits our readiness. Returns the navigation the answer calls for,
    /// which is `NavigateToReady` straight away when we were the last player
    /// to confirm. Repeated calls do not hit the network again.
    pub async fn declare_ready(&self) -> Result<NavigationAction, SessionServiceError> {
        let session_id = {
            let lifecycle = self.lifecycle.lock().await;
            if lifecycle.state().is_terminal() {
                return Err(SessionServiceError::InvalidState(
                    "the session has already ended".to_string(),
                ));
            }
            if lifecycle.readiness().self_ready {
                self.declared.store(true, Ordering::Release);
            }
            lifecycle.session_id().to_string()
        };

        if self
            .declared
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Readiness for session {} already declared", session_id);
            return Ok(NavigationAction::None);
        }

        match self.repository.declare_ready(&session_id).await {
            Ok(response) => {
                info!(
                    "Declared ready in session {} (status {}, all ready: {})",
                    session_id, response.status, response.all_ready
                );
                let mut lifecycle = self.lifecycle.lock().await;
                Ok(lifecycle.apply_declared(&response, Instant::now()))
            }
            Err(e) => {
                // leave the user free to retry deliberately
                self.declared.store(false, Ordering::Release);
                error!("Failed to declare ready in session {}: {}", session_id, e);
                Err(SessionServiceError::from(e))
            }
        }
    }
}
