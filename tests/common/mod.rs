use std::sync::{Arc, Once};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;

use shared::config::{ClientConfig, DEFAULT_POLL_INTERVAL, DISCONNECT_TIMEOUT};
use shared::models::identity::ClientIdentity;
use shared::models::lifecycle::{LocalState, NavigationAction};
use shared::models::session::WinType;
use shared::repositories::in_memory_session_repository::{
    InMemorySessionClient, InMemorySessionStore,
};
use shared::services::polling_synchronizer::PollingSynchronizer;
use shared::services::readiness_service::ReadinessHandshake;
use shared::services::session_lifecycle::SessionLifecycle;
use shared::services::session_service::SessionService;

pub const TOKEN: &str = "test-token";

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

pub fn config_for(base_url: &str) -> ClientConfig {
    ClientConfig::default()
        .with_base_url(base_url)
        .with_auth_token(TOKEN)
}

pub fn participant_json(user_id: &str, role: &str, is_ready: bool) -> Value {
    json!({
        "userId": user_id,
        "displayName": user_id.to_uppercase(),
        "role": role,
        "isReady": is_ready,
    })
}

pub fn snapshot_json(status: &str, ready: (bool, bool)) -> Value {
    json!({
        "status": status,
        "sessionCode": null,
        "participants": [
            participant_json("creator", "creator", ready.0),
            participant_json("joiner", "joiner", ready.1),
        ],
    })
}

pub fn results_json(winner: Option<&str>) -> Value {
    json!({
        "winner": winner,
        "participants": [
            {
                "userId": "creator",
                "displayName": "CREATOR",
                "correctAnswers": 24,
                "wrongAnswers": 6,
                "percentage": 80.0,
            },
            {
                "userId": "joiner",
                "displayName": "JOINER",
                "correctAnswers": 18,
                "wrongAnswers": 12,
                "percentage": 60.0,
            },
        ],
        "breakdown": [
            {
                "category": "Pharmacology",
                "scores": [
                    { "userId": "creator", "correct": 8, "total": 10 },
                    { "userId": "joiner", "correct": 5, "total": 10 },
                ],
            },
        ],
        "totalQuestions": 30,
        "completedAt": "2026-03-01T10:15:00Z",
    })
}

/// One player's client side: its repository view, lifecycle and handshake.
pub struct Player {
    pub user_id: String,
    pub session_id: String,
    pub repository: Arc<InMemorySessionClient>,
    pub lifecycle: Arc<Mutex<SessionLifecycle>>,
    pub handshake: ReadinessHandshake,
}

impl Player {
    pub fn new(store: &InMemorySessionStore, user_id: &str, session_id: &str) -> Self {
        let repository = Arc::new(store.client(ClientIdentity::new(user_id, user_id)));
        let lifecycle = Arc::new(Mutex::new(SessionLifecycle::new(
            session_id,
            user_id,
            DISCONNECT_TIMEOUT,
        )));
        Player {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            handshake: ReadinessHandshake::new(repository.clone(), lifecycle.clone()),
            repository,
            lifecycle,
        }
    }

    pub fn service(&self) -> SessionService {
        SessionService::new(self.repository.clone())
    }

    pub fn start_polling(&self) -> (PollingSynchronizer, mpsc::UnboundedReceiver<NavigationAction>) {
        PollingSynchronizer::start(
            &self.session_id,
            self.repository.clone(),
            self.lifecycle.clone(),
            DEFAULT_POLL_INTERVAL,
        )
    }

    pub async fn state(&self) -> LocalState {
        self.lifecycle.lock().await.state()
    }
}

/// Creates a session as `creator` and joins it by code as `joiner`.
pub async fn matched_pair(
    store: &InMemorySessionStore,
    questions_count: u32,
    win_type: WinType,
    win_value: Option<u32>,
) -> (String, Player, Player) {
    let creator_service =
        SessionService::new(Arc::new(store.client(ClientIdentity::new("creator", "creator"))));
    let created = creator_service
        .create_session("track-1", questions_count, win_type, win_value)
        .await
        .expect("create session");

    let joiner_service =
        SessionService::new(Arc::new(store.client(ClientIdentity::new("joiner", "joiner"))));
    let joined = joiner_service
        .join_session(&created.session_code.to_lowercase())
        .await
        .expect("join session");
    assert_eq!(joined.session_id, created.session_id);

    let session_id = created.session_id;
    let creator = Player::new(store, "creator", &session_id);
    let joiner = Player::new(store, "joiner", &session_id);
    (session_id, creator, joiner)
}

/// Waits for the next navigation, failing the test if none comes.
pub async fn next_navigation(rx: &mut mpsc::UnboundedReceiver<NavigationAction>) -> NavigationAction {
    timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for navigation")
        .expect("poller stopped without navigating")
}
