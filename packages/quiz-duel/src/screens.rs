use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use shared::config::DISCONNECT_TIMEOUT;
use shared::models::lifecycle::{DisconnectReason, LocalState, NavigationAction};
use shared::repositories::session_repository::SessionRepository;
use shared::services::polling_synchronizer::PollingSynchronizer;
use shared::services::readiness_service::ReadinessHandshake;
use shared::services::result_service::{render_result, ResultPresenter, ResultView};
use shared::services::session_lifecycle::SessionLifecycle;
use shared::services::session_service::SessionService;

/// Input a player can give on any lifecycle screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ready,
    Leave,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "ready" => Some(Command::Ready),
            "q" | "quit" | "leave" => Some(Command::Leave),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Lobby,
    Ready,
    Game,
    Results,
    Disconnected(DisconnectReason),
    Left,
}

impl Screen {
    fn after(action: NavigationAction) -> Option<Screen> {
        match action {
            NavigationAction::None => None,
            NavigationAction::NavigateToReady => Some(Screen::Ready),
            NavigationAction::NavigateToGame => Some(Screen::Game),
            NavigationAction::NavigateToResults => Some(Screen::Results),
            NavigationAction::NavigateToDisconnected(reason) => Some(Screen::Disconnected(reason)),
        }
    }

    fn is_lifecycle(&self) -> bool {
        matches!(self, Screen::Lobby | Screen::Ready | Screen::Game)
    }
}

/// Drives one player through lobby, ready and game screens of a session.
pub struct SessionScreens {
    session_id: String,
    label: String,
    repository: Arc<dyn SessionRepository + Send + Sync>,
    lifecycle: Arc<Mutex<SessionLifecycle>>,
    handshake: ReadinessHandshake,
    service: SessionService,
    presenter: ResultPresenter,
    poll_interval: Duration,
}

impl SessionScreens {
    pub fn new(
        session_id: &str,
        self_user_id: &str,
        repository: Arc<dyn SessionRepository + Send + Sync>,
        poll_interval: Duration,
    ) -> Self {
        let lifecycle = Arc::new(Mutex::new(SessionLifecycle::new(
            session_id,
            self_user_id,
            DISCONNECT_TIMEOUT,
        )));
        SessionScreens {
            session_id: session_id.to_string(),
            label: self_user_id.to_string(),
            handshake: ReadinessHandshake::new(repository.clone(), lifecycle.clone()),
            service: SessionService::new(repository.clone()),
            presenter: ResultPresenter::new(repository.clone(), self_user_id),
            repository,
            lifecycle,
            poll_interval,
        }
    }

    pub fn lifecycle(&self) -> Arc<Mutex<SessionLifecycle>> {
        self.lifecycle.clone()
    }

    /// Runs screens until the session leaves the lifecycle and returns the
    /// screen it ended on.
    pub async fn run(&self, commands: &mut mpsc::UnboundedReceiver<Command>) -> anyhow::Result<Screen> {
        let mut screen = Screen::Lobby;
        let mut input_open = true;
        while screen.is_lifecycle() {
            self.announce(screen);
            screen = self.run_screen(commands, &mut input_open).await?;
        }
        Ok(screen)
    }

    /// Resolves the screen the lifecycle ended on into something to show.
    pub async fn conclude(&self, screen: Screen) -> Vec<String> {
        match screen {
            Screen::Results => render_result(&self.presenter.present(&self.session_id).await),
            Screen::Disconnected(DisconnectReason::Timeout) => render_result(&self.presenter.forfeit()),
            Screen::Disconnected(DisconnectReason::Left) => {
                vec![format!("{}.", DisconnectReason::Left)]
            }
            Screen::Left => vec!["You left the session.".to_string()],
            other => render_result(&ResultView::Unavailable {
                message: format!("Session stopped on the {:?} screen", other),
            }),
        }
    }

    // One screen's scope. The poller is dropped, and therefore stopped, on
    // every exit path.
    async fn run_screen(
        &self,
        commands: &mut mpsc::UnboundedReceiver<Command>,
        input_open: &mut bool,
    ) -> anyhow::Result<Screen> {
        let (_poller, mut navigation) = PollingSynchronizer::start(
            &self.session_id,
            self.repository.clone(),
            self.lifecycle.clone(),
            self.poll_interval,
        );

        loop {
            tokio::select! {
                action = navigation.recv() => match action {
                    Some(action) => {
                        if let Some(next) = Screen::after(action) {
                            return Ok(next);
                        }
                    }
                    None => return self.screen_after_poller_exit().await,
                },
                command = commands.recv(), if *input_open => match command {
                    Some(Command::Ready) => match self.handshake.declare_ready().await {
                        Ok(action) => {
                            if let Some(next) = Screen::after(action) {
                                return Ok(next);
                            }
                            println!("[{}] Ready. Waiting for your opponent...", self.label);
                        }
                        Err(e) => println!("[{}] Could not declare ready: {}", self.label, e),
                    },
                    Some(Command::Leave) => match self.service.leave_session(&self.session_id).await {
                        Ok(()) => {
                            self.lifecycle.lock().await.mark_left();
                            return Ok(Screen::Left);
                        }
                        Err(e) => println!("[{}] Could not leave the session: {}", self.label, e),
                    },
                    None => {
                        info!("Input closed for {}; following the session only", self.label);
                        *input_open = false;
                    }
                },
            }
        }
    }

    async fn screen_after_poller_exit(&self) -> anyhow::Result<Screen> {
        let (state, left_by_self) = {
            let lifecycle = self.lifecycle.lock().await;
            (lifecycle.state(), lifecycle.left_by_self())
        };
        match state {
            LocalState::Cancelled if left_by_self => Ok(Screen::Left),
            LocalState::Cancelled => Ok(Screen::Disconnected(DisconnectReason::Left)),
            LocalState::Finished => Ok(Screen::Results),
            other => {
                warn!("Poller for session {} stopped in {:?}", self.session_id, other);
                bail!("status polling stopped unexpectedly in {:?}", other)
            }
        }
    }

    fn announce(&self, screen: Screen) {
        let line = match screen {
            Screen::Lobby => "In the lobby. Type 'r' when ready, 'q' to leave.",
            Screen::Ready => "Both players are ready. Starting soon...",
            Screen::Game => "Match in progress. Type 'q' to forfeit.",
            _ => return,
        };
        println!("[{}] {}", self.label, line);
    }
}
