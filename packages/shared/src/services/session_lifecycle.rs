use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::models::lifecycle::{LocalState, NavigationAction, Transition};
use crate::models::session::responses::DeclareReadyResponse;
use crate::models::session::SessionSnapshot;
use crate::services::state_machine::{reduce, reduce_declared, reduce_peer_timeout};
use crate::services::termination_detector::TerminationDetector;

/// Readiness of both seats as this client last saw it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessView {
    pub self_ready: bool,
    pub peer_ready: bool,
    pub peer_present: bool,
}

/// Owns the local state of one session screen and is the only thing that
/// mutates it. Snapshots from the poller and answers from the readiness
/// handshake both funnel through here.
#[derive(Debug)]
pub struct SessionLifecycle {
    session_id: String,
    self_user_id: String,
    state: LocalState,
    detector: TerminationDetector,
    readiness: ReadinessView,
    last_snapshot: Option<SessionSnapshot>,
    left_by_self: bool,
}

impl SessionLifecycle {
    pub fn new(session_id: &str, self_user_id: &str, disconnect_budget: Duration) -> Self {
        SessionLifecycle {
            session_id: session_id.to_string(),
            self_user_id: self_user_id.to_string(),
            state: LocalState::Waiting,
            detector: TerminationDetector::new(disconnect_budget, self_user_id),
            readiness: ReadinessView::default(),
            last_snapshot: None,
            left_by_self: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn self_user_id(&self) -> &str {
        &self.self_user_id
    }

    pub fn state(&self) -> LocalState {
        self.state
    }

    pub fn readiness(&self) -> ReadinessView {
        self.readiness
    }

    /// True when this client's own leave ended the session, as opposed to
    /// the server cancelling it under us.
    pub fn left_by_self(&self) -> bool {
        self.left_by_self
    }

    pub fn last_snapshot(&self) -> Option<&SessionSnapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn apply_snapshot(&mut self, snapshot: SessionSnapshot, now: Instant) -> NavigationAction {
        if !snapshot.session_id.is_empty() && snapshot.session_id != self.session_id {
            debug!(
                "Ignoring snapshot for session {} while tracking {}",
                snapshot.session_id, self.session_id
            );
            return NavigationAction::None;
        }

        self.merge_readiness(&snapshot);
        let transition = reduce(self.state, &snapshot);
        let mut action = self.commit(transition, now);

        if self.state == LocalState::InGame {
            if let Some(reason) = self.detector.observe(&snapshot, now) {
                debug!("Termination detector reported {:?}", reason);
                action = self.commit(reduce_peer_timeout(self.state), now);
            }
        }

        self.last_snapshot = Some(snapshot);
        action
    }

    pub fn apply_declared(&mut self, response: &DeclareReadyResponse, now: Instant) -> NavigationAction {
        self.readiness.self_ready = true;
        if response.all_ready {
            self.readiness.peer_ready = true;
        }
        self.commit(reduce_declared(self.state, response), now)
    }

    /// A status poll failed. Only a running game can end this way.
    pub fn apply_poll_failure(&mut self, now: Instant) -> NavigationAction {
        if self.state != LocalState::InGame {
            return NavigationAction::None;
        }
        match self.detector.observe_failure(now) {
            Some(_) => self.commit(reduce_peer_timeout(self.state), now),
            None => NavigationAction::None,
        }
    }

    /// This client left on purpose; there is nothing to navigate to.
    pub fn mark_left(&mut self) {
        if !self.state.is_terminal() {
            info!("Left session {}", self.session_id);
            self.state = LocalState::Cancelled;
            self.left_by_self = true;
        }
    }

    pub fn mark_self_ready(&mut self) {
        self.readiness.self_ready = true;
    }

    fn merge_readiness(&mut self, snapshot: &SessionSnapshot) {
        if let Some(me) = snapshot.participant(&self.self_user_id) {
            self.readiness.self_ready |= me.is_ready;
        }
        match snapshot.peer_of(&self.self_user_id) {
            Some(peer) => {
                self.readiness.peer_present = true;
                self.readiness.peer_ready |= peer.is_ready;
            }
            None => self.readiness.peer_present = false,
        }
    }

    fn commit(&mut self, transition: Transition, now: Instant) -> NavigationAction {
        if transition.state != self.state {
            info!(
                "Session {} moved {:?} -> {:?} ({:?})",
                self.session_id, self.state, transition.state, transition.action
            );
            if transition.state == LocalState::InGame {
                self.detector.arm(now);
            }
            self.state = transition.state;
        }
        transition.action
    }
}
