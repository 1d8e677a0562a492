use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::models::lifecycle::DisconnectReason;
use crate::models::session::{SessionSnapshot, SessionStatus};

/// Tells an explicit leave apart from a peer that silently stopped responding.
///
/// Detection is purely client side. A heartbeat is any successful snapshot that
/// still lists the peer and, when the server reports a `lastSeenAt` for the
/// peer, shows it moved forward. A slow network on our own side looks the same
/// as a vanished peer once the budget runs out; that is an accepted limitation.
#[derive(Debug, Clone)]
pub struct TerminationDetector {
    budget: Duration,
    self_user_id: String,
    last_heartbeat: Option<Instant>,
    peer_last_seen: Option<DateTime<Utc>>,
}

impl TerminationDetector {
    pub fn new(budget: Duration, self_user_id: &str) -> Self {
        TerminationDetector {
            budget,
            self_user_id: self_user_id.to_string(),
            last_heartbeat: None,
            peer_last_seen: None,
        }
    }

    /// Starts the staleness clock. Called once when the game begins.
    pub fn arm(&mut self, now: Instant) {
        if self.last_heartbeat.is_none() {
            debug!("Disconnect detection armed with a {:?} budget", self.budget);
            self.last_heartbeat = Some(now);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.last_heartbeat.is_some()
    }

    /// Classifies a snapshot. A `cancelled` status always means someone left.
    pub fn observe(&mut self, snapshot: &SessionSnapshot, now: Instant) -> Option<DisconnectReason> {
        if snapshot.status == SessionStatus::Cancelled {
            return Some(DisconnectReason::Left);
        }
        if !self.is_armed() {
            return None;
        }

        if let Some(peer) = snapshot.peer_of(&self.self_user_id) {
            let moved = match (peer.last_seen_at, self.peer_last_seen) {
                (Some(seen), Some(previous)) => seen > previous,
                (Some(_), None) => true,
                // servers without heartbeats: presence is all we have
                (None, _) => true,
            };
            if moved {
                self.peer_last_seen = peer.last_seen_at;
                self.last_heartbeat = Some(now);
            }
        }

        self.check(now)
    }

    /// Called when a poll failed; failures never refresh the heartbeat.
    pub fn observe_failure(&mut self, now: Instant) -> Option<DisconnectReason> {
        self.check(now)
    }

    pub fn check(&self, now: Instant) -> Option<DisconnectReason> {
        let last = self.last_heartbeat?;
        let silence = now.saturating_duration_since(last);
        if silence > self.budget {
            warn!(
                "No heartbeat from the peer for {:?} (budget {:?})",
                silence, self.budget
            );
            return Some(DisconnectReason::Timeout);
        }
        None
    }
}
