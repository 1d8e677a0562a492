//! Pure transition logic for one client's view of a session.
//!
//! Both players run the same reducer over the snapshots they poll. Because the
//! result depends only on the local state and the observed snapshot, the two
//! clients converge on the same target state without negotiating who moves
//! first.

use crate::models::lifecycle::{DisconnectReason, LocalState, NavigationAction, Transition};
use crate::models::session::responses::DeclareReadyResponse;
use crate::models::session::{SessionSnapshot, SessionStatus};

/// Apply one polled snapshot.
pub fn reduce(state: LocalState, snapshot: &SessionSnapshot) -> Transition {
    advance(state, snapshot.status, snapshot.all_ready())
}

/// Apply the answer of our own declare-ready call. The server's `allReady`
/// flag counts as "both ready" even while its aggregate status still says
/// `waiting`.
pub fn reduce_declared(state: LocalState, response: &DeclareReadyResponse) -> Transition {
    advance(state, response.status, response.all_ready)
}

/// The peer went silent for longer than the disconnect budget. Only a running
/// game ends this way; before the game starts the lobby simply keeps waiting.
pub fn reduce_peer_timeout(state: LocalState) -> Transition {
    match state {
        LocalState::InGame => Transition::to(
            LocalState::Finished,
            NavigationAction::NavigateToDisconnected(DisconnectReason::Timeout),
        ),
        other => Transition::stay(other),
    }
}

fn advance(state: LocalState, status: SessionStatus, all_ready: bool) -> Transition {
    if state.is_terminal() {
        return Transition::stay(state);
    }

    if status == SessionStatus::Cancelled {
        return Transition::to(
            LocalState::Cancelled,
            NavigationAction::NavigateToDisconnected(DisconnectReason::Left),
        );
    }

    match (state, status) {
        (_, SessionStatus::Completed) => {
            Transition::to(LocalState::Finished, NavigationAction::NavigateToResults)
        }
        (LocalState::Waiting | LocalState::BothReady, SessionStatus::InProgress) => {
            Transition::to(LocalState::InGame, NavigationAction::NavigateToGame)
        }
        (LocalState::Waiting, SessionStatus::Ready) => {
            Transition::to(LocalState::BothReady, NavigationAction::NavigateToReady)
        }
        // the aggregate status can lag behind the individual flags
        (LocalState::Waiting, SessionStatus::Waiting) if all_ready => {
            Transition::to(LocalState::BothReady, NavigationAction::NavigateToReady)
        }
        // forward only: stale or repeated statuses leave the state alone
        (current, _) => Transition::stay(current),
    }
}
