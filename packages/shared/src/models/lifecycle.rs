use serde::{Deserialize, Serialize};

/// Where this client believes the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocalState {
    Waiting,
    BothReady,
    InGame,
    Finished,
    Cancelled,
}

impl LocalState {
    pub fn rank(&self) -> u8 {
        match self {
            LocalState::Waiting => 0,
            LocalState::BothReady => 1,
            LocalState::InGame => 2,
            LocalState::Finished => 3,
            LocalState::Cancelled => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LocalState::Finished | LocalState::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectReason {
    /// A participant explicitly left and the server cancelled the session.
    Left,
    /// The peer stopped showing up in snapshots for longer than the budget.
    Timeout,
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::Left => write!(f, "Your opponent left the match"),
            DisconnectReason::Timeout => write!(f, "Your opponent disconnected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationAction {
    None,
    NavigateToReady,
    NavigateToGame,
    NavigateToDisconnected(DisconnectReason),
    NavigateToResults,
}

impl NavigationAction {
    pub fn is_none(&self) -> bool {
        matches!(self, NavigationAction::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: LocalState,
    pub action: NavigationAction,
}

impl Transition {
    pub fn stay(state: LocalState) -> Self {
        Transition {
            state,
            action: NavigationAction::None,
        }
    }

    pub fn to(state: LocalState, action: NavigationAction) -> Self {
        Transition { state, action }
    }
}
