pub mod requests;
pub mod responses;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_PARTICIPANTS: usize = 2;
pub const JOIN_CODE_LENGTH: usize = 6;
pub const MAX_QUESTIONS_COUNT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    Ready,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// Forward order of the lifecycle. `Cancelled` is reachable from anywhere,
    /// so it ranks above every other status.
    pub fn rank(&self) -> u8 {
        match self {
            SessionStatus::Waiting => 0,
            SessionStatus::Ready => 1,
            SessionStatus::InProgress => 2,
            SessionStatus::Completed => 3,
            SessionStatus::Cancelled => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionStatus::Waiting => "waiting",
            SessionStatus::Ready => "ready",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinType {
    FirstToErrors,
    HighestPercentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Creator,
    Joiner,
}

/// One player's state within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: String,
    pub display_name: String,
    pub role: ParticipantRole,
    pub is_ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Server-maintained heartbeat. Not every deployment reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl Participant {
    pub fn new(user_id: &str, display_name: &str, role: ParticipantRole) -> Self {
        Participant {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            role,
            is_ready: false,
            avatar: None,
            last_seen_at: None,
        }
    }
}

/// The authoritative record for one scheduled two-player match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub track_id: String,
    pub code: Option<String>,
    pub status: SessionStatus,
    pub questions_count: u32,
    pub win_type: WinType,
    pub win_value: Option<u32>,
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        track_id: &str,
        code: &str,
        questions_count: u32,
        win_type: WinType,
        win_value: Option<u32>,
        creator: Participant,
    ) -> Self {
        Session {
            id: Uuid::new_v4().to_string(),
            track_id: track_id.to_string(),
            code: Some(code.to_string()),
            status: SessionStatus::Waiting,
            questions_count,
            win_type,
            win_value,
            participants: vec![creator],
            created_at: Utc::now(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= MAX_PARTICIPANTS
    }

    pub fn all_ready(&self) -> bool {
        self.participants.len() == MAX_PARTICIPANTS && self.participants.iter().all(|p| p.is_ready)
    }

    pub fn participant_mut(&mut self, user_id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.user_id == user_id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            status: self.status,
            session_code: self.code.clone(),
            participants: self.participants.clone(),
        }
    }
}

/// One poll's observation of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(default)]
    pub session_id: String,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_code: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl SessionSnapshot {
    /// True once both seats are taken and both players declared themselves ready.
    pub fn all_ready(&self) -> bool {
        self.participants.len() == MAX_PARTICIPANTS && self.participants.iter().all(|p| p.is_ready)
    }

    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn peer_of(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id != user_id)
    }
}

/// Normalises a user-typed join code, or returns `None` when it cannot be a
/// valid code. Codes are case-insensitive and surrounding whitespace is ignored.
pub fn normalize_join_code(raw: &str) -> Option<String> {
    let code = raw.trim();
    if code.len() != JOIN_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(code.to_ascii_uppercase())
}
