use serde::{Deserialize, Serialize};

use super::{Participant, SessionStatus};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub session_code: String,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionResponse {
    pub session_id: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclareReadyResponse {
    pub status: SessionStatus,
    pub all_ready: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
