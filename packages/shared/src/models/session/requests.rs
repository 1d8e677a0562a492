use serde::{Deserialize, Serialize};

use super::WinType;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub track_id: String,
    pub questions_count: u32,
    pub win_type: WinType,
    pub win_value: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionRequest {
    pub session_code: String,
}
