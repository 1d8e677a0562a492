use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final breakdown of a completed session, as computed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResults {
    /// User id of the winner, `None` for a draw.
    pub winner: Option<String>,
    pub participants: Vec<ParticipantResult>,
    #[serde(default)]
    pub breakdown: Vec<CategoryBreakdown>,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResult {
    pub user_id: String,
    pub display_name: String,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category: String,
    pub scores: Vec<CategoryScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub user_id: String,
    pub correct: u32,
    pub total: u32,
}

impl SessionResults {
    pub fn participant(&self, user_id: &str) -> Option<&ParticipantResult> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_parse_api_payload() {
        let json_data = r#"
        {
            "winner": "user-1",
            "participants": [
                {"userId": "user-1", "displayName": "Ana", "correctAnswers": 25, "wrongAnswers": 5, "percentage": 83.3},
                {"userId": "user-2", "displayName": "Ben", "correctAnswers": 20, "wrongAnswers": 10, "percentage": 66.7}
            ],
            "breakdown": [
                {"category": "Anatomy", "scores": [
                    {"userId": "user-1", "correct": 9, "total": 10},
                    {"userId": "user-2", "correct": 6, "total": 10}
                ]}
            ],
            "totalQuestions": 30,
            "completedAt": "2026-01-01T10:00:00Z"
        }
        "#;

        let results: SessionResults = serde_json::from_str(json_data).unwrap();

        assert_eq!(results.winner.as_deref(), Some("user-1"));
        assert_eq!(results.total_questions, 30);
        assert_eq!(results.breakdown[0].scores.len(), 2);
        assert_eq!(results.participant("user-2").unwrap().correct_answers, 20);
    }

    #[test]
    fn test_results_draw_has_no_winner() {
        let json_data = r#"{"winner": null, "participants": [], "totalQuestions": 10, "completedAt": "2026-01-01T10:00:00Z"}"#;

        let results: SessionResults = serde_json::from_str(json_data).unwrap();

        assert!(results.winner.is_none());
        assert!(results.breakdown.is_empty());
    }
}
