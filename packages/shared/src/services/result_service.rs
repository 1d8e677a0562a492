use std::sync::Arc;

use tracing::{info, warn};

use crate::models::lifecycle::DisconnectReason;
use crate::models::results::SessionResults;
use crate::repositories::session_repository::SessionRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Won,
    Lost,
    Draw,
}

/// What the results screen shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Outcome {
        results: SessionResults,
        verdict: Verdict,
    },
    /// The peer vanished mid-game and the local player wins by forfeit.
    Forfeit { reason: DisconnectReason },
    Unavailable { message: String },
}

pub struct ResultPresenter {
    repository: Arc<dyn SessionRepository + Send + Sync>,
    self_user_id: String,
}

impl ResultPresenter {
    pub fn new(repository: Arc<dyn SessionRepository + Send + Sync>, self_user_id: &str) -> Self {
        ResultPresenter {
            repository,
            self_user_id: self_user_id.to_string(),
        }
    }

    /// Fetches the final breakdown once. A failure is shown, not retried.
    pub async fn present(&self, session_id: &str) -> ResultView {
        match self.repository.get_results(session_id).await {
            Ok(results) => {
                let verdict = self.verdict(&results);
                info!("Session {} finished: {:?}", session_id, verdict);
                ResultView::Outcome { results, verdict }
            }
            Err(e) => {
                warn!("Could not load results for session {}: {}", session_id, e);
                ResultView::Unavailable {
                    message: format!("Results are not available: {}", e),
                }
            }
        }
    }

    pub fn forfeit(&self) -> ResultView {
        ResultView::Forfeit {
            reason: DisconnectReason::Timeout,
        }
    }

    fn verdict(&self, results: &SessionResults) -> Verdict {
        match results.winner.as_deref() {
            None => Verdict::Draw,
            Some(winner) if winner == self.self_user_id => Verdict::Won,
            Some(_) => Verdict::Lost,
        }
    }
}

/// Plain-text rendering used by the terminal client.
pub fn render_result(view: &ResultView) -> Vec<String> {
    match view {
        ResultView::Outcome { results, verdict } => {
            let headline = match verdict {
                Verdict::Won => "You won!",
                Verdict::Lost => "You lost.",
                Verdict::Draw => "It's a draw.",
            };
            let mut lines = vec![
                headline.to_string(),
                format!("{} questions", results.total_questions),
            ];
            for participant in &results.participants {
                lines.push(format!(
                    "  {:<20} {:>3} correct {:>3} wrong {:>6.1}%",
                    participant.display_name,
                    participant.correct_answers,
                    participant.wrong_answers,
                    participant.percentage
                ));
            }
            for category in &results.breakdown {
                let scores: Vec<String> = category
                    .scores
                    .iter()
                    .map(|score| {
                        let name = results
                            .participant(&score.user_id)
                            .map(|p| p.display_name.as_str())
                            .unwrap_or(score.user_id.as_str());
                        format!("{} {}/{}", name, score.correct, score.total)
                    })
                    .collect();
                lines.push(format!("  {}: {}", category.category, scores.join(", ")));
            }
            lines
        }
        ResultView::Forfeit { reason } => vec![
            format!("{}.", reason),
            "You win by forfeit.".to_string(),
        ],
        ResultView::Unavailable { message } => vec![message.clone()],
    }
}
