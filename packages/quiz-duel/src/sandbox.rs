use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use shared::models::identity::ClientIdentity;
use shared::models::results::{CategoryBreakdown, CategoryScore, ParticipantResult, SessionResults};
use shared::models::session::{SessionStatus, WinType};
use shared::repositories::in_memory_session_repository::InMemorySessionStore;
use shared::services::session_service::SessionService;

use crate::screens::{Command, Screen, SessionScreens};

const TRACK_ID: &str = "general-knowledge";
const QUESTIONS: u32 = 30;

/// Plays a full match between two local clients sharing one in-memory store:
/// create, join by code, both ready, game, results.
pub async fn run(interval: Duration) -> anyhow::Result<()> {
    let store = InMemorySessionStore::new().with_auto_start(true);
    let ana = ClientIdentity::new("ana", "Ana");
    let ben = ClientIdentity::new("ben", "Ben");
    let ana_repo = Arc::new(store.client(ana.clone()));
    let ben_repo = Arc::new(store.client(ben.clone()));

    let created = SessionService::new(ana_repo.clone())
        .create_session(TRACK_ID, QUESTIONS, WinType::HighestPercentage, None)
        .await?;
    println!("[ana] Created session, join code {}", created.session_code);

    let joined = SessionService::new(ben_repo.clone())
        .join_session(&created.session_code.to_lowercase())
        .await?;
    println!("[ben] Joined session with {} players", joined.participants.len());

    let session_id = created.session_id;
    let players = [
        SessionScreens::new(&session_id, &ana.user_id, ana_repo, interval),
        SessionScreens::new(&session_id, &ben.user_id, ben_repo, interval),
    ];

    let mut handles = Vec::new();
    for screens in players {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(Command::Ready)?;
        handles.push(tokio::spawn(async move {
            // keep the sender alive so input stays open for the whole match
            let _input = tx;
            let screen = screens.run(&mut rx).await?;
            Ok::<(SessionScreens, Screen), anyhow::Error>((screens, screen))
        }));
    }

    let quizmaster = tokio::spawn(finish_when_started(store.clone(), session_id.clone(), interval));

    for handle in handles {
        let (screens, screen) = handle.await??;
        for line in screens.conclude(screen).await {
            println!("{}", line);
        }
    }
    quizmaster.abort();
    Ok(())
}

// Stands in for the game itself: waits for the match to start, lets a few
// polls pass and then records a result.
async fn finish_when_started(store: InMemorySessionStore, session_id: String, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;
        let status = store.session(&session_id).await.map(|s| s.status);
        match status {
            Some(SessionStatus::InProgress) => break,
            Some(status) if status.is_terminal() => return,
            Some(status) => debug!("Sandbox session {} is {}", session_id, status),
            None => return,
        }
    }

    tokio::time::sleep(interval * 3).await;
    match store.complete_session(&session_id, canned_results()).await {
        Ok(()) => info!("Sandbox session {} completed", session_id),
        Err(e) => debug!("Sandbox session {} not completed: {}", session_id, e),
    }
}

fn canned_results() -> SessionResults {
    let result = |user_id: &str, name: &str, correct: u32| ParticipantResult {
        user_id: user_id.to_string(),
        display_name: name.to_string(),
        correct_answers: correct,
        wrong_answers: QUESTIONS - correct,
        percentage: f64::from(correct) * 100.0 / f64::from(QUESTIONS),
    };
    let score = |user_id: &str, correct: u32| CategoryScore {
        user_id: user_id.to_string(),
        correct,
        total: 15,
    };

    SessionResults {
        winner: Some("ana".to_string()),
        participants: vec![result("ana", "Ana", 24), result("ben", "Ben", 19)],
        breakdown: vec![
            CategoryBreakdown {
                category: "History".to_string(),
                scores: vec![score("ana", 13), score("ben", 9)],
            },
            CategoryBreakdown {
                category: "Science".to_string(),
                scores: vec![score("ana", 11), score("ben", 10)],
            },
        ],
        total_questions: QUESTIONS,
        completed_at: Utc::now(),
    }
}
