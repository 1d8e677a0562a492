//! Two clients racing against one in-memory session store.
//!
//! Time is paused, so the poll interval and the disconnect budget elapse
//! instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

use shared::config::{DEFAULT_POLL_INTERVAL, DISCONNECT_TIMEOUT};
use shared::models::lifecycle::{DisconnectReason, LocalState, NavigationAction};
use shared::models::results::{ParticipantResult, SessionResults};
use shared::models::session::{SessionStatus, WinType};
use shared::repositories::in_memory_session_repository::InMemorySessionStore;
use shared::services::result_service::{ResultPresenter, ResultView, Verdict};

use quiz_duel_tests::common::{init_tracing, matched_pair, next_navigation};

fn final_results() -> SessionResults {
    let result = |user_id: &str, correct: u32| ParticipantResult {
        user_id: user_id.to_string(),
        display_name: user_id.to_uppercase(),
        correct_answers: correct,
        wrong_answers: 30 - correct,
        percentage: f64::from(correct) * 100.0 / 30.0,
    };
    SessionResults {
        winner: Some("joiner".to_string()),
        participants: vec![result("creator", 20), result("joiner", 26)],
        breakdown: vec![],
        total_questions: 30,
        completed_at: Utc::now(),
    }
}

#[tokio::test(start_paused = true)]
async fn scenario_a_both_ready_then_both_reach_the_game() {
    init_tracing();
    let store = InMemorySessionStore::new();
    let (session_id, creator, joiner) =
        matched_pair(&store, 30, WinType::HighestPercentage, None).await;

    let session = store.session(&session_id).await.unwrap();
    assert_eq!(session.questions_count, 30);
    assert_eq!(session.win_type, WinType::HighestPercentage);
    assert_eq!(session.win_value, None);
    assert_eq!(session.participants.len(), 2);

    let (_creator_poller, mut creator_nav) = creator.start_polling();
    let (_joiner_poller, mut joiner_nav) = joiner.start_polling();

    assert_eq!(creator.handshake.declare_ready().await.unwrap(), NavigationAction::None);
    // the last player to confirm moves on straight from the response
    assert_eq!(
        joiner.handshake.declare_ready().await.unwrap(),
        NavigationAction::NavigateToReady
    );
    assert_eq!(next_navigation(&mut creator_nav).await, NavigationAction::NavigateToReady);

    store.start_match(&session_id).await.unwrap();

    assert_eq!(next_navigation(&mut creator_nav).await, NavigationAction::NavigateToGame);
    assert_eq!(next_navigation(&mut joiner_nav).await, NavigationAction::NavigateToGame);
    assert_eq!(creator.state().await, LocalState::InGame);
    assert_eq!(joiner.state().await, LocalState::InGame);
}

#[tokio::test(start_paused = true)]
async fn scenario_b_one_player_ready_stays_in_the_lobby() {
    let store = InMemorySessionStore::new().with_auto_start(true);
    let (_, creator, joiner) = matched_pair(&store, 10, WinType::FirstToErrors, Some(3)).await;

    let (_creator_poller, mut creator_nav) = creator.start_polling();
    let (_joiner_poller, mut joiner_nav) = joiner.start_polling();
    creator.handshake.declare_ready().await.unwrap();

    tokio::time::sleep(DEFAULT_POLL_INTERVAL * 10).await;

    assert!(creator_nav.try_recv().is_err());
    assert!(joiner_nav.try_recv().is_err());
    assert_eq!(creator.state().await, LocalState::Waiting);
    assert_eq!(joiner.state().await, LocalState::Waiting);

    let seen_by_joiner = joiner.lifecycle.lock().await.readiness();
    assert!(seen_by_joiner.peer_ready);
    assert!(!seen_by_joiner.self_ready);
    assert!(seen_by_joiner.peer_present);
}

#[tokio::test(start_paused = true)]
async fn scenario_c_leave_mid_game_reads_as_left() {
    let store = InMemorySessionStore::new().with_auto_start(true);
    let (_, creator, joiner) = matched_pair(&store, 30, WinType::HighestPercentage, None).await;

    let (_creator_poller, mut creator_nav) = creator.start_polling();
    let (mut joiner_poller, mut joiner_nav) = joiner.start_polling();
    creator.handshake.declare_ready().await.unwrap();
    joiner.handshake.declare_ready().await.unwrap();

    assert_eq!(next_navigation(&mut joiner_nav).await, NavigationAction::NavigateToGame);
    loop {
        if next_navigation(&mut creator_nav).await == NavigationAction::NavigateToGame {
            break;
        }
    }

    joiner_poller.stop();
    joiner.service().leave_session(&joiner.session_id).await.unwrap();
    joiner.lifecycle.lock().await.mark_left();

    assert_eq!(
        next_navigation(&mut creator_nav).await,
        NavigationAction::NavigateToDisconnected(DisconnectReason::Left)
    );
    assert_eq!(creator.state().await, LocalState::Cancelled);
    assert_eq!(joiner.state().await, LocalState::Cancelled);
    // the leaver's own screen is gone and gets no navigation
    assert!(joiner_nav.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn scenario_d_silent_peer_times_out_without_cancellation() {
    let store = InMemorySessionStore::new().with_auto_start(true);
    let (session_id, creator, joiner) =
        matched_pair(&store, 30, WinType::HighestPercentage, None).await;

    let (_creator_poller, mut creator_nav) = creator.start_polling();
    let (joiner_poller, mut joiner_nav) = joiner.start_polling();
    creator.handshake.declare_ready().await.unwrap();
    joiner.handshake.declare_ready().await.unwrap();

    assert_eq!(next_navigation(&mut joiner_nav).await, NavigationAction::NavigateToGame);
    loop {
        if next_navigation(&mut creator_nav).await == NavigationAction::NavigateToGame {
            break;
        }
    }

    // the joiner's app goes away without telling anyone
    drop(joiner_poller);
    let vanished = Instant::now();

    assert_eq!(
        next_navigation(&mut creator_nav).await,
        NavigationAction::NavigateToDisconnected(DisconnectReason::Timeout)
    );
    assert!(vanished.elapsed() >= DISCONNECT_TIMEOUT - DEFAULT_POLL_INTERVAL);
    assert_eq!(creator.state().await, LocalState::Finished);

    let session = store.session(&session_id).await.unwrap();
    assert_eq!(session.status, SessionStatus::InProgress);

    let presenter = ResultPresenter::new(creator.repository.clone(), &creator.user_id);
    assert!(matches!(presenter.forfeit(), ResultView::Forfeit { reason: DisconnectReason::Timeout }));
}

#[tokio::test(start_paused = true)]
async fn scenario_d_own_network_loss_also_times_out() {
    let store = InMemorySessionStore::new().with_auto_start(true);
    let (_, creator, joiner) = matched_pair(&store, 30, WinType::HighestPercentage, None).await;

    let (_creator_poller, mut creator_nav) = creator.start_polling();
    let (_joiner_poller, mut joiner_nav) = joiner.start_polling();
    creator.handshake.declare_ready().await.unwrap();
    joiner.handshake.declare_ready().await.unwrap();

    assert_eq!(next_navigation(&mut joiner_nav).await, NavigationAction::NavigateToGame);
    loop {
        if next_navigation(&mut creator_nav).await == NavigationAction::NavigateToGame {
            break;
        }
    }

    store.set_unreachable("creator", true).await;

    assert_eq!(
        next_navigation(&mut creator_nav).await,
        NavigationAction::NavigateToDisconnected(DisconnectReason::Timeout)
    );
    // the joiner keeps seeing the creator's last heartbeat freeze as well
    assert_eq!(
        next_navigation(&mut joiner_nav).await,
        NavigationAction::NavigateToDisconnected(DisconnectReason::Timeout)
    );
}

#[tokio::test(start_paused = true)]
async fn lobby_silence_never_times_out() {
    let store = InMemorySessionStore::new();
    let (_, creator, _joiner) = matched_pair(&store, 30, WinType::HighestPercentage, None).await;

    let (_creator_poller, mut creator_nav) = creator.start_polling();
    tokio::time::sleep(DISCONNECT_TIMEOUT * 5).await;

    assert!(creator_nav.try_recv().is_err());
    assert_eq!(creator.state().await, LocalState::Waiting);
}

#[tokio::test(start_paused = true)]
async fn repeated_ready_taps_submit_once() {
    let store = InMemorySessionStore::new();
    let (session_id, creator, _joiner) =
        matched_pair(&store, 30, WinType::HighestPercentage, None).await;

    let (first, second) = tokio::join!(
        creator.handshake.declare_ready(),
        creator.handshake.declare_ready()
    );

    assert_eq!(first.unwrap(), NavigationAction::None);
    assert_eq!(second.unwrap(), NavigationAction::None);
    assert!(creator.handshake.is_declared());
    assert!(creator.lifecycle.lock().await.readiness().self_ready);

    let session = store.session(&session_id).await.unwrap();
    assert_eq!(session.status, SessionStatus::Waiting);
    assert!(session.participants.iter().any(|p| p.user_id == "creator" && p.is_ready));
    assert!(session.participants.iter().any(|p| p.user_id == "joiner" && !p.is_ready));
}

#[tokio::test(start_paused = true)]
async fn both_clients_converge_on_results() {
    let store = InMemorySessionStore::new().with_auto_start(true);
    let (session_id, creator, joiner) =
        matched_pair(&store, 30, WinType::HighestPercentage, None).await;

    let (_creator_poller, mut creator_nav) = creator.start_polling();
    let (_joiner_poller, mut joiner_nav) = joiner.start_polling();
    creator.handshake.declare_ready().await.unwrap();
    joiner.handshake.declare_ready().await.unwrap();

    assert_eq!(next_navigation(&mut joiner_nav).await, NavigationAction::NavigateToGame);
    tokio::time::sleep(Duration::from_secs(3)).await;
    store.complete_session(&session_id, final_results()).await.unwrap();

    let mut creator_last = NavigationAction::None;
    while let Some(action) = creator_nav.recv().await {
        creator_last = action;
    }
    assert_eq!(creator_last, NavigationAction::NavigateToResults);
    assert_eq!(next_navigation(&mut joiner_nav).await, NavigationAction::NavigateToResults);
    assert_eq!(creator.state().await, LocalState::Finished);
    assert_eq!(joiner.state().await, LocalState::Finished);

    let creator_view = ResultPresenter::new(creator.repository.clone(), &creator.user_id)
        .present(&session_id)
        .await;
    let joiner_view = ResultPresenter::new(joiner.repository.clone(), &joiner.user_id)
        .present(&session_id)
        .await;
    assert!(matches!(creator_view, ResultView::Outcome { verdict: Verdict::Lost, .. }));
    assert!(matches!(joiner_view, ResultView::Outcome { verdict: Verdict::Won, .. }));
}
