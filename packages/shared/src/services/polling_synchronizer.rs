use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::models::lifecycle::NavigationAction;
use crate::repositories::session_repository::SessionRepository;
use crate::services::session_lifecycle::SessionLifecycle;

/// The per-screen poll loop. Dropping the handle aborts the loop, so a
/// screen that goes away can never be mutated by a late response.
pub struct PollingSynchronizer {
    session_id: String,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollingSynchronizer {
    /// Begins polling `session_id` every `interval`, feeding each snapshot into
    /// `lifecycle`. Navigation decisions arrive on the returned receiver.
    pub fn start(
        session_id: &str,
        repository: Arc<dyn SessionRepository + Send + Sync>,
        lifecycle: Arc<Mutex<SessionLifecycle>>,
        interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<NavigationAction>) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (nav_tx, nav_rx) = mpsc::unbounded_channel();

        info!("Polling session {} every {:?}", session_id, interval);
        let task = tokio::spawn(poll_loop(
            session_id.to_string(),
            repository,
            lifecycle,
            interval,
            stop_rx,
            nav_tx,
        ));

        let synchronizer = PollingSynchronizer {
            session_id: session_id.to_string(),
            stop_tx,
            task: Some(task),
        };
        (synchronizer, nav_rx)
    }

    /// Stops the loop and discards whatever request is in flight. Safe to call
    /// any number of times.
    pub fn stop(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(task) = self.task.take() {
            debug!("Stopping poller for session {}", self.session_id);
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PollingSynchronizer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    session_id: String,
    repository: Arc<dyn SessionRepository + Send + Sync>,
    lifecycle: Arc<Mutex<SessionLifecycle>>,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
    nav_tx: mpsc::UnboundedSender<NavigationAction>,
) {
    let mut ticker = tokio::time::interval(interval);
    // a slow request swallows the ticks it overlapped instead of queueing them
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        debug!("Polling status of session {}", session_id);
        let result = tokio::select! {
            _ = stop_rx.changed() => break,
            result = repository.get_session_status(&session_id) => result,
        };

        if *stop_rx.borrow() {
            break;
        }

        let (action, finished) = {
            let mut lifecycle = lifecycle.lock().await;
            let now = Instant::now();
            let action = match result {
                Ok(snapshot) => lifecycle.apply_snapshot(snapshot, now),
                Err(e) if e.is_transient() => {
                    warn!("Status poll for session {} failed: {}", session_id, e);
                    lifecycle.apply_poll_failure(now)
                }
                Err(e) => {
                    error!("Status poll for session {} was rejected: {}", session_id, e);
                    lifecycle.apply_poll_failure(now)
                }
            };
            (action, lifecycle.state().is_terminal())
        };

        if !action.is_none() && nav_tx.send(action).is_err() {
            debug!("Navigation receiver for session {} dropped", session_id);
            break;
        }
        if finished {
            debug!("Session {} reached a terminal state; polling finished", session_id);
            break;
        }
    }
}
