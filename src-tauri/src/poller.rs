use crate::api::StatusSource;
use crate::error::FetchError;
use crate::roster::player_list;
use crate::state::{OnlineStatus, PingResult, ServerStatus, StatusStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Turn one request outcome into the status to display
pub fn classify(outcome: Result<PingResult, FetchError>) -> ServerStatus {
    match outcome {
        Ok(ping) => {
            let players = player_list(&ping);
            ServerStatus::Online(OnlineStatus { ping, players })
        }
        Err(e) if e.is_connection_refused() => ServerStatus::Offline,
        Err(e) => ServerStatus::Unknown(e),
    }
}

/// Fixed-interval poller feeding a [`StatusStore`]
pub struct StatusPoller<S> {
    source: Arc<S>,
    store: StatusStore,
    period: Duration,
}

impl<S: StatusSource> StatusPoller<S> {
    pub fn new(source: S, store: StatusStore, period: Duration) -> Self {
        Self {
            source: Arc::new(source),
            store,
            period,
        }
    }

    /// Split into a handle and the polling future, for callers that spawn
    /// onto a runtime they do not own
    pub fn into_task(self) -> (PollerHandle, impl Future<Output = ()> + Send + 'static) {
        let cancel_token = CancellationToken::new();
        let handle = PollerHandle {
            cancel_token: cancel_token.clone(),
            store: self.store.clone(),
            task: None,
        };
        let task = run_polling(self.source, self.store, self.period, cancel_token);
        (handle, task)
    }

    /// Start polling on the current tokio runtime
    pub fn spawn(self) -> PollerHandle {
        let (mut handle, task) = self.into_task();
        handle.task = Some(tokio::spawn(task));
        handle
    }
}

/// Owns a running poller. Dropping the handle shuts the poller down.
#[derive(Debug)]
pub struct PollerHandle {
    cancel_token: CancellationToken,
    store: StatusStore,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Stop the timer and freeze the store. Requests still in flight are
    /// aborted and can no longer change the state.
    pub fn shutdown(&self) {
        self.store.close();
        self.cancel_token.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Token cancelled together with the poller, for tasks reading its store
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    /// Shut down and wait for the polling task to finish
    pub async fn join(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Polling task ended abnormally");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_polling<S: StatusSource>(
    source: Arc<S>,
    store: StatusStore,
    period: Duration,
    cancel_token: CancellationToken,
) {
    info!(period_ms = period.as_millis() as u64, "Status polling started");

    // First tick completes immediately
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!(in_flight = in_flight.len(), "Shutdown signal received, stopping polling");
                break;
            }
            _ = ticker.tick() => {
                let sequence = store.next_sequence();
                let source = Arc::clone(&source);
                let store = store.clone();
                in_flight.spawn(async move {
                    poll_once(source.as_ref(), &store, sequence).await;
                });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined
                    && e.is_panic()
                {
                    warn!(error = %e, "Poll cycle panicked, continuing");
                }
            }
        }
    }

    store.close();
    in_flight.shutdown().await;
    info!("Status polling stopped");
}

async fn poll_once<S: StatusSource>(source: &S, store: &StatusStore, sequence: u64) {
    let outcome = source.fetch_status().await;
    if let Err(e) = &outcome {
        debug!(sequence, category = e.category(), error = %e, "Ping request failed");
    }

    let status = classify(outcome);
    let previous = store.snapshot().status.kind();
    let kind = status.kind();
    let latency_ms = status.ping().map(|p| p.latency);
    let players_online = status.ping().map(|p| p.players.online);

    if store.apply(sequence, status) {
        debug!(sequence, %kind, ?latency_ms, ?players_online, "Status updated");
        if previous != kind {
            info!(sequence, from = %previous, to = %kind, "Server status changed");
        }
    } else {
        debug!(sequence, latest = store.snapshot().sequence, "Discarded superseded result");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PlayerCounts, PollStatus, Player};
    use assert2::{assert, let_assert};
    use rstest::rstest;

    fn ping(online: u32, sample: Option<Vec<Player>>) -> PingResult {
        PingResult {
            latency: 12.0,
            players: PlayerCounts {
                max: 20,
                online,
                sample,
            },
        }
    }

    #[test]
    fn test_connection_refused_is_offline() {
        let status = classify(Err(FetchError::ConnectionRefused));
        assert!(status == ServerStatus::Offline);
        assert!(status.ping().is_none());
        assert!(status.players().is_empty());
    }

    #[rstest]
    #[case(FetchError::from_upstream(Some("TIMEOUT".to_string()), None))]
    #[case(FetchError::from_upstream(None, None))]
    #[case(FetchError::Network("connection reset".to_string()))]
    #[case(FetchError::Http(502))]
    #[case(FetchError::Parse("missing field `players`".to_string()))]
    fn test_other_failures_are_unknown(#[case] error: FetchError) {
        let status = classify(Err(error));
        assert!(status.kind() == PollStatus::Unknown);
        assert!(status.ping().is_none());
        assert!(status.players().is_empty());
    }

    #[test]
    fn test_success_keeps_whole_payload() {
        let sample = vec![Player {
            id: "u1".to_string(),
            name: "Ann".to_string(),
        }];
        let payload = ping(1, Some(sample.clone()));

        let_assert!(ServerStatus::Online(online) = classify(Ok(payload.clone())));
        assert!(online.ping == payload);
        assert!(online.players == sample);
    }

    #[test]
    fn test_success_with_nobody_online_has_empty_roster() {
        let status = classify(Ok(ping(0, None)));
        assert!(status.kind() == PollStatus::Online);
        assert!(status.players().is_empty());
        let_assert!(Some(p) = status.ping());
        assert!(p.players.max == 20);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let payload = ping(1, Some(vec![]));
        assert!(classify(Ok(payload.clone())) == classify(Ok(payload)));
    }
}
