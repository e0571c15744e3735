use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

/// Four-way reachability classification shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollStatus {
    Loading,
    Offline,
    Unknown,
    Online,
}

impl PollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollStatus::Loading => "loading",
            PollStatus::Offline => "offline",
            PollStatus::Unknown => "unknown",
            PollStatus::Online => "online",
        }
    }
}

impl std::fmt::Display for PollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a successful probe
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PingResult {
    /// Round trip to the game server in milliseconds
    pub latency: f64,
    pub players: PlayerCounts,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PlayerCounts {
    pub max: u32,
    pub online: u32,
    /// Possibly truncated list of connected players
    #[serde(default)]
    pub sample: Option<Vec<Player>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub name: String,
}

/// Data held while the server is online. The ping payload only exists here,
/// so leaving the online state always drops it.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlineStatus {
    pub ping: PingResult,
    /// Player sample as listed upstream, before display ordering
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ServerStatus {
    #[default]
    Loading,
    Offline,
    Unknown(FetchError),
    Online(OnlineStatus),
}

impl ServerStatus {
    pub fn kind(&self) -> PollStatus {
        match self {
            ServerStatus::Loading => PollStatus::Loading,
            ServerStatus::Offline => PollStatus::Offline,
            ServerStatus::Unknown(_) => PollStatus::Unknown,
            ServerStatus::Online(_) => PollStatus::Online,
        }
    }

    pub fn ping(&self) -> Option<&PingResult> {
        match self {
            ServerStatus::Online(online) => Some(&online.ping),
            _ => None,
        }
    }

    pub fn players(&self) -> &[Player] {
        match self {
            ServerStatus::Online(online) => &online.players,
            _ => &[],
        }
    }
}

/// State as of one poll cycle
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusSnapshot {
    /// Sequence number of the request that produced this state, 0 before any
    pub sequence: u64,
    pub status: ServerStatus,
}

/// Shared status container. `apply` is the only way to change the state;
/// readers take snapshots or subscribe for change notifications.
#[derive(Debug, Clone)]
pub struct StatusStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    tx: watch::Sender<StatusSnapshot>,
    issued: AtomicU64,
    closed: AtomicBool,
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StatusSnapshot::default());
        Self {
            inner: Arc::new(StoreInner {
                tx,
                issued: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Reserve the sequence number for a request about to be issued
    pub fn next_sequence(&self) -> u64 {
        self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Store the result of request `sequence`. Returns false when the result
    /// was dropped because a later request already resolved or the store is closed.
    pub fn apply(&self, sequence: u64, status: ServerStatus) -> bool {
        if self.is_closed() {
            return false;
        }

        self.inner.tx.send_if_modified(|current| {
            if self.is_closed() || sequence <= current.sequence {
                return false;
            }
            *current = StatusSnapshot { sequence, status };
            true
        })
    }

    /// Reject every later `apply`. Once this returns no write can land.
    pub fn close(&self) {
        // Taking the channel's write lock orders the flag after any in-progress apply
        self.inner.tx.send_if_modified(|_| {
            self.inner.closed.store(true, Ordering::SeqCst);
            false
        });
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.inner.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    fn online(latency: f64) -> ServerStatus {
        ServerStatus::Online(OnlineStatus {
            ping: PingResult {
                latency,
                players: PlayerCounts {
                    max: 20,
                    online: 0,
                    sample: None,
                },
            },
            players: Vec::new(),
        })
    }

    #[test]
    fn test_store_starts_loading() {
        let store = StatusStore::new();
        let snapshot = store.snapshot();

        assert!(snapshot.sequence == 0);
        assert!(snapshot.status.kind() == PollStatus::Loading);
        assert!(snapshot.status.ping().is_none());
        assert!(snapshot.status.players().is_empty());
    }

    #[test]
    fn test_sequences_increase() {
        let store = StatusStore::new();
        assert!(store.next_sequence() == 1);
        assert!(store.next_sequence() == 2);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let store = StatusStore::new();
        let first = store.next_sequence();
        let second = store.next_sequence();

        assert!(store.apply(second, ServerStatus::Offline));
        assert!(!store.apply(first, online(12.0)));

        let snapshot = store.snapshot();
        assert!(snapshot.sequence == second);
        assert!(snapshot.status == ServerStatus::Offline);
    }

    #[test]
    fn test_leaving_online_drops_ping() {
        let store = StatusStore::new();
        assert!(store.apply(store.next_sequence(), online(12.0)));
        assert!(store.snapshot().status.ping().is_some());

        let error = FetchError::from_upstream(Some("TIMEOUT".to_string()), None);
        assert!(store.apply(store.next_sequence(), ServerStatus::Unknown(error)));

        let snapshot = store.snapshot();
        assert!(snapshot.status.kind() == PollStatus::Unknown);
        assert!(snapshot.status.ping().is_none());
    }

    #[test]
    fn test_closed_store_rejects_writes() {
        let store = StatusStore::new();
        let sequence = store.next_sequence();
        store.close();

        assert!(store.is_closed());
        assert!(!store.apply(sequence, ServerStatus::Offline));
        assert!(store.snapshot() == StatusSnapshot::default());
    }

    #[tokio::test]
    async fn test_subscribers_see_applied_state() {
        let store = StatusStore::new();
        let mut rx = store.subscribe();

        store.apply(store.next_sequence(), ServerStatus::Offline);

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().status == ServerStatus::Offline);
    }

    #[test]
    fn test_stale_apply_does_not_wake_subscribers() {
        use tokio_test::{assert_pending, task};

        let store = StatusStore::new();
        let first = store.next_sequence();
        let second = store.next_sequence();
        store.apply(second, ServerStatus::Offline);

        let mut rx = store.subscribe();
        rx.mark_unchanged();
        let mut changed = task::spawn(rx.changed());
        assert_pending!(changed.poll());

        assert!(!store.apply(first, online(3.0)));
        assert!(!changed.is_woken());
        assert_pending!(changed.poll());
    }

    #[test]
    fn test_close_does_not_notify() {
        let store = StatusStore::new();
        let mut rx = store.subscribe();
        rx.mark_unchanged();

        store.close();
        assert!(!rx.has_changed().unwrap());
    }
}
