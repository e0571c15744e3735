// Common test utilities and fixtures
#![allow(dead_code)]

use mockito::{Mock, Server, ServerGuard};
use serde_json::{Value, json};
use server_status_indicator_lib::{FetchError, PingResult, PlayerCounts, Player, StatusSource};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock ping endpoint for testing
pub struct MockStatusApi {
    pub server: ServerGuard,
}

impl MockStatusApi {
    /// Create a new mock API server (async)
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        Self { server }
    }

    /// Get the base URL for the mock server
    pub fn url(&self) -> String {
        self.server.url()
    }

    fn mock_body(&mut self, status: usize, body: String) -> Mock {
        self.server
            .mock("GET", "/api/ping")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create()
    }

    /// Create a mock for a successful ping with the given players
    pub fn mock_online(&mut self, latency: u64, max: u32, players: &[(&str, &str)]) -> Mock {
        let sample: Vec<Value> = players
            .iter()
            .map(|(id, name)| json!({ "id": id, "name": name }))
            .collect();
        let body = json!({
            "version": { "name": "1.20.1", "protocol": 763 },
            "latency": latency,
            "players": {
                "max": max,
                "online": players.len(),
                "sample": sample
            },
            "description": { "text": "tyger's valley" }
        });

        self.mock_body(200, body.to_string())
    }

    /// Create a mock for a ping that failed upstream with the given error code
    pub fn mock_ping_error(&mut self, code: &str) -> Mock {
        let body = json!({
            "error": {
                "errno": -111,
                "code": code,
                "syscall": "connect",
                "address": "127.0.0.1",
                "port": 25565
            }
        });

        self.mock_body(200, body.to_string())
    }

    /// Create a mock for an error payload sent with a 500 status
    pub fn mock_ping_error_500(&mut self, code: &str) -> Mock {
        self.mock_body(500, json!({ "error": { "code": code } }).to_string())
    }

    /// Create a mock for a gateway failure with an HTML body
    pub fn mock_bad_gateway(&mut self) -> Mock {
        self.server
            .mock("GET", "/api/ping")
            .with_status(502)
            .with_header("content-type", "text/html")
            .with_body("<html><body>502 Bad Gateway</body></html>")
            .create()
    }

    /// Create a mock for a success payload missing the players field
    pub fn mock_missing_players(&mut self) -> Mock {
        self.mock_body(200, json!({ "latency": 12 }).to_string())
    }

    /// Create a mock for invalid JSON response (parse error)
    pub fn mock_invalid_json(&mut self) -> Mock {
        self.mock_body(200, "not valid json {{{".to_string())
    }
}

pub fn ping(latency: f64, max: u32, players: &[(&str, &str)]) -> PingResult {
    PingResult {
        latency,
        players: PlayerCounts {
            max,
            online: players.len() as u32,
            sample: Some(
                players
                    .iter()
                    .map(|(id, name)| Player {
                        id: id.to_string(),
                        name: name.to_string(),
                    })
                    .collect(),
            ),
        },
    }
}

/// Status source replaying scripted outcomes, each after its own delay.
/// The last step repeats once the script runs out. Clones share the script.
#[derive(Clone)]
pub struct ScriptedSource {
    inner: Arc<ScriptInner>,
}

struct ScriptInner {
    steps: Mutex<VecDeque<(Duration, Result<PingResult, FetchError>)>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(steps: Vec<(Duration, Result<PingResult, FetchError>)>) -> Self {
        assert!(!steps.is_empty(), "script needs at least one step");
        Self {
            inner: Arc::new(ScriptInner {
                steps: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Every request answers immediately with the same outcome
    pub fn constant(outcome: Result<PingResult, FetchError>) -> Self {
        Self::new(vec![(Duration::ZERO, outcome)])
    }

    /// Number of requests issued so far
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> (Duration, Result<PingResult, FetchError>) {
        let mut steps = self.inner.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap()
        }
    }
}

impl StatusSource for ScriptedSource {
    async fn fetch_status(&self) -> Result<PingResult, FetchError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, outcome) = self.next_step();
        tokio::time::sleep(delay).await;
        outcome
    }
}
