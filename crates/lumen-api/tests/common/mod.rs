#![allow(dead_code, clippy::unwrap_used)]
// Channel-backed mock transport for driving the live channel in tests.

use std::future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use lumen_api::{Connector, Error, Transport};

pub const SUBSCRIBE: &str =
    r#"{"action":"subscribe","event_types":["fixture_state_changed","group_state_changed"]}"#;
pub const PING: &str = r#"{"action":"ping"}"#;

/// What the fake server can push down a connection.
#[derive(Debug)]
pub enum Frame {
    Text(String),
    Close,
    Error(String),
}

// ── Server side ─────────────────────────────────────────────────────

/// Server end of one accepted connection.
pub struct MockPeer {
    inbound: mpsc::UnboundedSender<Frame>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl MockPeer {
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.inbound.send(Frame::Text(text.into()));
    }

    pub fn send_json(&self, value: &serde_json::Value) {
        self.send_text(value.to_string());
    }

    pub fn close(&self) {
        let _ = self.inbound.send(Frame::Close);
    }

    pub fn fail(&self, reason: &str) {
        let _ = self.inbound.send(Frame::Error(reason.into()));
    }

    /// Next frame the client sent, or `None` once the client dropped the
    /// connection and everything sent before has been read.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Make every further client send fail.
    pub fn refuse_writes(&mut self) {
        self.outbound.close();
    }
}

#[derive(Default)]
struct Counters {
    attempts: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
    fail_next: AtomicUsize,
    hold: AtomicBool,
    attempt_times: Mutex<Vec<Instant>>,
}

/// Fake server handing out [`MockConnector`]s and accepting their peers.
pub struct MockServer {
    counters: Arc<Counters>,
    peers_tx: mpsc::UnboundedSender<MockPeer>,
    peers: mpsc::UnboundedReceiver<MockPeer>,
}

impl MockServer {
    pub fn new() -> Self {
        let (peers_tx, peers) = mpsc::unbounded_channel();
        Self {
            counters: Arc::new(Counters::default()),
            peers_tx,
            peers,
        }
    }

    pub fn connector(&self) -> MockConnector {
        MockConnector {
            counters: Arc::clone(&self.counters),
            peers: self.peers_tx.clone(),
        }
    }

    /// Wait for the next successful connection.
    pub async fn accept(&mut self) -> MockPeer {
        tokio::time::timeout(Duration::from_secs(300), self.peers.recv())
            .await
            .expect("no connection within 300s")
            .expect("connector dropped")
    }

    /// Fail the next `n` connection attempts.
    pub fn fail_next(&self, n: usize) {
        self.counters.fail_next.store(n, Ordering::SeqCst);
    }

    /// Leave every further attempt pending forever.
    pub fn hold_connects(&self) {
        self.counters.hold.store(true, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.counters.attempts.load(Ordering::SeqCst)
    }

    /// Connections currently open on the client side.
    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.counters.max_live.load(Ordering::SeqCst)
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.counters.attempt_times.lock().unwrap().clone()
    }
}

// ── Client side ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockConnector {
    counters: Arc<Counters>,
    peers: mpsc::UnboundedSender<MockPeer>,
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    fn connect(&self, _url: &Url) -> BoxFuture<'static, Result<MockTransport, Error>> {
        let counters = Arc::clone(&self.counters);
        let peers = self.peers.clone();

        counters.attempts.fetch_add(1, Ordering::SeqCst);
        counters.attempt_times.lock().unwrap().push(Instant::now());

        Box::pin(async move {
            if counters.hold.load(Ordering::SeqCst) {
                return future::pending().await;
            }
            let refused = counters
                .fail_next
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if refused {
                return Err(Error::WebSocketConnect("connection refused".into()));
            }

            let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

            let live = counters.live.fetch_add(1, Ordering::SeqCst) + 1;
            counters.max_live.fetch_max(live, Ordering::SeqCst);

            let _ = peers.send(MockPeer {
                inbound: inbound_tx,
                outbound: outbound_rx,
            });

            Ok(MockTransport {
                inbound: inbound_rx,
                outbound: outbound_tx,
                counters,
            })
        })
    }
}

pub struct MockTransport {
    inbound: mpsc::UnboundedReceiver<Frame>,
    outbound: mpsc::UnboundedSender<String>,
    counters: Arc<Counters>,
}

impl Transport for MockTransport {
    async fn send_text(&mut self, text: String) -> Result<(), Error> {
        self.outbound
            .send(text)
            .map_err(|_| Error::WebSocketSend("peer gone".into()))
    }

    async fn recv_text(&mut self) -> Option<Result<String, Error>> {
        match self.inbound.recv().await? {
            Frame::Text(text) => Some(Ok(text)),
            Frame::Close => None,
            Frame::Error(reason) => Some(Err(Error::WebSocketRead(reason))),
        }
    }

    async fn close(&mut self) {}
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}

// ── Event payloads ──────────────────────────────────────────────────

pub fn fixture_event(id: i64, brightness: u8) -> serde_json::Value {
    serde_json::json!({
        "type": "fixture_state_changed",
        "fixture_id": id,
        "brightness": brightness,
        "color_temp": 3000,
        "timestamp": "2024-01-01T00:00:00Z"
    })
}

pub fn group_event(id: i64, brightness: u8) -> serde_json::Value {
    serde_json::json!({
        "type": "group_state_changed",
        "group_id": id,
        "brightness": brightness,
        "color_temp": null,
        "timestamp": "2024-01-01T00:00:00Z"
    })
}

/// Let the driver task run until it blocks.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Assert `elapsed` is `expected`, allowing for timer granularity.
pub fn assert_elapsed(elapsed: Duration, expected: Duration) {
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "expected ~{expected:?}, got {elapsed:?}"
    );
}
