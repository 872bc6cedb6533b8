#![allow(clippy::unwrap_used, clippy::float_cmp)]
// Session tests: HTTP seeding against wiremock, live events through an
// in-memory connector.

use std::future;

use futures_util::future::BoxFuture;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lumen_api::{Connector, Error, Transport};
use lumen_core::{ChannelState, CoreError, LightTarget, ServerConfig, Session, StateSource};

// ── In-memory connector ─────────────────────────────────────────────

/// Hands each accepted connection's inbound sender to the test.
#[derive(Clone)]
struct ChannelConnector {
    accepted: mpsc::UnboundedSender<mpsc::UnboundedSender<String>>,
}

struct ChannelTransport {
    inbound: mpsc::UnboundedReceiver<String>,
}

impl Connector for ChannelConnector {
    type Transport = ChannelTransport;

    fn connect(&self, _url: &Url) -> BoxFuture<'static, Result<ChannelTransport, Error>> {
        let accepted = self.accepted.clone();
        Box::pin(async move {
            let (tx, inbound) = mpsc::unbounded_channel();
            accepted
                .send(tx)
                .map_err(|_| Error::WebSocketConnect("test ended".into()))?;
            Ok(ChannelTransport { inbound })
        })
    }
}

impl Transport for ChannelTransport {
    async fn send_text(&mut self, _text: String) -> Result<(), Error> {
        Ok(())
    }

    async fn recv_text(&mut self) -> Option<Result<String, Error>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) {}
}

fn connector() -> (
    ChannelConnector,
    mpsc::UnboundedReceiver<mpsc::UnboundedSender<String>>,
) {
    let (accepted, rx) = mpsc::unbounded_channel();
    (ChannelConnector { accepted }, rx)
}

async fn session_for(server: &MockServer) -> Session {
    let origin = Url::parse(&server.uri()).unwrap();
    Session::new(ServerConfig::new(origin)).unwrap()
}

// ── Seeding ─────────────────────────────────────────────────────────

#[tokio::test]
async fn seed_fetches_fixtures_and_groups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/fixtures/1/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fixture_id": 1, "brightness": 25, "color_temp": 2700
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/groups/9/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "group_id": 9, "brightness": 100
        })))
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let states = session.seed(&[1], &[9]).await.unwrap();
    assert_eq!(states.len(), 2);

    let store = session.store();
    let fixture = store.fixture(1).unwrap();
    assert_eq!(fixture.brightness, 25.0);
    assert_eq!(fixture.source, StateSource::Seed);
    assert_eq!(store.group(9).unwrap().brightness, 100.0);
}

#[tokio::test]
async fn seed_reports_missing_fixture() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/fixtures/5/state"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "nope" })))
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let err = session.seed(&[5], &[]).await.unwrap_err();
    assert!(matches!(err, CoreError::FixtureNotFound { id: 5 }), "got {err:?}");
    assert_eq!(session.store().fixture_count(), 0);
}

#[tokio::test]
async fn mock_mode_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/mock-mode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "enabled": false })))
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let status = session.mock_mode().await.unwrap();
    assert!(!status.enabled);
    assert_eq!(status.message, None);
}

// ── Live channel ────────────────────────────────────────────────────

#[tokio::test]
async fn live_events_update_store_and_broadcast() {
    let server = MockServer::start().await;
    let session = session_for(&server).await;
    let (connector, mut accepted) = connector();
    let mut events = session.subscribe_events();

    session.start_live_with(connector).await.unwrap();
    let peer = accepted.recv().await.unwrap();

    peer.send(
        json!({
            "type": "fixture_state_changed",
            "fixture_id": 7,
            "brightness": 42,
            "color_temp": 3000,
            "timestamp": "2024-01-01T00:00:00Z"
        })
        .to_string(),
    )
    .unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.brightness(), 42.0);

    let state = session.store().get(LightTarget::Fixture(7)).unwrap();
    assert_eq!(state.brightness, 42.0);
    assert_eq!(state.color_temp, Some(3000));
    assert_eq!(state.source, StateSource::Live);
    assert_eq!(session.connection_state().await, ChannelState::Open);

    session.shutdown().await;
    assert_eq!(session.connection_state().await, ChannelState::Idle);
}

#[tokio::test]
async fn second_start_is_rejected_until_stopped() {
    let server = MockServer::start().await;
    let session = session_for(&server).await;
    let (connector, mut accepted) = connector();

    session.start_live_with(connector.clone()).await.unwrap();
    let _peer = accepted.recv().await.unwrap();

    let err = session
        .start_live_with(connector.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::AlreadyLive));

    session.stop().await;
    assert_eq!(session.connection_state().await, ChannelState::Stopped);
    session.start_live_with(connector).await.unwrap();
    let _second = accepted.recv().await.unwrap();

    session.shutdown().await;
}

#[tokio::test]
async fn connection_state_is_idle_before_start() {
    let server = MockServer::start().await;
    let session = session_for(&server).await;
    assert_eq!(session.connection_state().await, ChannelState::Idle);
    assert!(session.watch_connection().await.is_none());
    session.reconnect().await;
    session.shutdown().await;
}

#[tokio::test]
async fn watch_connection_follows_the_channel() {
    let server = MockServer::start().await;
    let session = session_for(&server).await;
    let (connector, mut accepted) = connector();

    session.start_live_with(connector).await.unwrap();
    let mut states = session.watch_connection().await.unwrap();
    let _peer = accepted.recv().await.unwrap();
    states
        .wait_for(|s| *s == ChannelState::Open)
        .await
        .unwrap();

    session.shutdown().await;
}

#[tokio::test]
async fn shutdown_while_connecting_returns() {
    // Held connects never resolve; shutdown must still return.
    #[derive(Clone)]
    struct Stuck;
    impl Connector for Stuck {
        type Transport = ChannelTransport;
        fn connect(&self, _url: &Url) -> BoxFuture<'static, Result<ChannelTransport, Error>> {
            Box::pin(future::pending())
        }
    }

    let server = MockServer::start().await;
    let session = session_for(&server).await;
    session.start_live_with(Stuck).await.unwrap();
    session.shutdown().await;
    assert_eq!(session.connection_state().await, ChannelState::Idle);
}
