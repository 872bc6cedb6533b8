// ── Session ──
//
// Ties one lighting backend together: HTTP seeding, the live channel, and
// the store both of them write to.

use std::sync::Arc;

use futures_util::future::try_join_all;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, info};

use lumen_api::{
    ChannelState, Connector, EventHandlers, LiveChannel, LiveEvent, LiveHandle, MockModeStatus,
    StateClient, WsConnector,
};

use crate::config::ServerConfig;
use crate::error::CoreError;
use crate::model::{LightState, LightTarget};
use crate::store::LightStore;

const EVENT_CHANNEL_SIZE: usize = 256;

/// Entry point for consumers.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Owns at most one running
/// live channel at a time.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: ServerConfig,
    client: StateClient,
    store: Arc<LightStore>,
    events: broadcast::Sender<Arc<LiveEvent>>,
    live: Mutex<Option<LiveHandle>>,
}

impl Session {
    /// Create a session. Does not connect; call [`seed`](Self::seed) and
    /// [`start_live`](Self::start_live) as needed.
    pub fn new(config: ServerConfig) -> Result<Self, CoreError> {
        let client = StateClient::new(config.origin.clone(), &config.http_config())?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                client,
                store: Arc::new(LightStore::new()),
                events,
                live: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<LightStore> {
        &self.inner.store
    }

    // ── HTTP ─────────────────────────────────────────────────────────

    pub async fn fetch_fixture(&self, id: i64) -> Result<LightState, CoreError> {
        self.inner
            .client
            .fixture_state(id)
            .await
            .map(LightState::from)
            .map_err(|e| CoreError::for_fixture(e, id))
    }

    pub async fn fetch_group(&self, id: i64) -> Result<LightState, CoreError> {
        self.inner
            .client
            .group_state(id)
            .await
            .map(LightState::from)
            .map_err(|e| CoreError::for_group(e, id))
    }

    /// Fetch the given fixtures and groups concurrently and apply them to
    /// the store as seeds. Fails on the first error; nothing is applied
    /// in that case.
    pub async fn seed(&self, fixtures: &[i64], groups: &[i64]) -> Result<Vec<LightState>, CoreError> {
        let targets = fixtures
            .iter()
            .map(|&id| LightTarget::Fixture(id))
            .chain(groups.iter().map(|&id| LightTarget::Group(id)));

        let states = try_join_all(targets.map(|target| async move {
            match target {
                LightTarget::Fixture(id) => self.fetch_fixture(id).await,
                LightTarget::Group(id) => self.fetch_group(id).await,
            }
        }))
        .await?;

        for state in &states {
            self.inner.store.apply_seed(state.clone());
        }
        debug!(count = states.len(), "seeded light states");
        Ok(states)
    }

    /// Whether the backend is running against mocked hardware.
    pub async fn mock_mode(&self) -> Result<MockModeStatus, CoreError> {
        Ok(self.inner.client.mock_mode().await?)
    }

    // ── Live channel ─────────────────────────────────────────────────

    /// Start the live channel over WebSocket.
    pub async fn start_live(&self) -> Result<(), CoreError> {
        self.start_live_with(WsConnector).await
    }

    /// Start the live channel over a custom transport.
    ///
    /// Every recognized event is written to the store, then broadcast to
    /// [`subscribe_events`](Self::subscribe_events) receivers.
    pub async fn start_live_with<C: Connector>(&self, connector: C) -> Result<(), CoreError> {
        let mut slot = self.inner.live.lock().await;
        if slot.as_ref().is_some_and(|h| !h.is_stopped()) {
            return Err(CoreError::AlreadyLive);
        }

        let config = self.inner.config.live_config()?;
        info!(url = %config.url, "starting live channel");

        let handle = LiveChannel::with_connector(config, connector).start(self.handlers());
        *slot = Some(handle);
        Ok(())
    }

    fn handlers(&self) -> EventHandlers {
        let fixture_sink = EventSink::new(&self.inner);
        let group_sink = EventSink::new(&self.inner);

        EventHandlers::new()
            .on_fixture_state(move |e| {
                fixture_sink.publish(LiveEvent::FixtureStateChanged(e.clone()));
            })
            .on_group_state(move |e| {
                group_sink.publish(LiveEvent::GroupStateChanged(e.clone()));
            })
            .on_connected(|| debug!("live channel subscribed"))
            .on_disconnected(|| debug!("live channel lost, retry scheduled"))
    }

    /// Receive every live event applied by this session.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Arc<LiveEvent>> {
        self.inner.events.subscribe()
    }

    /// Live-channel state; `Idle` if it was never started.
    pub async fn connection_state(&self) -> ChannelState {
        self.inner
            .live
            .lock()
            .await
            .as_ref()
            .map_or(ChannelState::Idle, LiveHandle::state)
    }

    /// Observe live-channel transitions, if the channel was started.
    pub async fn watch_connection(&self) -> Option<watch::Receiver<ChannelState>> {
        self.inner
            .live
            .lock()
            .await
            .as_ref()
            .map(LiveHandle::watch_state)
    }

    /// Force the live channel to reconnect now.
    pub async fn reconnect(&self) {
        if let Some(handle) = self.inner.live.lock().await.as_ref() {
            handle.reconnect();
        }
    }

    /// Stop the live channel. Handlers stop running immediately.
    pub async fn stop(&self) {
        if let Some(handle) = self.inner.live.lock().await.as_ref() {
            handle.stop();
        }
    }

    /// Stop the live channel and wait for it to wind down.
    pub async fn shutdown(&self) {
        let handle = self.inner.live.lock().await.take();
        if let Some(handle) = handle {
            handle.join().await;
            debug!("live channel shut down");
        }
    }
}

/// Writes live events into the store and fans them out.
struct EventSink {
    store: Arc<LightStore>,
    events: broadcast::Sender<Arc<LiveEvent>>,
}

impl EventSink {
    fn new(inner: &SessionInner) -> Self {
        Self {
            store: Arc::clone(&inner.store),
            events: inner.events.clone(),
        }
    }

    fn publish(&self, event: LiveEvent) {
        self.store.apply_event(&event);
        // No receivers is fine.
        let _ = self.events.send(Arc::new(event));
    }
}
