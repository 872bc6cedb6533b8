//! Live state channel with fixed-interval auto-reconnect.
//!
//! Keeps one WebSocket connection to the lighting backend. Every time a
//! connection opens it subscribes to fixture and group state events, then
//! pings every keepalive interval while the connection stays open. Any
//! failure (refused or timed-out connect, read error, close frame) schedules a retry
//! after a fixed delay, forever, until the owner calls
//! [`LiveHandle::stop`].
//!
//! Failures never reach the owner as errors. They are logged, and the
//! owner observes them only through [`LiveHandle::state`] and the
//! connection hooks on [`EventHandlers`].
//!
//! # Example
//!
//! ```rust,no_run
//! use lumen_api::{EventHandlers, LiveChannel, LiveConfig};
//! use url::Url;
//!
//! # async fn example() -> Result<(), lumen_api::Error> {
//! let origin = Url::parse("http://lights.local:8000")?;
//! let config = LiveConfig::from_origin(&origin, "/ws")?;
//!
//! let handle = LiveChannel::new(config).start(
//!     EventHandlers::new().on_group_state(|e| println!("group {} -> {}%", e.group_id, e.brightness)),
//! );
//!
//! // ... later
//! handle.stop();
//! # Ok(())
//! # }
//! ```

mod driver;
mod gate;
mod handlers;
mod machine;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::endpoint::live_url;
use crate::error::Error;

use self::driver::{Command, Driver, DriverParts};
use self::gate::DispatchGate;
pub use self::handlers::{ConnectionHook, EventHandlers, FixtureHandler, GroupHandler};
pub use self::machine::ChannelState;
pub use self::transport::{Connector, Transport, WsConnector, WsTransport};

// ── LiveConfig ───────────────────────────────────────────────────────

/// Where to connect and how often to ping and retry.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// `ws://` or `wss://` address of the event stream.
    pub url: Url,
    /// Upper bound on one connect attempt, handshake included. An attempt
    /// that runs out counts as a failure and is retried. Default: 10s.
    pub connect_timeout: Duration,
    /// Ping period while open. Default: 30s.
    pub keepalive_interval: Duration,
    /// Delay before every reconnect attempt. Default: 3s. There is no
    /// backoff and no attempt limit.
    pub retry_delay: Duration,
}

impl LiveConfig {
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

    pub fn new(url: Url) -> Self {
        Self {
            url,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            keepalive_interval: Self::DEFAULT_KEEPALIVE_INTERVAL,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
        }
    }

    /// Derive the stream address from the server origin.
    pub fn from_origin(origin: &Url, path: &str) -> Result<Self, Error> {
        Ok(Self::new(live_url(origin, path)?))
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

// ── LiveChannel ──────────────────────────────────────────────────────

/// A configured, not yet running live channel.
pub struct LiveChannel<C: Connector = WsConnector> {
    config: LiveConfig,
    connector: C,
}

impl LiveChannel {
    /// Channel over tokio-tungstenite.
    pub fn new(config: LiveConfig) -> Self {
        Self::with_connector(config, WsConnector)
    }
}

impl<C: Connector> LiveChannel<C> {
    /// Channel over a custom transport.
    pub fn with_connector(config: LiveConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    /// Spawn the driver task and begin connecting.
    ///
    /// Returns immediately; the first attempt happens on the spawned task.
    /// Must be called from within a tokio runtime.
    pub fn start(self, handlers: EventHandlers) -> LiveHandle {
        let (status_tx, status_rx) = watch::channel(ChannelState::Idle);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let gate = Arc::new(DispatchGate::new());
        let cancel = CancellationToken::new();

        let driver = Driver::new(DriverParts {
            connector: self.connector,
            url: self.config.url,
            connect_timeout: self.config.connect_timeout,
            keepalive_interval: self.config.keepalive_interval,
            retry_delay: self.config.retry_delay,
            handlers,
            gate: Arc::clone(&gate),
            status: status_tx,
            commands: command_rx,
            cancel: cancel.clone(),
        });
        let task = tokio::spawn(driver.run());

        LiveHandle {
            gate,
            cancel,
            commands: command_tx,
            status: status_rx,
            task: Some(task),
        }
    }
}

// ── LiveHandle ───────────────────────────────────────────────────────

/// Owner's handle to a running live channel.
///
/// Dropping the handle stops the channel.
pub struct LiveHandle {
    gate: Arc<DispatchGate>,
    cancel: CancellationToken,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ChannelState>,
    task: Option<JoinHandle<()>>,
}

impl LiveHandle {
    /// Current lifecycle state. `Stopped` as soon as [`stop`](Self::stop)
    /// has been called, even before the driver has wound down.
    pub fn state(&self) -> ChannelState {
        if self.is_stopped() {
            ChannelState::Stopped
        } else {
            *self.status.borrow()
        }
    }

    /// Whether a connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.status.clone()
    }

    /// Force a fresh connection attempt.
    ///
    /// While open, the current connection is closed and replaced by exactly
    /// one new attempt. While waiting to retry, the wait is cut short.
    /// While an attempt is already in flight, or after `stop`, nothing
    /// happens.
    pub fn reconnect(&self) {
        if self.is_stopped() {
            return;
        }
        if self.commands.send(Command::Reconnect).is_err() {
            tracing::debug!("live channel driver already gone");
        }
    }

    /// Stop the channel. Idempotent and safe in any state.
    ///
    /// Once this returns no handler is running or invoked again, and no
    /// further connection attempt is made. If a handler is mid-call on
    /// another thread, this blocks until it returns; called from inside a
    /// handler it returns at once. The open connection, keepalive and any
    /// pending retry are torn down by the driver task.
    pub fn stop(&self) {
        if self.gate.close() {
            tracing::debug!("live channel stop requested");
        }
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        !self.gate.is_open()
    }

    /// Stop the channel and wait for its driver task to finish.
    pub async fn join(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "live channel driver task failed");
            }
        }
    }
}

impl Drop for LiveHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for LiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = LiveConfig::new(Url::parse("ws://pi/ws").unwrap());
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.keepalive_interval, Duration::from_secs(30));
        assert_eq!(config.retry_delay, Duration::from_secs(3));
    }

    #[test]
    fn config_from_origin_derives_scheme() {
        let origin = Url::parse("https://lights.example").unwrap();
        let config = LiveConfig::from_origin(&origin, "/ws").unwrap();
        assert_eq!(config.url.as_str(), "wss://lights.example/ws");
    }
}
