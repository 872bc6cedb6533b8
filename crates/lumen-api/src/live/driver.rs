// Driver task for the live channel.
//
// Owns the connection, the pending connect, the keepalive interval and the
// retry sleep. Every input is turned into one `Signal` by a single
// `select!`, run through the machine, and the resulting actions executed
// before the next input is looked at.

use std::collections::VecDeque;
use std::future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use super::gate::DispatchGate;
use super::handlers::EventHandlers;
use super::machine::{Action, ChannelState, Machine, Signal};
use super::transport::{Connector, Transport};
use crate::error::Error;
use crate::event::{ControlMessage, LiveEvent};

/// Upper bound on a graceful close before the socket is just dropped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// `interval_at` panics on a zero period.
const MIN_KEEPALIVE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Reconnect,
}

type PendingConnect<T> = BoxFuture<'static, Result<T, Error>>;

pub(crate) struct Driver<C: Connector> {
    machine: Machine,
    connector: C,
    url: Url,
    connect_timeout: Duration,
    keepalive_interval: Duration,
    retry_delay: Duration,
    handlers: EventHandlers,
    gate: Arc<DispatchGate>,
    status: watch::Sender<ChannelState>,
    commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,

    connecting: Option<PendingConnect<C::Transport>>,
    transport: Option<C::Transport>,
    keepalive: Option<Interval>,
    retry: Option<Pin<Box<Sleep>>>,
}

pub(crate) struct DriverParts<C> {
    pub connector: C,
    pub url: Url,
    pub connect_timeout: Duration,
    pub keepalive_interval: Duration,
    pub retry_delay: Duration,
    pub handlers: EventHandlers,
    pub gate: Arc<DispatchGate>,
    pub status: watch::Sender<ChannelState>,
    pub commands: mpsc::UnboundedReceiver<Command>,
    pub cancel: CancellationToken,
}

impl<C: Connector> Driver<C> {
    pub(crate) fn new(parts: DriverParts<C>) -> Self {
        Self {
            machine: Machine::new(),
            connector: parts.connector,
            url: parts.url,
            connect_timeout: parts.connect_timeout,
            keepalive_interval: parts.keepalive_interval,
            retry_delay: parts.retry_delay,
            handlers: parts.handlers,
            gate: parts.gate,
            status: parts.status,
            commands: parts.commands,
            cancel: parts.cancel,
            connecting: None,
            transport: None,
            keepalive: None,
            retry: None,
        }
    }

    pub(crate) async fn run(mut self) {
        // Follow-up signals raised while executing actions (a failed send)
        // are handled before any new input.
        let mut queued = VecDeque::from([Signal::Start]);

        loop {
            let signal = if self.cancel.is_cancelled() {
                Signal::Stop
            } else if let Some(signal) = queued.pop_front() {
                signal
            } else {
                self.next_signal().await
            };

            let from = self.machine.state();
            for action in self.machine.handle(signal) {
                if let Some(follow_up) = self.apply(action).await {
                    queued.push_back(follow_up);
                }
            }

            let to = self.machine.state();
            if from != to {
                debug!(%from, %to, "live channel transition");
                self.status.send_replace(to);
            }
            if to == ChannelState::Stopped {
                break;
            }
        }

        debug!(url = %self.url, "live channel driver exiting");
    }

    // ── Inputs ───────────────────────────────────────────────────────

    async fn next_signal(&mut self) -> Signal {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Signal::Stop,
            command = self.commands.recv() => match command {
                Some(Command::Reconnect) => Signal::Reconnect,
                // Every handle is gone.
                None => Signal::Stop,
            },
            result = pending_connect(&mut self.connecting) => match result {
                Ok(transport) => {
                    info!(url = %self.url, "live channel connected");
                    self.transport = Some(transport);
                    Signal::Opened
                }
                Err(e) => {
                    warn!(error = %e, url = %self.url, "live channel connect failed");
                    Signal::Closed
                }
            },
            frame = next_frame(&mut self.transport) => match frame {
                Some(Ok(text)) => Signal::Inbound(text),
                Some(Err(e)) => {
                    warn!(error = %e, "live channel dropped");
                    Signal::Closed
                }
                None => {
                    info!("live channel closed by server");
                    Signal::Closed
                }
            },
            () = next_tick(&mut self.keepalive) => Signal::KeepaliveTick,
            () = retry_elapsed(&mut self.retry) => Signal::RetryElapsed,
        }
    }

    // ── Effects ──────────────────────────────────────────────────────

    async fn apply(&mut self, action: Action) -> Option<Signal> {
        match action {
            Action::Connect => {
                let attempt = self.connector.connect(&self.url);
                let limit = self.connect_timeout;
                self.connecting = Some(Box::pin(async move {
                    tokio::time::timeout(limit, attempt)
                        .await
                        .unwrap_or_else(|_elapsed| Err(Error::Timeout { after: limit }))
                }));
            }
            Action::AbortConnect => {
                self.connecting = None;
            }
            Action::SendSubscribe => {
                return self.send(&ControlMessage::subscribe_all()).await;
            }
            Action::SendPing => {
                trace!("live channel keepalive ping");
                return self.send(&ControlMessage::Ping).await;
            }
            Action::StartKeepalive => {
                let period = self.keepalive_interval.max(MIN_KEEPALIVE);
                let mut interval = tokio::time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.keepalive = Some(interval);
            }
            Action::StopKeepalive => {
                self.keepalive = None;
            }
            Action::Dispatch(text) => {
                if let Some(event) = LiveEvent::decode(&text) {
                    if self.gate.run(|| self.handlers.dispatch(&event)) == Some(false) {
                        trace!(event_type = %event.event_type(), "no handler registered");
                    }
                }
            }
            Action::CloseTransport => {
                if let Some(mut transport) = self.transport.take() {
                    if tokio::time::timeout(CLOSE_TIMEOUT, transport.close())
                        .await
                        .is_err()
                    {
                        debug!("live channel close timed out");
                    }
                }
            }
            Action::ScheduleRetry => {
                debug!(delay = ?self.retry_delay, "scheduling live channel retry");
                self.retry = Some(Box::pin(tokio::time::sleep(self.retry_delay)));
            }
            Action::CancelRetry => {
                self.retry = None;
            }
            Action::NotifyConnected => {
                self.gate.run(|| self.handlers.connected());
            }
            Action::NotifyDisconnected => {
                self.gate.run(|| self.handlers.disconnected());
            }
        }
        None
    }

    /// Send a control frame. A failed send means the connection is gone.
    async fn send(&mut self, message: &ControlMessage) -> Option<Signal> {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to encode control frame");
                return None;
            }
        };
        let Some(transport) = self.transport.as_mut() else {
            return Some(Signal::Closed);
        };

        tokio::select! {
            biased;
            // Loop top turns this into Stop.
            () = self.cancel.cancelled() => None,
            result = transport.send_text(text) => match result {
                Ok(()) => None,
                Err(e) => {
                    warn!(error = %e, "live channel send failed");
                    Some(Signal::Closed)
                }
            },
        }
    }
}

// ── Slot futures ─────────────────────────────────────────────────────
//
// Each resolves from its slot when occupied and never otherwise, so an
// empty slot simply drops out of the `select!`.

async fn pending_connect<T>(slot: &mut Option<PendingConnect<T>>) -> Result<T, Error> {
    let Some(connect) = slot.as_mut() else {
        return future::pending().await;
    };
    let result = connect.await;
    *slot = None;
    result
}

async fn next_frame<T: Transport>(slot: &mut Option<T>) -> Option<Result<String, Error>> {
    match slot.as_mut() {
        Some(transport) => transport.recv_text().await,
        None => future::pending().await,
    }
}

async fn next_tick(slot: &mut Option<Interval>) {
    match slot.as_mut() {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

async fn retry_elapsed(slot: &mut Option<Pin<Box<Sleep>>>) {
    let Some(sleep) = slot.as_mut() else {
        return future::pending().await;
    };
    sleep.as_mut().await;
    *slot = None;
}
