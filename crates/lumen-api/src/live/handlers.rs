//! Callback registry for the live channel.
//!
//! At most one handler per event type, plus optional connection hooks.
//! Handlers run on the channel's driver task in receipt order, so they
//! should return quickly; anything slow belongs on a channel.
//!
//! ```rust,no_run
//! use lumen_api::{EventHandlers, LiveChannel, LiveConfig};
//!
//! # async fn example(config: LiveConfig) {
//! let handlers = EventHandlers::new()
//!     .on_fixture_state(|e| println!("fixture {} -> {}%", e.fixture_id, e.brightness))
//!     .on_connected(|| println!("live"));
//!
//! let handle = LiveChannel::new(config).start(handlers);
//! # handle.stop();
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::event::{FixtureStateChanged, GroupStateChanged, LiveEvent};

pub type FixtureHandler = Arc<dyn Fn(&FixtureStateChanged) + Send + Sync>;
pub type GroupHandler = Arc<dyn Fn(&GroupStateChanged) + Send + Sync>;
pub type ConnectionHook = Arc<dyn Fn() + Send + Sync>;

/// Handlers registered before [`LiveChannel::start`](super::LiveChannel::start).
///
/// Registering the same kind twice keeps the last one.
#[derive(Clone, Default)]
pub struct EventHandlers {
    fixture_state: Option<FixtureHandler>,
    group_state: Option<GroupHandler>,
    on_connected: Option<ConnectionHook>,
    on_disconnected: Option<ConnectionHook>,
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("fixture_state", &self.fixture_state.is_some())
            .field("group_state", &self.group_state.is_some())
            .field("on_connected", &self.on_connected.is_some())
            .field("on_disconnected", &self.on_disconnected.is_some())
            .finish()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle `fixture_state_changed` events.
    pub fn on_fixture_state(
        mut self,
        f: impl Fn(&FixtureStateChanged) + Send + Sync + 'static,
    ) -> Self {
        self.fixture_state = Some(Arc::new(f));
        self
    }

    /// Handle `group_state_changed` events.
    pub fn on_group_state(mut self, f: impl Fn(&GroupStateChanged) + Send + Sync + 'static) -> Self {
        self.group_state = Some(Arc::new(f));
        self
    }

    /// Called each time a connection opens, after the subscription is sent.
    pub fn on_connected(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connected = Some(Arc::new(f));
        self
    }

    /// Called when an open connection drops or is replaced. Failed connect
    /// attempts never opened, so they do not fire this.
    pub fn on_disconnected(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_disconnected = Some(Arc::new(f));
        self
    }

    /// Invoke the handler for `event`, if one is registered. Returns whether
    /// a handler ran.
    pub(crate) fn dispatch(&self, event: &LiveEvent) -> bool {
        match event {
            LiveEvent::FixtureStateChanged(e) => self.fixture_state.as_ref().map(|h| h(e)),
            LiveEvent::GroupStateChanged(e) => self.group_state.as_ref().map(|h| h(e)),
        }
        .is_some()
    }

    pub(crate) fn connected(&self) {
        if let Some(hook) = &self.on_connected {
            hook();
        }
    }

    pub(crate) fn disconnected(&self) {
        if let Some(hook) = &self.on_disconnected {
            hook();
        }
    }
}
