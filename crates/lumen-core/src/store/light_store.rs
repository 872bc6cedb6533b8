// ── Light state store ──
//
// Holds the latest known state of every fixture and group the client has
// seen, from HTTP seeds and live events alike.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::trace;

use lumen_api::LiveEvent;

use super::collection::StateCollection;
use crate::model::{LightState, LightTarget};
use crate::stream::StateStream;

/// Reactive store of fixture and group states.
///
/// Writes are ordered per target by [`LightState::supersedes`]; a stale
/// update is dropped and reported as not applied.
pub struct LightStore {
    fixtures: StateCollection<LightState>,
    groups: StateCollection<LightState>,
    last_live_event: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for LightStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LightStore {
    pub fn new() -> Self {
        let (last_live_event, _) = watch::channel(None);
        Self {
            fixtures: StateCollection::new(),
            groups: StateCollection::new(),
            last_live_event,
        }
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Apply a live event. Returns whether the stored state changed.
    pub fn apply_event(&self, event: &LiveEvent) -> bool {
        self.last_live_event.send_replace(Some(event.timestamp()));
        self.apply(LightState::from(event))
    }

    /// Apply a state fetched over HTTP.
    pub fn apply_seed(&self, state: LightState) -> bool {
        self.apply(state)
    }

    fn apply(&self, state: LightState) -> bool {
        let target = state.target;
        let collection = self.collection(target);
        let applied = collection.upsert_if(target.id(), state.clone(), |current| {
            state.supersedes(current)
        });
        if !applied {
            trace!(%target, "ignoring stale light state");
        }
        applied
    }

    pub fn clear(&self) {
        self.fixtures.clear();
        self.groups.clear();
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn get(&self, target: LightTarget) -> Option<Arc<LightState>> {
        self.collection(target).get(target.id())
    }

    pub fn fixture(&self, id: i64) -> Option<Arc<LightState>> {
        self.fixtures.get(id)
    }

    pub fn group(&self, id: i64) -> Option<Arc<LightState>> {
        self.groups.get(id)
    }

    pub fn fixtures_snapshot(&self) -> Arc<Vec<Arc<LightState>>> {
        self.fixtures.snapshot()
    }

    pub fn groups_snapshot(&self) -> Arc<Vec<Arc<LightState>>> {
        self.groups.snapshot()
    }

    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Timestamp carried by the most recent live event, applied or not.
    pub fn last_live_event(&self) -> Option<DateTime<Utc>> {
        *self.last_live_event.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_fixtures(&self) -> StateStream<LightState> {
        StateStream::new(self.fixtures.subscribe())
    }

    pub fn subscribe_groups(&self) -> StateStream<LightState> {
        StateStream::new(self.groups.subscribe())
    }

    fn collection(&self, target: LightTarget) -> &StateCollection<LightState> {
        match target {
            LightTarget::Fixture(_) => &self.fixtures,
            LightTarget::Group(_) => &self.groups,
        }
    }
}
