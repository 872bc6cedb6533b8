// ── Domain model ──
//
// One canonical `LightState` for fixtures and groups, whether it came from
// an HTTP seed or a live event.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use lumen_api::{FixtureState, FixtureStateChanged, GroupState, GroupStateChanged, LiveEvent};

/// What a state applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LightTarget {
    Fixture(i64),
    Group(i64),
}

impl LightTarget {
    pub fn id(self) -> i64 {
        match self {
            Self::Fixture(id) | Self::Group(id) => id,
        }
    }
}

impl fmt::Display for LightTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixture(id) => write!(f, "fixture {id}"),
            Self::Group(id) => write!(f, "group {id}"),
        }
    }
}

/// Where a state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateSource {
    /// Fetched over HTTP.
    Seed,
    /// Pushed on the live channel.
    Live,
}

/// Brightness and color temperature of one fixture or group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightState {
    pub target: LightTarget,
    /// Percent, 0..=100.
    pub brightness: f64,
    /// Kelvin, if tunable.
    pub color_temp: Option<u32>,
    pub updated_at: Option<DateTime<Utc>>,
    pub source: StateSource,
}

impl LightState {
    /// Whether this state should replace `current` for the same target.
    ///
    /// Older timestamps lose. An untimestamped seed never overwrites live
    /// data, since it may predate it.
    pub fn supersedes(&self, current: &LightState) -> bool {
        match (self.updated_at, current.updated_at) {
            (Some(new), Some(old)) => new >= old,
            (None, _) => !(self.source == StateSource::Seed && current.source == StateSource::Live),
            (Some(_), None) => true,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<&FixtureStateChanged> for LightState {
    fn from(e: &FixtureStateChanged) -> Self {
        Self {
            target: LightTarget::Fixture(e.fixture_id),
            brightness: e.brightness,
            color_temp: e.color_temp,
            updated_at: Some(e.timestamp),
            source: StateSource::Live,
        }
    }
}

impl From<&GroupStateChanged> for LightState {
    fn from(e: &GroupStateChanged) -> Self {
        Self {
            target: LightTarget::Group(e.group_id),
            brightness: e.brightness,
            color_temp: e.color_temp,
            updated_at: Some(e.timestamp),
            source: StateSource::Live,
        }
    }
}

impl From<&LiveEvent> for LightState {
    fn from(event: &LiveEvent) -> Self {
        match event {
            LiveEvent::FixtureStateChanged(e) => e.into(),
            LiveEvent::GroupStateChanged(e) => e.into(),
        }
    }
}

impl From<FixtureState> for LightState {
    fn from(s: FixtureState) -> Self {
        Self {
            target: LightTarget::Fixture(s.fixture_id),
            brightness: s.brightness,
            color_temp: s.color_temp,
            updated_at: s.timestamp,
            source: StateSource::Seed,
        }
    }
}

impl From<GroupState> for LightState {
    fn from(s: GroupState) -> Self {
        Self {
            target: LightTarget::Group(s.group_id),
            brightness: s.brightness,
            color_temp: s.color_temp,
            updated_at: s.timestamp,
            source: StateSource::Seed,
        }
    }
}
