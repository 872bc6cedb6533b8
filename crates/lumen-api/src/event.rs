//! Wire types for the live state channel.
//!
//! Inbound frames are JSON objects discriminated by a `type` tag; outbound
//! control frames are discriminated by an `action` tag. Anything the client
//! does not recognize is dropped by [`LiveEvent::decode`], so the server can
//! grow new event types without breaking older clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// Upper bound of the brightness percentage.
pub const MAX_BRIGHTNESS: f64 = 100.0;

// ── Event types ──────────────────────────────────────────────────────

/// Event-type identifiers the client subscribes to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    FixtureStateChanged,
    GroupStateChanged,
}

// ── Inbound events ───────────────────────────────────────────────────

/// A single fixture changed brightness and/or color temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureStateChanged {
    pub fixture_id: i64,
    /// Goal-or-current brightness, 0..=100. Fractional levels are kept.
    pub brightness: f64,
    /// Kelvin; `None` for fixtures that are not tunable.
    #[serde(default)]
    pub color_temp: Option<u32>,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// A fixture group changed brightness and/or color temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStateChanged {
    pub group_id: i64,
    pub brightness: f64,
    #[serde(default)]
    pub color_temp: Option<u32>,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// A decoded inbound event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    FixtureStateChanged(FixtureStateChanged),
    GroupStateChanged(GroupStateChanged),
}

impl LiveEvent {
    /// Decode a text frame, returning `None` for anything that is not a
    /// well-formed event of a known type.
    ///
    /// Unknown `type` tags, invalid JSON and out-of-range levels are all
    /// discarded the same way; none of them is an error.
    pub fn decode(text: &str) -> Option<Self> {
        let event: Self = match serde_json::from_str(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(error = %e, "discarding unrecognized live frame");
                return None;
            }
        };

        if let Err(reason) = check_levels(event.brightness(), event.color_temp()) {
            tracing::debug!(reason, event_type = %event.event_type(), "discarding invalid live event");
            return None;
        }

        Some(event)
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Self::FixtureStateChanged(_) => EventType::FixtureStateChanged,
            Self::GroupStateChanged(_) => EventType::GroupStateChanged,
        }
    }

    pub fn brightness(&self) -> f64 {
        match self {
            Self::FixtureStateChanged(e) => e.brightness,
            Self::GroupStateChanged(e) => e.brightness,
        }
    }

    pub fn color_temp(&self) -> Option<u32> {
        match self {
            Self::FixtureStateChanged(e) => e.color_temp,
            Self::GroupStateChanged(e) => e.color_temp,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::FixtureStateChanged(e) => e.timestamp,
            Self::GroupStateChanged(e) => e.timestamp,
        }
    }
}

/// Validate the level invariants shared by every state payload.
pub(crate) fn check_levels(brightness: f64, color_temp: Option<u32>) -> Result<(), &'static str> {
    if !(0.0..=MAX_BRIGHTNESS).contains(&brightness) {
        return Err("brightness outside 0..=100");
    }
    if color_temp == Some(0) {
        return Err("color temperature must be positive");
    }
    Ok(())
}

// ── Outbound control messages ────────────────────────────────────────

/// Client-to-server control frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Sent once on every successful open.
    Subscribe { event_types: Vec<EventType> },
    /// Keepalive.
    Ping,
}

impl ControlMessage {
    /// Subscription intent naming every event type the client understands.
    pub fn subscribe_all() -> Self {
        Self::Subscribe {
            event_types: EventType::iter().collect(),
        }
    }
}

// ── Timestamps ───────────────────────────────────────────────────────

/// ISO-8601 timestamps. An explicit offset is honored; a bare local
/// date-time is taken as UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
    }

    pub(crate) fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub(crate) mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)]
        pub(crate) fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => super::serialize(ts, s),
                None => s.serialize_none(),
            }
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| {
                    super::parse(&raw).ok_or_else(|| {
                        serde::de::Error::custom(format!("invalid timestamp: {raw}"))
                    })
                })
                .transpose()
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
