// Response bodies of the HTTP state endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::timestamp;

/// Current state of one fixture, used to seed the view before live
/// updates arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureState {
    pub fixture_id: i64,
    pub brightness: f64,
    #[serde(default)]
    pub color_temp: Option<u32>,
    /// When the backend last saw this state, if it reports it.
    #[serde(default, with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Current state of one fixture group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupState {
    pub group_id: i64,
    pub brightness: f64,
    #[serde(default)]
    pub color_temp: Option<u32>,
    #[serde(default, with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Whether the backend is driving mocked hardware instead of real GPIO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockModeStatus {
    pub enabled: bool,
    #[serde(default)]
    pub message: Option<String>,
}
