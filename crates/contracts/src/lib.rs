//! v1 cross-boundary contracts for the carpark simulator, its control API, the store, and the heartbeat.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Logical service name reported to the heartbeat aggregator.
pub const HEARTBEAT_SERVICE_NAME: &str = "sim";

pub const MSG_SIMULATION_RUNNING: &str = "Simulation Running";
pub const MSG_SIMULATION_PAUSED: &str = "Simulation Paused";
pub const MSG_SINGLE_TICK: &str = "Single Tick Executed";
pub const MSG_FAST_FORWARD: &str = "Fast Forward Started";
pub const MSG_RESET_COMPLETE: &str = "Simulation Reset Complete";

pub const HEARTBEAT_RUNNING: &str = "Running";
pub const HEARTBEAT_SINGLE_TICK: &str = "Single Tick";
pub const HEARTBEAT_FAST_FORWARD: &str = "FastForward Tick";

/// Change-log action tag, derived from the sign of an occupancy delta.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogAction {
    Filled,
    Emptied,
    #[serde(rename = "NOCHANGE")]
    NoChange,
}

impl LogAction {
    pub fn from_delta(previous: i64, next: i64) -> Self {
        match next.cmp(&previous) {
            std::cmp::Ordering::Greater => Self::Filled,
            std::cmp::Ordering::Less => Self::Emptied,
            std::cmp::Ordering::Equal => Self::NoChange,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filled => "FILLED",
            Self::Emptied => "EMPTIED",
            Self::NoChange => "NOCHANGE",
        }
    }

    /// Parses the stored column value. Unknown tags (e.g. admin-written rows) yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "FILLED" => Some(Self::Filled),
            "EMPTIED" => Some(Self::Emptied),
            "NOCHANGE" => Some(Self::NoChange),
            _ => None,
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Facility {
    pub id: i64,
    pub hospital_code: Option<String>,
    pub name: String,
    pub total_capacity: i64,
    pub occupied: i64,
    pub free: i64,
    pub status: String,
    pub active: bool,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeLogEntry {
    pub log_id: i64,
    pub facility_id: i64,
    /// Raw action column; simulator rows always carry a [`LogAction`] tag.
    pub action: String,
    pub detail: String,
    pub created_at: String,
}

impl ChangeLogEntry {
    pub fn log_action(&self) -> Option<LogAction> {
        LogAction::parse(&self.action)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimStatusResponse {
    pub running: bool,
    pub status: String,
    pub single_tick_pending: bool,
    pub fast_forward_remaining: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlAck {
    pub message: String,
}

impl ControlAck {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeartbeatReport {
    pub service: String,
    pub message: String,
}

impl HeartbeatReport {
    pub fn sim(message: impl Into<String>) -> Self {
        Self {
            service: HEARTBEAT_SERVICE_NAME.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidQuery,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}
