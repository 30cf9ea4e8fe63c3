use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const DISPLAY_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A chat record as the server stores and broadcasts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub username: String,
    pub message: String,
    /// ISO-8601 string. Rows broadcast straight from the socket handler may carry `null`.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl Message {
    /// Timestamp rendered in local time, or the raw value if it cannot be parsed.
    pub fn display_timestamp(&self) -> String {
        let Some(raw) = self.timestamp.as_deref() else {
            return String::new();
        };

        match parse_timestamp(raw) {
            Some(instant) => instant
                .with_timezone(&Local)
                .format(DISPLAY_FORMAT)
                .to_string(),
            None => raw.to_string(),
        }
    }

    pub fn is_from(&self, identity: &Identity) -> bool {
        self.username == identity.as_str()
    }
}

/// Parses RFC 3339 or a naive ISO-8601 datetime, treating the naive form as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Payload of the outbound `sendMessage` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub username: String,
    pub message: String,
}

/// The username a client session operates as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Returns `None` when the trimmed name is empty.
    pub fn new(raw: &str) -> Option<Self> {
        let name = raw.trim();
        if name.is_empty() {
            None
        } else {
            Some(Self(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle phase of the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the history result is combined with live messages that beat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// History replaces everything, live messages that arrived first are dropped.
    #[default]
    Replace,
    /// Early live messages missing from history are kept after it; duplicate ids are skipped.
    MergeById,
}
