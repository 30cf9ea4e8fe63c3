//! Socket.IO v5 packets carried in Engine.IO v4 text frames.
//!
//! Only the default namespace and plain (non-binary, non-ack) events are understood.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("empty frame")]
    Empty,
    #[error("unknown engine.io packet type `{0}`")]
    UnknownEnginePacket(char),
    #[error("unknown socket.io packet type `{0}`")]
    UnknownSocketPacket(char),
    #[error("unsupported socket.io packet type `{0}`")]
    Unsupported(char),
    #[error("event packet has no name")]
    MalformedEvent,
    #[error("invalid packet json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Engine.IO open packet payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds.
    pub ping_interval: u64,
    /// Milliseconds.
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    Connect(Option<Value>),
    Disconnect,
    Event { name: String, payload: Value },
    ConnectError(Value),
}

impl Packet {
    pub fn event(name: &str, payload: Value) -> Self {
        Packet::Event {
            name: name.to_string(),
            payload,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Packet::Open(handshake) => {
                format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
            }
            Packet::Close => "1".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Pong => "3".to_string(),
            Packet::Noop => "6".to_string(),
            Packet::Connect(None) => "40".to_string(),
            Packet::Connect(Some(auth)) => format!("40{auth}"),
            Packet::Disconnect => "41".to_string(),
            Packet::Event { name, payload } => {
                let args = Value::Array(vec![Value::String(name.clone()), payload.clone()]);
                format!("42{args}")
            }
            Packet::ConnectError(detail) => format!("44{detail}"),
        }
    }

    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let mut chars = frame.chars();
        let engine_type = chars.next().ok_or(ProtocolError::Empty)?;
        let rest = chars.as_str();

        match engine_type {
            '0' => Ok(Packet::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Packet::Close),
            // Probe payloads ("2probe") only occur during upgrades and are irrelevant here.
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '4' => decode_socket_packet(rest),
            '6' => Ok(Packet::Noop),
            other => Err(ProtocolError::UnknownEnginePacket(other)),
        }
    }
}

fn decode_socket_packet(body: &str) -> Result<Packet, ProtocolError> {
    let mut chars = body.chars();
    let socket_type = chars.next().ok_or(ProtocolError::Empty)?;
    let data = strip_namespace(chars.as_str());

    match socket_type {
        '0' => {
            if data.is_empty() {
                Ok(Packet::Connect(None))
            } else {
                Ok(Packet::Connect(Some(serde_json::from_str(data)?)))
            }
        }
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(data),
        '4' => {
            let detail = if data.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(data)?
            };
            Ok(Packet::ConnectError(detail))
        }
        '3' | '5' | '6' => Err(ProtocolError::Unsupported(socket_type)),
        other => Err(ProtocolError::UnknownSocketPacket(other)),
    }
}

/// Drops a leading `/nsp,` prefix; the default namespace carries none.
fn strip_namespace(data: &str) -> &str {
    if data.starts_with('/') {
        match data.split_once(',') {
            Some((_, rest)) => rest,
            None => "",
        }
    } else {
        data
    }
}

fn decode_event(data: &str) -> Result<Packet, ProtocolError> {
    let args = data.trim_start_matches(|c: char| c.is_ascii_digit());
    let mut args: Vec<Value> = serde_json::from_str(args)?;
    if args.is_empty() {
        return Err(ProtocolError::MalformedEvent);
    }

    let name = match args.remove(0) {
        Value::String(name) => name,
        _ => return Err(ProtocolError::MalformedEvent),
    };
    let payload = if args.is_empty() {
        Value::Null
    } else {
        args.swap_remove(0)
    };

    Ok(Packet::Event { name, payload })
}
