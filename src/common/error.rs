use thiserror::Error;

use super::types::ConnectionState;
use crate::network::protocol::ProtocolError;

/// Failure of the one-shot history request.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("history request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("history request returned {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("realtime channel is not connected")]
    NotConnected,
    #[error("realtime transport task is gone")]
    Closed,
    #[error("outbound queue is full")]
    Busy,
    #[error("cannot move connection from {from} to {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
    #[error("server url must start with http:// or https://, got `{0}`")]
    InvalidUrl(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("server refused the connection: {0}")]
    Rejected(String),
    #[error("unexpected packet during handshake: {0}")]
    UnexpectedPacket(String),
    #[error("handshake timed out")]
    HandshakeTimeout,
    #[error("socket closed during handshake")]
    TransportClosed,
}

/// Login flow failures. `Display` is the text shown on the login screen.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter a username.")]
    EmptyUsername,
    #[error("{detail}")]
    Rejected {
        status: reqwest::StatusCode,
        detail: String,
    },
    #[error("Could not connect to the server.")]
    Unreachable(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no identity stored; log in first")]
    MissingIdentity,
}
