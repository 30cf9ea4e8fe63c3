use std::fmt;

use super::error::LoadError;
use super::types::Message;

/// Why the realtime transport stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    ClientClose,
    ServerDisconnect,
    TransportClose,
    TransportError,
    PingTimeout,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DisconnectReason::ClientClose => "io client disconnect",
            DisconnectReason::ServerDisconnect => "io server disconnect",
            DisconnectReason::TransportClose => "transport close",
            DisconnectReason::TransportError => "transport error",
            DisconnectReason::PingTimeout => "ping timeout",
        };
        f.write_str(reason)
    }
}

/// Events from the realtime transport task.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Connected,
    Disconnected(DisconnectReason),
    ConnectError(String),
    MessageReceived(Message),
}

/// Everything that can mutate a chat session, delivered through its single event queue.
#[derive(Debug)]
pub enum SessionEvent {
    HistoryLoaded(Result<Vec<Message>, LoadError>),
    Channel(ChannelEvent),
}

impl From<ChannelEvent> for SessionEvent {
    fn from(event: ChannelEvent) -> Self {
        SessionEvent::Channel(event)
    }
}
