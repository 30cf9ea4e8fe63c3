use super::types::OutboundMessage;

/// Commands the chat session sends down to the realtime transport task.
#[derive(Debug, Clone)]
pub enum ChannelCommand {
    /// Emit a `sendMessage` event.
    Emit(OutboundMessage),
    /// Disconnect from the namespace and close the socket.
    Close,
}
