pub mod commands;
pub mod error;
pub mod events;
pub mod types;

pub use commands::ChannelCommand;
pub use error::{AuthError, ChannelError, LoadError, SessionError};
pub use events::{ChannelEvent, DisconnectReason, SessionEvent};
pub use types::{ConnectionState, Identity, MergePolicy, Message, OutboundMessage};
