pub mod chat;
pub mod context;
pub mod send;
pub mod stream;

pub use chat::{ChatSession, SessionConfig};
pub use context::SessionContext;
