pub mod auth;
pub mod channel;
pub mod client;
pub mod history;
pub mod protocol;
pub mod transport;

pub use auth::AuthClient;
pub use channel::RealtimeChannel;
pub use history::HistoryLoader;
