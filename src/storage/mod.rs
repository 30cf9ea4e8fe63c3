pub mod identity;

pub use identity::IdentityStore;
