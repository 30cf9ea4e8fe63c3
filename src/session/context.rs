use crate::common::Identity;
use crate::storage::IdentityStore;

/// Identity the chat screen runs as, fixed for the screen's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    identity: Option<Identity>,
}

impl SessionContext {
    pub fn new(identity: Option<Identity>) -> Self {
        Self { identity }
    }

    pub fn from_store(store: &IdentityStore) -> Self {
        Self::new(store.load())
    }

    pub fn get(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}
