use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::common::{AuthError, Identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Chat,
}

/// Local state of the login screen.
#[derive(Default)]
pub struct LoginState {
    pub username_input: String,
    pub error: Option<String>,
    pending: Option<oneshot::Receiver<Result<Identity, AuthError>>>,
}

impl LoginState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn begin(&mut self, pending: oneshot::Receiver<Result<Identity, AuthError>>) {
        self.error = None;
        self.pending = Some(pending);
    }

    /// Checks the in-flight sign-in. Failures end up in `error` for inline display.
    pub fn poll(&mut self) -> Option<Identity> {
        let pending = self.pending.as_mut()?;
        let outcome = match pending.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => {
                self.pending = None;
                self.error = Some("Login was interrupted.".to_string());
                return None;
            }
        };
        self.pending = None;

        match outcome {
            Ok(identity) => {
                self.username_input.clear();
                Some(identity)
            }
            Err(err) => {
                log::warn!("Login failed: {err:?}");
                self.error = Some(err.to_string());
                None
            }
        }
    }
}
