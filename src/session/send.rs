use crate::common::{Identity, OutboundMessage};
use crate::network::RealtimeChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input or no identity; nothing happened.
    Skipped,
    /// Handed to the transport. It shows up once the server echoes it back.
    Sent,
    /// The channel refused it; already logged.
    Failed,
}

/// Turns the composed draft into an outbound `sendMessage`.
#[derive(Debug, Clone)]
pub struct SendPath {
    identity: Option<Identity>,
}

impl SendPath {
    pub fn new(identity: Option<Identity>) -> Self {
        Self { identity }
    }

    pub fn compose(&self, raw: &str) -> Option<OutboundMessage> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        let identity = self.identity.as_ref()?;

        Some(OutboundMessage {
            username: identity.as_str().to_string(),
            message: text.to_string(),
        })
    }

    /// Sends the draft and clears it, whatever the channel says. Blank drafts are left alone.
    pub fn submit(&self, draft: &mut String, channel: &RealtimeChannel) -> SubmitOutcome {
        let Some(outbound) = self.compose(draft) else {
            return SubmitOutcome::Skipped;
        };
        draft.clear();

        match channel.send(outbound) {
            Ok(()) => SubmitOutcome::Sent,
            Err(err) => {
                log::error!("Message not sent: {err}");
                SubmitOutcome::Failed
            }
        }
    }
}
